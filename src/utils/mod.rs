//! Image transforms shared by the pipeline and the synthesizers

pub mod matte;
pub mod resize;
pub mod text;

pub use matte::{apply_alpha, ChromaKey};
pub use resize::{AspectPreservingResizer, UpscaleRestorer};
pub use text::FontSet;
