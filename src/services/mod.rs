//! Services used by the generation pipeline
//!
//! Decoding/encoding, artifact persistence and stage tracking are kept
//! apart from the orchestration in [`crate::processor`].

pub mod codec;
pub mod persistence;
pub mod stages;

pub use codec::ImageCodec;
pub use persistence::{ArtifactPersister, ArtifactSet};
pub use stages::{PipelineStage, StageFailure, StageTracker};
