//! StyleText ONNX synthesizer running on Tract
//!
//! The exported generator takes two `1x3xHxW` inputs, the plain rendering of
//! the target text (`i_t`) and the style image (`i_s`), both scaled to
//! `[-1, 1]`. It returns `fake_text`, `fake_sk` and `fake_fusion` in that
//! order, in the same range.
//!
//! Tract plans are shape-specialised. The style width varies per request, so
//! an optimised plan is built lazily for every input size seen and cached.

use crate::config::SynthesizerConfig;
use crate::error::{Result, StyleTextError};
use crate::inference::Synthesizer;
use crate::types::{StyleRequest, SynthesisResult};
use crate::utils::text::FontSet;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use instant::Instant;
use ndarray::{Array4, ArrayViewD, Ix4};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tract_onnx::prelude::*;

/// Type alias for the optimised, runnable Tract plan
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Most distinct input sizes kept compiled at once
const MAX_CACHED_PLANS: usize = 16;

const BACKEND: &str = "tract";

/// StyleText generator loaded from an ONNX export
pub struct TractSynthesizer {
    model: InferenceModel,
    plans: PlanCache<TractModel>,
    fonts: FontSet,
    text_background: u8,
}

impl std::fmt::Debug for TractSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TractSynthesizer")
            .field("fonts", &self.fonts)
            .field("text_background", &self.text_background)
            .finish_non_exhaustive()
    }
}

impl TractSynthesizer {
    /// Load the model and fonts named by `config`
    ///
    /// # Errors
    /// - [`StyleTextError::ModelUnavailable`] if the model path is missing or unreadable
    pub fn from_config(config: &SynthesizerConfig) -> Result<Self> {
        let model_path = config.model_path.as_deref().ok_or_else(|| {
            StyleTextError::model_unavailable("no model_path configured for the tract synthesizer")
        })?;
        let fonts = FontSet::load(&config.fonts)?;
        Self::load(model_path, fonts, config.text_background)
    }

    /// Load an ONNX export from `path`
    pub fn load(path: &Path, fonts: FontSet, text_background: u8) -> Result<Self> {
        let load_start = Instant::now();

        if !path.is_file() {
            return Err(StyleTextError::model_unavailable(format!(
                "model file '{}' does not exist",
                path.display()
            )));
        }

        let model = onnx().model_for_path(path).map_err(|e| {
            StyleTextError::model_unavailable(format!(
                "failed to load ONNX model '{}': {}",
                path.display(),
                e
            ))
        })?;

        let size_mb = std::fs::metadata(path)
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);
        tracing::info!(
            model = %path.display(),
            size_mb = %format!("{size_mb:.2}"),
            load_ms = load_start.elapsed().as_millis() as u64,
            "🚀 Tract synthesizer ready (pure Rust, CPU)"
        );

        Ok(Self {
            model,
            plans: PlanCache::new(MAX_CACHED_PLANS),
            fonts,
            text_background,
        })
    }

    /// Optimised plan for `width` x `height` inputs, compiling it on first use
    fn plan_for(&self, width: u32, height: u32) -> Result<Arc<TractModel>> {
        self.plans.get_or_compile((width, height), || {
            let compile_start = Instant::now();
            let shape = [1usize, 3, height as usize, width as usize];
            let plan = self
                .model
                .clone()
                .with_input_fact(0, f32::fact(shape).into())
                .and_then(|m| m.with_input_fact(1, f32::fact(shape).into()))
                .and_then(|m| m.into_optimized())
                .and_then(|m| m.into_runnable())
                .map_err(|e| {
                    StyleTextError::synthesis_with_backend(
                        BACKEND,
                        "Plan compilation",
                        &format!("{}x{}: {}", width, height, e),
                    )
                })?;

            tracing::debug!(
                width,
                height,
                compile_ms = compile_start.elapsed().as_millis() as u64,
                "Compiled tract plan"
            );
            Ok(plan)
        })
    }
}

/// Size-keyed store of compiled plans
///
/// The lock only guards lookups and inserts. Compilation runs unlocked, so
/// a slow compile for one size never stalls requests for another; two
/// requests racing on the same new size may both compile, and the first
/// insert wins.
pub(crate) struct PlanCache<T> {
    plans: Mutex<HashMap<(u32, u32), Arc<T>>>,
    capacity: usize,
}

impl<T> PlanCache<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            plans: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(u32, u32), Arc<T>>>> {
        self.plans
            .lock()
            .map_err(|_| StyleTextError::internal("tract plan cache lock poisoned"))
    }

    pub(crate) fn get(&self, key: (u32, u32)) -> Result<Option<Arc<T>>> {
        Ok(self.lock()?.get(&key).cloned())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Cached plan for `key`, or the result of `compile` stored under it
    pub(crate) fn get_or_compile<F>(&self, key: (u32, u32), compile: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(plan) = self.get(key)? {
            return Ok(plan);
        }

        let compiled = Arc::new(compile()?);

        let mut plans = self.lock()?;
        if !plans.contains_key(&key) && plans.len() >= self.capacity {
            plans.clear();
        }
        Ok(Arc::clone(plans.entry(key).or_insert(compiled)))
    }
}

impl Synthesizer for TractSynthesizer {
    fn name(&self) -> &str {
        BACKEND
    }

    fn synthesize(&self, request: &StyleRequest) -> Result<SynthesisResult> {
        let (width, height) = request.style().dimensions();
        let gray = self.text_background;

        let rendered = self.fonts.render_line(
            request.text(),
            request.language(),
            width,
            height,
            Rgb([0, 0, 0]),
            Rgb([gray, gray, gray]),
        )?;

        let plan = self.plan_for(width, height)?;
        let inference_start = Instant::now();

        let i_t = Tensor::from(image_to_tensor(&rendered));
        let i_s = Tensor::from(image_to_tensor(request.style()));
        let outputs = plan
            .run(tvec![i_t.into(), i_s.into()])
            .map_err(|e| StyleTextError::synthesis_with_backend(BACKEND, "Inference", &e.to_string()))?;

        if outputs.len() < 3 {
            return Err(StyleTextError::synthesis_with_backend(
                BACKEND,
                "Inference",
                &format!("expected 3 outputs, got {}", outputs.len()),
            ));
        }

        let mut views = Vec::with_capacity(3);
        for output in outputs.iter().take(3) {
            let view = output.to_array_view::<f32>().map_err(|e| {
                StyleTextError::synthesis_with_backend(BACKEND, "Output conversion", &e.to_string())
            })?;
            views.push(view);
        }
        let [text_view, sk_view, fusion_view] = views.as_slice() else {
            return Err(StyleTextError::synthesis("missing model outputs"));
        };

        let result = SynthesisResult {
            fake_text: tensor_to_rgb(text_view, "fake_text")?,
            fake_sk: tensor_to_dynamic(sk_view, "fake_sk")?,
            fake_fusion: tensor_to_rgb(fusion_view, "fake_fusion")?,
        };

        tracing::debug!(
            width,
            height,
            inference_ms = inference_start.elapsed().as_millis() as u64,
            "✅ Tract inference completed"
        );
        Ok(result)
    }
}

/// `[0, 255]` to `[-1, 1]`
fn normalize(value: u8) -> f32 {
    (f32::from(value) / 255.0 - 0.5) / 0.5
}

/// `[-1, 1]` to `[0, 255]`
fn denormalize(value: f32) -> u8 {
    ((value * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8
}

/// RGB image to a `1x3xHxW` NCHW tensor
pub(crate) fn image_to_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    Array4::from_shape_fn((1, 3, height as usize, width as usize), |(_, c, y, x)| {
        normalize(image.get_pixel(x as u32, y as u32)[c])
    })
}

fn checked_nchw<'a>(view: &ArrayViewD<'a, f32>, name: &str) -> Result<ndarray::ArrayView4<'a, f32>> {
    view.clone().into_dimensionality::<Ix4>().map_err(|_| {
        StyleTextError::synthesis_with_backend(
            BACKEND,
            "Output conversion",
            &format!("{} must be 4D NCHW, got shape {:?}", name, view.shape()),
        )
    })
}

/// `1x3xHxW` tensor to an RGB image
pub(crate) fn tensor_to_rgb(view: &ArrayViewD<'_, f32>, name: &str) -> Result<RgbImage> {
    let nchw = checked_nchw(view, name)?;
    let (_, channels, height, width) = nchw.dim();
    if channels != 3 {
        return Err(StyleTextError::synthesis_with_backend(
            BACKEND,
            "Output conversion",
            &format!("{} must have 3 channels, got {}", name, channels),
        ));
    }
    let sample = |c: usize, x: u32, y: u32| {
        nchw.get([0, c, y as usize, x as usize])
            .copied()
            .map_or(0, denormalize)
    };
    Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
        Rgb([sample(0, x, y), sample(1, x, y), sample(2, x, y)])
    }))
}

/// `1x1xHxW` or `1x3xHxW` tensor to a gray or RGB image
pub(crate) fn tensor_to_dynamic(view: &ArrayViewD<'_, f32>, name: &str) -> Result<DynamicImage> {
    let nchw = checked_nchw(view, name)?;
    let (_, channels, height, width) = nchw.dim();
    match channels {
        1 => Ok(DynamicImage::ImageLuma8(GrayImage::from_fn(
            width as u32,
            height as u32,
            |x, y| {
                Luma([nchw
                    .get([0, 0, y as usize, x as usize])
                    .copied()
                    .map_or(0, denormalize)])
            },
        ))),
        3 => Ok(DynamicImage::ImageRgb8(tensor_to_rgb(view, name)?)),
        other => Err(StyleTextError::synthesis_with_backend(
            BACKEND,
            "Output conversion",
            &format!("{} must have 1 or 3 channels, got {}", name, other),
        )),
    }
}
