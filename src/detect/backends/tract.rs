#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::engine::ModelLoadError;
use crate::detect::result::{BoundingBox, Detection};

/// Minimum class score for a proposal to enter NMS. The pipeline applies its
/// own display threshold on top of this.
const CANDIDATE_FLOOR: f32 = 0.25;
/// Greedy NMS overlap threshold.
const NMS_IOU: f32 = 0.45;

/// Tract-based backend for ONNX sign models.
///
/// Loads a local artifact once and performs synchronous inference on RGB
/// frames. Expects a YOLO-style head: one `[1, 4 + classes, proposals]`
/// output with `cx, cy, w, h` rows followed by per-class scores.
pub struct TractBackend {
    model: TypedSimplePlan<TypedModel>,
    input_width: u32,
    input_height: u32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn load(model_path: &Path, input_width: u32, input_height: u32) -> Result<Self, ModelLoadError> {
        if !model_path.is_file() {
            return Err(ModelLoadError::Missing(model_path.display().to_string()));
        }
        let build = || -> Result<TypedSimplePlan<TypedModel>> {
            tract_onnx::onnx()
                .model_for_path(model_path)
                .with_context(|| {
                    format!("failed to load ONNX model from {}", model_path.display())
                })?
                .with_input_fact(
                    0,
                    InferenceFact::dt_shape(
                        f32::datum_type(),
                        tvec!(1, 3, input_height as usize, input_width as usize),
                    ),
                )
                .context("failed to set input fact")?
                .into_optimized()
                .context("failed to optimize ONNX model")?
                .into_runnable()
                .context("failed to build runnable ONNX model")
        };
        let model = build().map_err(|e| ModelLoadError::Load {
            path: model_path.display().to_string(),
            reason: format!("{:#}", e),
        })?;

        Ok(Self {
            model,
            input_width,
            input_height,
        })
    }

    /// Sample the frame into the model's NCHW f32 input. Nearest-neighbor
    /// when frame and model sizes differ.
    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let (fw, fh) = (width as usize, height as usize);
        let (iw, ih) = (self.input_width as usize, self.input_height as usize);
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, ih, iw), |(_, channel, y, x)| {
                let sx = (x * fw / iw).min(fw - 1);
                let sy = (y * fh / ih).min(fh - 1);
                let idx = (sy * fw + sx) * 3 + channel;
                pixels[idx] as f32 / 255.0
            });

        Ok(input.into_tensor())
    }

    /// Decode the YOLO head into frame-space detections.
    fn decode_outputs(
        &self,
        outputs: TVec<TValue>,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("model output was not [1, rows, proposals]")?;

        let rows = view.shape()[1];
        let proposals = view.shape()[2];
        let num_classes = rows
            .checked_sub(4)
            .filter(|nc| *nc > 0)
            .ok_or_else(|| anyhow!("model output has {} rows, expected 4 + classes", rows))?;

        let scale_x = frame_width as f32 / self.input_width as f32;
        let scale_y = frame_height as f32 / self.input_height as f32;

        let mut candidates: Vec<Detection> = Vec::new();
        for i in 0..proposals {
            let mut best_class = 0usize;
            let mut best_score = 0f32;
            for c in 0..num_classes {
                let score = view[[0, 4 + c, i]];
                if score > best_score {
                    best_score = score;
                    best_class = c;
                }
            }
            if best_score < CANDIDATE_FLOOR {
                continue;
            }

            let cx = view[[0, 0, i]];
            let cy = view[[0, 1, i]];
            let w = view[[0, 2, i]];
            let h = view[[0, 3, i]];

            let x1 = ((cx - w / 2.0) * scale_x).round() as i64;
            let y1 = ((cy - h / 2.0) * scale_y).round() as i64;
            let x2 = ((cx + w / 2.0) * scale_x).round() as i64;
            let y2 = ((cy + h / 2.0) * scale_y).round() as i64;

            candidates.push(Detection {
                class_id: best_class as u32,
                confidence: best_score.clamp(0.0, 1.0),
                bbox: BoundingBox::new(x1, y1, x2, y2),
            });
        }

        Ok(nms(candidates, NMS_IOU))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode_outputs(outputs, width, height)
    }
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_unstable_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| k.bbox.iou(&candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
