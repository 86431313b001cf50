//! ONNX classifier loading and inference.

use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Binary classifier over the reduced feature vector.
///
/// The fitted model is an opaque artifact; implementations expose only the
/// class-1 probability for a single row.
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, features: &[f32]) -> Result<f64>;
}

/// LightGBM classifier consumed through its ONNX export.
pub struct OnnxClassifier {
    /// ONNX Runtime session (RwLock for interior mutability; `run` needs
    /// exclusive access).
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load the classifier from an ONNX file.
    pub fn load<P: AsRef<Path>>(path: P, intra_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        ort::init().commit()?;
        info!(path = %path.display(), threads = intra_threads, "Loading ONNX classifier");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load classifier from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // LightGBM exports name the probability output; fall back to the
        // last output otherwise.
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("output"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        info!(
            input = %input_name,
            output = %output_name,
            "Classifier loaded successfully"
        );

        Ok(Self {
            session: RwLock::new(session),
            input_name,
            output_name,
        })
    }

    /// Extract the class-1 probability from the session outputs. Handles
    /// plain tensor outputs as well as the seq(map(int64,float)) shape that
    /// LightGBM and CatBoost ONNX exports produce.
    fn extract_probability(&self, outputs: &ort::session::SessionOutputs) -> Result<f64> {
        if let Some(output) = outputs.get(&self.output_name) {
            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let prob = class1_prob_from_tensor(&shape, data);
                debug!(prob = prob, "Extracted probability from tensor");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&output.dtype()) {
                if let Ok(prob) = extract_from_sequence_map(output) {
                    return Ok(prob);
                }
            }
        }

        // Fallback: scan all outputs, skipping the hard-label tensor.
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }

            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let prob = class1_prob_from_tensor(&shape, data);
                debug!(output = %name, prob = prob, "Extracted probability from tensor (fallback)");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&output.dtype()) {
                if let Ok(prob) = extract_from_sequence_map(&output) {
                    return Ok(prob);
                }
            }
        }

        anyhow::bail!("no probability output found in classifier result")
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;
        self.extract_probability(&outputs)
    }
}

/// Extract the class-1 probability from seq(map(int64, float)) output.
fn extract_from_sequence_map(output: &ort::value::DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    if maps.is_empty() {
        anyhow::bail!("Empty sequence");
    }

    // Single-row inference: only the first map matters.
    let kv_pairs = maps[0].try_extract_key_values::<i64, f32>()?;

    for (class_id, prob) in &kv_pairs {
        if *class_id == 1 {
            debug!(prob = *prob, "Extracted probability from seq(map)");
            return Ok(*prob as f64);
        }
    }
    for (class_id, prob) in &kv_pairs {
        if *class_id == 0 {
            return Ok(1.0 - *prob as f64);
        }
    }

    anyhow::bail!("No probability found in map")
}

/// Class-1 probability from a [batch, classes] or [classes] tensor.
fn class1_prob_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> f64 {
    let dims: Vec<i64> = shape.iter().copied().collect();

    let num_classes = match dims.len() {
        2 => dims[1] as usize,
        1 => dims[0] as usize,
        _ => 0,
    };

    if num_classes >= 2 {
        return data[1] as f64;
    }
    if num_classes == 1 {
        return data[0] as f64;
    }

    warn!("Unexpected probability tensor shape, using last value");
    data.last().map(|&v| v as f64).unwrap_or(0.5)
}
