use crate::config::{CropScale, InferenceConfig, ModelConfig};
use crate::error::ClassifierError;
use crate::models::capture_types::CapturedImage;
use crate::models::classify_types::Prediction;
use crate::services::classifier::backend::{InferenceBackend, OrtBackend, SessionOptions};
use crate::services::classifier::inference;
use crate::services::exif_service;
use std::path::Path;
use std::time::Instant;

/// A loaded model with its fixed preprocessing. Immutable once built.
pub struct ClassifierSession {
    backend: Box<dyn InferenceBackend>,
    labels: Vec<String>,
    input_size: u32,
    crop_scale: CropScale,
    apply_softmax: bool,
    options: SessionOptions,
}

impl ClassifierSession {
    pub fn new(
        backend: Box<dyn InferenceBackend>,
        labels: Vec<String>,
        model: &ModelConfig,
    ) -> Result<Self, ClassifierError> {
        if model.input_size == 0 {
            return Err(ClassifierError::Config("input size must be non-zero".to_string()));
        }
        Ok(Self {
            backend,
            labels,
            input_size: model.input_size,
            crop_scale: model.crop_scale,
            apply_softmax: model.apply_softmax,
            options: SessionOptions {
                allow_low_precision_gpu: model.allow_low_precision_gpu,
                intra_threads: model.intra_threads,
            },
        })
    }

    /// Loads labels and the ONNX model named by `model`, resolving relative
    /// paths against `resource_dir`. Blocking.
    pub fn load(model: &ModelConfig, resource_dir: &Path) -> Result<Self, ClassifierError> {
        let labels = load_labels(&model.labels_path(resource_dir))?;
        let options = SessionOptions {
            allow_low_precision_gpu: model.allow_low_precision_gpu,
            intra_threads: model.intra_threads,
        };
        let backend = OrtBackend::load(&model.model_path(resource_dir), options)?;
        Self::new(Box::new(backend), labels, model)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn crop_scale(&self) -> CropScale {
        self.crop_scale
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Orients, crops and runs one image. Blocking; call from a worker thread.
    pub fn classify(
        &self,
        captured: CapturedImage,
        limits: &InferenceConfig,
    ) -> Result<Vec<Prediction>, ClassifierError> {
        let start = Instant::now();
        let upright = exif_service::apply_orientation(captured.image, captured.orientation);
        let square = inference::crop_and_scale(&upright, self.crop_scale, self.input_size);
        let tensor = inference::to_tensor(square)?;
        let prep_ms = start.elapsed().as_secs_f64() * 1000.0;

        let scores = self.backend.run(tensor)?;
        let predictions = inference::rank(
            &scores,
            &self.labels,
            self.apply_softmax,
            limits.top_k,
            limits.min_confidence,
        );

        tracing::debug!(
            prep_ms,
            total_ms = start.elapsed().as_secs_f64() * 1000.0,
            observations = predictions.len(),
            "classified {:?} image",
            captured.source
        );
        Ok(predictions)
    }
}

/// Reads the `id2label` map of a model config JSON into index order.
pub fn load_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ClassifierError::Labels(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_labels(&content)
}

pub fn parse_labels(content: &str) -> Result<Vec<String>, ClassifierError> {
    let config: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ClassifierError::Labels(format!("Failed to parse label JSON: {}", e)))?;

    let id2label = config["id2label"]
        .as_object()
        .ok_or_else(|| ClassifierError::Labels("Config missing id2label field".to_string()))?;

    let mut labels: Vec<(usize, String)> = id2label
        .iter()
        .map(|(k, v)| {
            let idx = k
                .parse::<usize>()
                .map_err(|_| ClassifierError::Labels(format!("Invalid class index {:?}", k)))?;
            let label = v
                .as_str()
                .ok_or_else(|| ClassifierError::Labels(format!("Label for class {} is not a string", idx)))?;
            Ok((idx, label.to_string()))
        })
        .collect::<Result<_, ClassifierError>>()?;
    labels.sort_by_key(|(idx, _)| *idx);

    if labels.iter().enumerate().any(|(pos, (idx, _))| pos != *idx) {
        return Err(ClassifierError::Labels("Class indices must be contiguous from 0".to_string()));
    }

    Ok(labels.into_iter().map(|(_, label)| label).collect())
}
