use crate::error::ClassifierError;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

/// Raw model execution: NCHW tensor in, one score per class out.
pub trait InferenceBackend: Send + Sync {
    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Lets GPU execution providers accumulate in reduced precision.
    pub allow_low_precision_gpu: bool,
    pub intra_threads: usize,
}

/// ONNX Runtime backed model. Runs need `&mut Session`, so they are serialised.
pub struct OrtBackend {
    session: Mutex<Session>,
}

impl OrtBackend {
    pub fn load(model_path: &Path, options: SessionOptions) -> Result<Self, ClassifierError> {
        let _ = ort::init().with_name("snack-lens").commit();

        let mut builder = Session::builder()
            .map_err(|e| ClassifierError::Load(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::Load(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(options.intra_threads.max(1))
            .map_err(|e| ClassifierError::Load(format!("Failed to set intra threads: {}", e)))?;

        // GPU providers may run in fp16; only register them when that is acceptable.
        if options.allow_low_precision_gpu {
            builder = builder
                .with_execution_providers([
                    ort::execution_providers::CoreMLExecutionProvider::default().build(),
                    ort::execution_providers::DirectMLExecutionProvider::default().build(),
                    ort::execution_providers::CUDAExecutionProvider::default().build(),
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ])
                .map_err(|e| ClassifierError::Load(format!("Failed to register GPU execution providers: {}", e)))?;
        } else {
            builder = builder
                .with_execution_providers([
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ])
                .map_err(|e| ClassifierError::Load(format!("Failed to register CPU execution provider: {}", e)))?;
        }

        let session = builder.commit_from_file(model_path).map_err(|e| {
            ClassifierError::Load(format!(
                "Failed to load ONNX model {}: {}",
                model_path.display(),
                e
            ))
        })?;

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Underlying("Model session poisoned".to_string()))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| ClassifierError::Underlying("Model declares no inputs".to_string()))?;

        let input_tensor = Value::from_array(input)
            .map_err(|e| ClassifierError::Underlying(format!("Failed to create tensor value: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| ClassifierError::Underlying(format!("Inference failed: {}", e)))?;

        let output_value = match outputs.values().next() {
            Some(v) => v,
            // No output tensor means no observations, not a failure.
            None => return Ok(Vec::new()),
        };

        let (_, data) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Underlying(format!("Failed to extract output tensor: {}", e)))?;

        Ok(data.to_vec())
    }
}
