use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "snack-lens.json";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub inference: InferenceConfig,
    pub presentation: PresentationConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropScale {
    /// Largest centred square, then scaled to the model input.
    #[default]
    CenterCrop,
    /// Whole image scaled to fit inside the input, padded with black.
    ScaleFit,
    /// Whole image stretched to the input, aspect ratio ignored.
    ScaleFill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Relative paths resolve against the bundled resource directory.
    pub model_file: PathBuf,
    pub labels_file: PathBuf,
    pub input_size: u32,
    pub allow_low_precision_gpu: bool,
    pub intra_threads: usize,
    pub crop_scale: CropScale,
    pub apply_softmax: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_file: PathBuf::from("snack_classifier.onnx"),
            labels_file: PathBuf::from("snack_classifier.json"),
            input_size: 224,
            allow_low_precision_gpu: true,
            intra_threads: 4,
            crop_scale: CropScale::CenterCrop,
            apply_softmax: true,
        }
    }
}

impl ModelConfig {
    pub fn model_path(&self, resource_dir: &Path) -> PathBuf {
        resolve(resource_dir, &self.model_file)
    }

    pub fn labels_path(&self, resource_dir: &Path) -> PathBuf {
        resolve(resource_dir, &self.labels_file)
    }
}

fn resolve(base: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base.join(file)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Drop outcomes older than the one already on screen.
    #[default]
    LatestSubmitted,
    /// Whichever outcome reaches the presenter last is shown.
    LatestCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub top_k: usize,
    pub min_confidence: f32,
    pub commit_policy: CommitPolicy,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_confidence: 0.0,
            commit_policy: CommitPolicy::LatestSubmitted,
        }
    }
}

/// Timings are in seconds, offsets in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub show_duration: f32,
    pub show_delay: f32,
    pub spring_damping: f32,
    pub spring_velocity: f32,
    pub hide_duration: f32,
    pub offset_hidden: f32,
    pub offset_visible: f32,
    pub keyframes: usize,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            show_duration: 0.5,
            show_delay: 0.1,
            spring_damping: 0.6,
            spring_velocity: 0.6,
            hide_duration: 0.3,
            offset_hidden: 100.0,
            offset_visible: -10.0,
            keyframes: 32,
        }
    }
}

impl AppConfig {
    /// Reads `snack-lens.json` from `config_dir`, falling back to defaults
    /// when the file does not exist. Missing fields keep their defaults.
    pub fn load(config_dir: &Path) -> Result<Self, AppError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| AppError {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: AppConfig = serde_json::from_str(&content).map_err(|e| AppError {
            message: format!("Failed to parse config {}: {}", path.display(), e),
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.model.input_size == 0 {
            return Err("model.input_size must be greater than zero".into());
        }
        if self.inference.top_k == 0 {
            return Err("inference.top_k must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.inference.min_confidence) {
            return Err("inference.min_confidence must be within [0, 1]".into());
        }
        if self.presentation.show_duration <= 0.0 {
            return Err("presentation.show_duration must be positive".into());
        }
        // Zero hides instantly.
        if self.presentation.hide_duration < 0.0 {
            return Err("presentation.hide_duration must not be negative".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_timings() {
        let config = AppConfig::default();
        assert_eq!(config.presentation.show_duration, 0.5);
        assert_eq!(config.presentation.show_delay, 0.1);
        assert_eq!(config.presentation.spring_damping, 0.6);
        assert_eq!(config.presentation.spring_velocity, 0.6);
        assert_eq!(config.presentation.hide_duration, 0.3);
        assert_eq!(config.model.crop_scale, CropScale::CenterCrop);
        assert!(config.model.allow_low_precision_gpu);
        assert_eq!(config.inference.commit_policy, CommitPolicy::LatestSubmitted);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_unspecified_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "inference": { "commit_policy": "latest_completed", "top_k": 3 } }"#,
        )
        .unwrap();

        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.inference.commit_policy, CommitPolicy::LatestCompleted);
        assert_eq!(config.inference.top_k, 3);
        assert_eq!(config.inference.min_confidence, 0.0);
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "inference": { "min_confidence": 1.5 } }"#,
        )
        .unwrap();
        let err = AppConfig::load(dir.path()).unwrap_err();
        assert!(err.message.contains("min_confidence"));
    }

    #[test]
    fn hide_may_be_instant_but_show_may_not() {
        let mut config = AppConfig::default();
        config.presentation.hide_duration = 0.0;
        assert!(config.validate().is_ok());

        config.presentation.hide_duration = -0.1;
        let err = config.validate().unwrap_err();
        assert_eq!(err.message, "presentation.hide_duration must not be negative");

        config.presentation.hide_duration = 0.3;
        config.presentation.show_duration = 0.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.message, "presentation.show_duration must be positive");
    }

    #[test]
    fn relative_model_paths_resolve_against_resources() {
        let model = ModelConfig::default();
        let base = Path::new("/opt/snack-lens/resources");
        assert_eq!(
            model.model_path(base),
            base.join("snack_classifier.onnx")
        );

        let absolute = ModelConfig {
            labels_file: PathBuf::from("/data/labels.json"),
            ..ModelConfig::default()
        };
        assert_eq!(absolute.labels_path(base), PathBuf::from("/data/labels.json"));
    }
}
