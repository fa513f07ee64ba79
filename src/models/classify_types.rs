use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SessionStatus {
    pub loading: bool,
    pub ready: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    pub class_name: String,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(class_name: impl Into<String>, confidence: f32) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
        }
    }
}

/// What one classification request produced. Exactly one variant per request.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClassificationOutcome {
    /// Non-empty, ordered by descending confidence.
    Ranked { predictions: Vec<Prediction> },
    Empty,
    Failed { message: String },
    /// The background task ended without results or an error.
    Unexpected,
}

impl ClassificationOutcome {
    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        if predictions.is_empty() {
            ClassificationOutcome::Empty
        } else {
            ClassificationOutcome::Ranked { predictions }
        }
    }

    pub fn top(&self) -> Option<&Prediction> {
        match self {
            ClassificationOutcome::Ranked { predictions } => predictions.first(),
            _ => None,
        }
    }
}

/// Returned to the webview once an image has been handed to the classifier.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedCapture {
    pub request: u64,
    pub preview: String,
    pub width: u32,
    pub height: u32,
}
