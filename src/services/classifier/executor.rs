use crate::config::InferenceConfig;
use crate::error::ClassifierError;
use crate::models::capture_types::CapturedImage;
use crate::models::classify_types::ClassificationOutcome;
use crate::services::classifier::model_manager::ModelManager;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A submitted request. Awaiting [`Ticket::outcome`] never blocks the caller's thread.
pub struct Ticket {
    pub seq: u64,
    outcome: BoxFuture<'static, ClassificationOutcome>,
}

impl Ticket {
    pub async fn outcome(self) -> ClassificationOutcome {
        self.outcome.await
    }
}

/// Runs classifications on the blocking pool, one task per image.
///
/// Submissions are numbered in the order they arrive. Earlier requests are
/// never cancelled; each runs to completion on its own.
#[derive(Clone)]
pub struct InferenceExecutor {
    models: ModelManager,
    config: InferenceConfig,
    next_seq: Arc<AtomicU64>,
}

impl InferenceExecutor {
    pub fn new(models: ModelManager, config: InferenceConfig) -> Self {
        Self {
            models,
            config,
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn models(&self) -> &ModelManager {
        &self.models
    }

    /// Fails fast with [`ClassifierError::Unavailable`] when no session can exist.
    pub async fn submit(&self, image: CapturedImage) -> Result<Ticket, ClassifierError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let session = self.models.get_or_create().await?;
        let limits = self.config.clone();

        tracing::debug!(seq, source = ?image.source, "submitting classification");
        let handle = tokio::task::spawn_blocking(move || session.classify(image, &limits));

        let outcome = async move {
            match handle.await {
                Ok(Ok(predictions)) => ClassificationOutcome::from_predictions(predictions),
                Ok(Err(e)) => {
                    tracing::warn!(seq, "classification failed: {}", e);
                    ClassificationOutcome::Failed {
                        message: e.to_string(),
                    }
                }
                Err(e) => {
                    tracing::warn!(seq, "classification task ended abnormally: {}", e);
                    ClassificationOutcome::Unexpected
                }
            }
        }
        .boxed();

        Ok(Ticket { seq, outcome })
    }
}
