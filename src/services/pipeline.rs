use crate::error::AppError;
use crate::models::capture_types::{Acquisition, SourceKind};
use crate::models::classify_types::SubmittedCapture;
use crate::services::classifier::executor::InferenceExecutor;
use crate::services::image_source::{self, ImageSourceAdapter, PhotoPicker};
use crate::services::presentation::PresenterHandle;

/// Capture → classify → present, for one user gesture at a time.
#[derive(Clone)]
pub struct Pipeline {
    pub sources: ImageSourceAdapter,
    pub executor: InferenceExecutor,
    pub presenter: PresenterHandle,
}

impl Pipeline {
    pub fn new(sources: ImageSourceAdapter, executor: InferenceExecutor, presenter: PresenterHandle) -> Self {
        Self {
            sources,
            executor,
            presenter,
        }
    }

    /// Returns as soon as the image is submitted; the outcome reaches the
    /// presenter later. `Ok(None)` means the user cancelled.
    ///
    /// An unavailable classifier is reported as an error and the panel is
    /// left hidden.
    pub async fn capture(
        &self,
        source: SourceKind,
        camera_frame: Option<String>,
        picker: &dyn PhotoPicker,
    ) -> Result<Option<SubmittedCapture>, AppError> {
        let captured = match self.sources.acquire(source, camera_frame, picker).await? {
            Acquisition::Captured(captured) => captured,
            Acquisition::Cancelled => {
                tracing::debug!(?source, "acquisition cancelled");
                return Ok(None);
            }
        };

        let (width, height) = captured.display_size();
        let preview = image_source::preview_data_url(&captured)?;

        let ticket = self.executor.submit(captured).await.map_err(|e| {
            tracing::warn!("not classifying: {}", e);
            AppError::from(e)
        })?;
        let request = ticket.seq;

        let presenter = self.presenter.clone();
        tokio::spawn(async move {
            let outcome = ticket.outcome().await;
            presenter.present(request, outcome);
        });

        Ok(Some(SubmittedCapture {
            request,
            preview,
            width,
            height,
        }))
    }
}
