use crate::error::AppError;
use crate::models::capture_types::SourceKind;
use crate::models::classify_types::SubmittedCapture;
use crate::services::image_source::DialogPicker;
use crate::services::pipeline::Pipeline;
use tauri::{AppHandle, State};

#[tauri::command]
pub fn available_sources(pipeline: State<'_, Pipeline>) -> Vec<SourceKind> {
    pipeline.sources.available_sources()
}

#[tauri::command]
pub fn register_camera(pipeline: State<'_, Pipeline>, present: bool) {
    pipeline.sources.register_camera(present);
}

/// Called as the camera overlay opens; hides the results panel.
#[tauri::command]
pub fn open_camera(pipeline: State<'_, Pipeline>) -> Result<(), AppError> {
    pipeline.sources.camera_opened()
}

/// Returns `null` when the user cancels the picker or camera overlay.
#[tauri::command]
pub async fn acquire_image(
    app: AppHandle,
    pipeline: State<'_, Pipeline>,
    source: SourceKind,
    frame: Option<String>,
) -> Result<Option<SubmittedCapture>, AppError> {
    let picker = DialogPicker::new(app);
    pipeline.capture(source, frame, &picker).await
}
