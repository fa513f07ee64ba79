use crate::error::AppError;
use crate::models::classify_types::SessionStatus;
use crate::models::presentation_types::PresentationState;
use crate::services::pipeline::Pipeline;
use tauri::State;

#[tauri::command]
pub fn get_session_status(pipeline: State<'_, Pipeline>) -> SessionStatus {
    pipeline.executor.models().status()
}

#[tauri::command]
pub async fn get_presentation_state(pipeline: State<'_, Pipeline>) -> Result<PresentationState, AppError> {
    pipeline.presenter.snapshot().await
}
