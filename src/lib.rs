mod commands;
mod config;
mod error;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use config::AppConfig;
use services::classifier::executor::InferenceExecutor;
use services::classifier::model_manager::ModelManager;
use services::image_source::ImageSourceAdapter;
use services::pipeline::Pipeline;
use services::presentation::{PresentationController, WebviewSurface};
use tauri::Manager;

/// Logs go to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_window_state::Builder::default().build())
        .setup(|app| {
            let config_dir = app.path().app_config_dir()?;
            let config = AppConfig::load(&config_dir)?;
            let resource_dir = app.path().resource_dir()?.join("resources");
            tracing::info!(
                config = %config_dir.display(),
                resources = %resource_dir.display(),
                "starting snack-lens"
            );

            let model_manager = ModelManager::from_config(config.model.clone(), resource_dir);

            let (presenter, presenter_task) = PresentationController::new(
                config.presentation.clone(),
                config.inference.commit_policy,
                WebviewSurface::new(app.handle().clone()),
            )
            .into_task();
            tauri::async_runtime::spawn(presenter_task);

            let executor = InferenceExecutor::new(model_manager.clone(), config.inference.clone());
            let sources = ImageSourceAdapter::new(presenter.clone());
            app.manage(Pipeline::new(sources, executor, presenter));

            // Build the session now so the first photo does not wait for it.
            tauri::async_runtime::spawn(async move {
                let _ = model_manager.get_or_create().await;
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::capture::available_sources,
            commands::capture::register_camera,
            commands::capture::open_camera,
            commands::capture::acquire_image,
            commands::classifier::get_session_status,
            commands::classifier::get_presentation_state,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
