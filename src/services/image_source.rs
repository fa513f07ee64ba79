use crate::error::AppError;
use crate::models::capture_types::{Acquisition, CapturedImage, SourceKind};
use crate::services::exif_service;
use crate::services::presentation::PresenterHandle;
use base64::Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tauri::AppHandle;
use tauri_plugin_dialog::DialogExt;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff", "gif"];

const PREVIEW_SIZE: u32 = 1920;

/// Modal photo-library picker. Resolves to `None` when the user cancels.
pub trait PhotoPicker: Send + Sync {
    fn pick_photo(&self) -> BoxFuture<'_, Option<PathBuf>>;
}

/// Native file-open dialog.
pub struct DialogPicker {
    app: AppHandle,
}

impl DialogPicker {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl PhotoPicker for DialogPicker {
    fn pick_photo(&self) -> BoxFuture<'_, Option<PathBuf>> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.app
            .dialog()
            .file()
            .set_title("Choose a photo")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file(move |file| {
                let _ = tx.send(file);
            });

        async move {
            match rx.await {
                Ok(Some(file)) => match file.into_path() {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::warn!("picked file is not a local path: {}", e);
                        None
                    }
                },
                _ => None,
            }
        }
        .boxed()
    }
}

/// Turns picker results and camera frames into [`CapturedImage`]s.
#[derive(Clone)]
pub struct ImageSourceAdapter {
    presenter: PresenterHandle,
    camera_present: Arc<AtomicBool>,
}

impl ImageSourceAdapter {
    pub fn new(presenter: PresenterHandle) -> Self {
        Self {
            presenter,
            camera_present: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The webview reports whether it found a video input device.
    pub fn register_camera(&self, present: bool) {
        self.camera_present.store(present, Ordering::Relaxed);
        tracing::info!(present, "camera availability registered");
    }

    pub fn is_available(&self, source: SourceKind) -> bool {
        match source {
            SourceKind::Camera => self.camera_present.load(Ordering::Relaxed),
            SourceKind::PhotoLibrary => true,
        }
    }

    pub fn available_sources(&self) -> Vec<SourceKind> {
        [SourceKind::Camera, SourceKind::PhotoLibrary]
            .into_iter()
            .filter(|s| self.is_available(*s))
            .collect()
    }

    /// The webview is about to show its capture overlay.
    pub fn camera_opened(&self) -> Result<(), AppError> {
        if !self.is_available(SourceKind::Camera) {
            return Err("Camera unavailable on this device".into());
        }
        self.presenter.picker_presented();
        Ok(())
    }

    /// Obtains one image from `source`.
    ///
    /// The library dialog is opened here, after hiding the results panel. For
    /// the camera the overlay was announced through [`Self::camera_opened`];
    /// the webview passes the frame (base64, optionally a data URL), and
    /// `None` means the user closed the overlay.
    pub async fn acquire(
        &self,
        source: SourceKind,
        camera_frame: Option<String>,
        picker: &dyn PhotoPicker,
    ) -> Result<Acquisition, AppError> {
        if !self.is_available(source) {
            return Err("Camera unavailable on this device".into());
        }

        let bytes = match source {
            SourceKind::Camera => match camera_frame {
                Some(frame) => decode_camera_frame(&frame)?,
                None => return Ok(Acquisition::Cancelled),
            },
            SourceKind::PhotoLibrary => {
                self.presenter.picker_presented();
                match picker.pick_photo().await {
                    Some(path) => tokio::fs::read(&path).await.map_err(|e| AppError {
                        message: format!("Failed to read {}: {}", path.display(), e),
                    })?,
                    None => return Ok(Acquisition::Cancelled),
                }
            }
        };

        let captured = tokio::task::spawn_blocking(move || decode_capture(source, &bytes))
            .await
            .map_err(|e| AppError {
                message: format!("Image decode task failed: {}", e),
            })??;
        Ok(Acquisition::Captured(captured))
    }
}

/// Accepts raw base64 or a `data:image/...;base64,` URL.
pub fn decode_camera_frame(frame: &str) -> Result<Vec<u8>, AppError> {
    let payload = match frame.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => frame,
    };
    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}

/// Decodes image bytes and records their EXIF orientation. Pixels stay as stored.
pub fn decode_capture(source: SourceKind, bytes: &[u8]) -> Result<CapturedImage, AppError> {
    let orientation = exif_service::read_orientation(bytes);
    let image = image::load_from_memory(bytes).map_err(|e| AppError {
        message: format!("Failed to decode image: {}", e),
    })?;
    tracing::debug!(
        ?source,
        width = image.width(),
        height = image.height(),
        orientation = orientation.exif_value(),
        "decoded capture"
    );
    Ok(CapturedImage {
        source,
        image,
        orientation,
    })
}

/// Upright JPEG preview for the image view, bounded to 1920px.
pub fn preview_data_url(captured: &CapturedImage) -> Result<String, AppError> {
    // Resize before rotating; the bounding box is square so the order is free.
    let mut img = if captured.image.width() > PREVIEW_SIZE || captured.image.height() > PREVIEW_SIZE {
        captured.image.thumbnail(PREVIEW_SIZE, PREVIEW_SIZE)
    } else {
        captured.image.clone()
    };
    img = exif_service::apply_orientation(img, captured.orientation);

    let mut buffer = std::io::Cursor::new(Vec::new());
    img.to_rgb8()
        .write_to(&mut buffer, image::ImageFormat::Jpeg)
        .map_err(|e| AppError {
            message: format!("Failed to encode preview: {}", e),
        })?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
    Ok(format!("data:image/jpeg;base64,{}", b64))
}
