use crate::config::ModelConfig;
use crate::error::ClassifierError;
use crate::models::classify_types::SessionStatus;
use crate::services::classifier::session::ClassifierSession;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

type Loader = Arc<dyn Fn() -> Result<ClassifierSession, ClassifierError> + Send + Sync>;

type Slot = Result<Arc<ClassifierSession>, String>;

struct Inner {
    cell: OnceCell<Slot>,
    loader: Loader,
    loading: AtomicBool,
}

/// Clears the loading flag however the load ends.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Relaxed);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl Inner {
    async fn initialize(&self) -> &Slot {
        self.cell
            .get_or_init(|| async {
                let _loading = LoadingFlag::raise(&self.loading);
                let start = Instant::now();

                let loader = self.loader.clone();
                let result = tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(|e| ClassifierError::Load(format!("Failed to spawn model loading task: {}", e)))
                    .and_then(|r| r);

                match result {
                    Ok(session) => {
                        tracing::info!(
                            labels = session.labels().len(),
                            crop = ?session.crop_scale(),
                            low_precision_gpu = session.options().allow_low_precision_gpu,
                            load_ms = start.elapsed().as_millis() as u64,
                            "classifier session ready"
                        );
                        Ok(Arc::new(session))
                    }
                    Err(e) => {
                        tracing::warn!("classifier session unavailable: {}", e);
                        Err(e.to_string())
                    }
                }
            })
            .await
    }
}

/// Owns the one classifier session of the process.
///
/// The loader runs at most once. If it fails the error is kept and every
/// later request is answered with [`ClassifierError::Unavailable`]; the model
/// is a bundled asset, so a retry would fail the same way.
#[derive(Clone)]
pub struct ModelManager {
    inner: Arc<Inner>,
}

impl ModelManager {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<ClassifierSession, ClassifierError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                cell: OnceCell::new(),
                loader: Arc::new(loader),
                loading: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_config(model: ModelConfig, resource_dir: PathBuf) -> Self {
        Self::new(move || ClassifierSession::load(&model, &resource_dir))
    }

    pub async fn get_or_create(&self) -> Result<Arc<ClassifierSession>, ClassifierError> {
        if let Some(slot) = self.inner.cell.get() {
            return slot.clone().map_err(ClassifierError::Unavailable);
        }

        // The load runs in its own task; a caller that goes away does not abandon it.
        let inner = self.inner.clone();
        let slot = tokio::spawn(async move { inner.initialize().await.clone() })
            .await
            .map_err(|e| ClassifierError::Load(format!("Model loading task failed: {}", e)))?;
        slot.map_err(ClassifierError::Unavailable)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Relaxed)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.inner.cell.get(), Some(Ok(_)))
    }

    pub fn get_error(&self) -> Option<String> {
        match self.inner.cell.get() {
            Some(Err(e)) => Some(e.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            loading: self.is_loading(),
            ready: self.is_ready(),
            error: self.get_error(),
        }
    }
}
