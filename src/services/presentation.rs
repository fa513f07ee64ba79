use crate::config::{CommitPolicy, PresentationConfig};
use crate::error::AppError;
use crate::models::classify_types::ClassificationOutcome;
use crate::models::presentation_types::{PresentationState, Transition, Visibility};
use crate::services::spring::Spring;
use serde::Serialize;
use std::future::Future;
use tauri::{AppHandle, Emitter};
use tokio::sync::{mpsc, oneshot};

pub const RESULTS_PANEL_EVENT: &str = "results-panel";

/// Where transitions end up. Called only from the presenter task.
pub trait DisplaySurface: Send + 'static {
    fn apply(&self, transition: &Transition, state: &PresentationState);
}

#[derive(Serialize, Clone)]
struct PanelEvent<'a> {
    transition: &'a Transition,
    state: &'a PresentationState,
}

/// Forwards transitions to the webview as `results-panel` events.
pub struct WebviewSurface {
    app: AppHandle,
}

impl WebviewSurface {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl DisplaySurface for WebviewSurface {
    fn apply(&self, transition: &Transition, state: &PresentationState) {
        tracing::debug!(show = transition.is_show(), text = %state.text, "results panel transition");
        if let Err(e) = self.app.emit(RESULTS_PANEL_EVENT, PanelEvent { transition, state }) {
            tracing::warn!("failed to emit {}: {}", RESULTS_PANEL_EVENT, e);
        }
    }
}

/// One line of panel text for an outcome.
pub fn format_outcome(outcome: &ClassificationOutcome) -> String {
    match outcome {
        ClassificationOutcome::Ranked { .. } => match outcome.top() {
            Some(top) => {
                let percent = (f64::from(top.confidence) * 1000.0).round() / 10.0;
                format!("{} {:.1}%", top.class_name, percent)
            }
            None => "Nothing found".to_string(),
        },
        ClassificationOutcome::Empty => "Nothing found".to_string(),
        ClassificationOutcome::Failed { message } => format!("Error: {}", message),
        ClassificationOutcome::Unexpected => "???".to_string(),
    }
}

/// Owns the results panel state. Not `Sync`: it lives inside the presenter task.
pub struct PresentationController<S: DisplaySurface> {
    state: PresentationState,
    config: PresentationConfig,
    policy: CommitPolicy,
    surface: S,
}

impl<S: DisplaySurface> PresentationController<S> {
    pub fn new(config: PresentationConfig, policy: CommitPolicy, surface: S) -> Self {
        Self {
            state: PresentationState::default(),
            config,
            policy,
            surface,
        }
    }

    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    /// A picker is about to open: fade the panel out, whatever it shows.
    pub fn picker_presented(&mut self) -> Transition {
        self.state.visibility = Visibility::Hidden;
        let transition = Transition::Hide {
            duration: self.config.hide_duration,
        };
        self.surface.apply(&transition, &self.state);
        transition
    }

    /// Shows an outcome, or returns `None` if the commit policy drops it.
    pub fn present(&mut self, seq: u64, outcome: &ClassificationOutcome) -> Option<Transition> {
        if self.policy == CommitPolicy::LatestSubmitted {
            if let Some(current) = self.state.last_committed {
                if seq < current {
                    tracing::debug!(seq, current, "dropping stale classification outcome");
                    return None;
                }
            }
        }

        self.state.text = format_outcome(outcome);
        self.state.visibility = Visibility::Shown;
        self.state.last_committed = Some(seq);

        let spring = Spring {
            duration: self.config.show_duration,
            damping: self.config.spring_damping,
            initial_velocity: self.config.spring_velocity,
        };
        let transition = Transition::Show {
            text: self.state.text.clone(),
            offset_from: self.config.offset_hidden,
            offset_to: self.config.offset_visible,
            duration: self.config.show_duration,
            delay: self.config.show_delay,
            damping: self.config.spring_damping,
            initial_velocity: self.config.spring_velocity,
            keyframes: spring.keyframes(self.config.keyframes),
            fade_from_current: true,
        };
        self.surface.apply(&transition, &self.state);
        Some(transition)
    }

    /// Splits the controller into a cloneable handle and the task that owns it.
    /// The task ends once every handle is dropped.
    pub fn into_task(self) -> (PresenterHandle, impl Future<Output = ()> + Send) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PresenterHandle { tx }, self.run(rx))
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PresenterMessage>) {
        while let Some(message) = rx.recv().await {
            match message {
                PresenterMessage::PickerPresented => {
                    self.picker_presented();
                }
                PresenterMessage::Outcome { seq, outcome } => {
                    self.present(seq, &outcome);
                }
                PresenterMessage::Snapshot(reply) => {
                    let _ = reply.send(self.state().clone());
                }
            }
        }
    }
}

enum PresenterMessage {
    PickerPresented,
    Outcome {
        seq: u64,
        outcome: ClassificationOutcome,
    },
    Snapshot(oneshot::Sender<PresentationState>),
}

/// Messages are handled strictly in the order they are sent.
#[derive(Clone)]
pub struct PresenterHandle {
    tx: mpsc::UnboundedSender<PresenterMessage>,
}

impl PresenterHandle {
    pub fn picker_presented(&self) {
        self.send(PresenterMessage::PickerPresented);
    }

    pub fn present(&self, seq: u64, outcome: ClassificationOutcome) {
        self.send(PresenterMessage::Outcome { seq, outcome });
    }

    pub async fn snapshot(&self) -> Result<PresentationState, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(PresenterMessage::Snapshot(reply));
        rx.await.map_err(|_| AppError::from("Presenter has stopped"))
    }

    fn send(&self, message: PresenterMessage) {
        if self.tx.send(message).is_err() {
            tracing::warn!("presenter has stopped; dropping panel update");
        }
    }
}
