use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Hidden,
    Shown,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PresentationState {
    pub visibility: Visibility,
    pub text: String,
    /// Sequence number of the request whose outcome is on screen.
    pub last_committed: Option<u64>,
}

/// One animation request for the results panel.
///
/// A new transition replaces the running one rather than queueing behind it.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Transition {
    #[serde(rename_all = "camelCase")]
    Show {
        text: String,
        offset_from: f32,
        offset_to: f32,
        duration: f32,
        delay: f32,
        damping: f32,
        initial_velocity: f32,
        /// Spring progress (0 at rest, 1 at target) sampled evenly over `duration`.
        keyframes: Vec<f32>,
        /// Opacity resumes from its on-screen value. The offset always
        /// restarts at `offset_from`.
        fade_from_current: bool,
    },
    #[serde(rename_all = "camelCase")]
    Hide { duration: f32 },
}

impl Transition {
    pub fn is_show(&self) -> bool {
        matches!(self, Transition::Show { .. })
    }
}
