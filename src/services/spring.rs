//! Damped spring used for the results panel's show transition.
//!
//! Progress runs from 0 (resting offset) to 1 (visible offset). The natural
//! frequency is chosen so the oscillation envelope has decayed to 0.1% by the
//! end of `duration`, the same contract as a duration-driven spring animation.

const SETTLE_RATIO: f32 = 1000.0;
const MIN_DAMPING: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub duration: f32,
    /// Damping ratio; below 1 the motion overshoots.
    pub damping: f32,
    /// Initial velocity as a fraction of the total distance per second.
    pub initial_velocity: f32,
}

impl Spring {
    fn natural_frequency(&self, damping: f32) -> f32 {
        SETTLE_RATIO.ln() / (damping.min(1.0) * self.duration.max(f32::EPSILON))
    }

    /// Progress at time `t` seconds after the spring starts.
    pub fn progress(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        let zeta = self.damping.max(MIN_DAMPING);
        let w0 = self.natural_frequency(zeta);
        let v0 = self.initial_velocity;

        // Remaining distance y(t) = 1 - progress, with y(0) = 1, y'(0) = -v0.
        let remaining = if zeta < 1.0 {
            let wd = w0 * (1.0 - zeta * zeta).sqrt();
            let b = (zeta * w0 - v0) / wd;
            (-zeta * w0 * t).exp() * ((wd * t).cos() + b * (wd * t).sin())
        } else {
            (-w0 * t).exp() * (1.0 + (w0 - v0) * t)
        };
        1.0 - remaining
    }

    /// `count` evenly spaced samples over `[0, duration]`; the last is exactly 1.
    pub fn keyframes(&self, count: usize) -> Vec<f32> {
        let count = count.max(2);
        let step = self.duration / (count - 1) as f32;
        let mut frames: Vec<f32> = (0..count).map(|i| self.progress(i as f32 * step)).collect();
        if let Some(last) = frames.last_mut() {
            *last = 1.0;
        }
        frames
    }
}
