//! Gesture classification from hand landmarks.
//!
//! Derives two per-frame flags, pinch (thumb tip near index tip) and fist
//! (all four non-thumb fingers folded), and edge-detects pinch-down for
//! click synthesis. State is fully recomputed every frame; the only memory
//! is the previous frame's pinch flag.

use tracing::debug;

use super::landmarks::{Finger, HandLandmark, LandmarkFrame};

/// Maximum normalized thumb-tip to index-tip distance for a pinch.
pub const PINCH_THRESHOLD: f32 = 0.05;

// ── Gesture types ──────────────────────────────────────────

/// Recognized gesture types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureType {
    /// Thumb and index fingertips close together. Clicks.
    Pinch,
    /// Four fingers folded towards the wrist. Drags.
    Fist,
}

impl GestureType {
    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pinch => "pinch",
            Self::Fist => "fist",
        }
    }
}

/// Gesture edge between two consecutive frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Started(GestureType),
    Released(GestureType),
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for gesture thresholds.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Normalized camera-space distance below which thumb and index pinch.
    pub pinch_threshold: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: PINCH_THRESHOLD,
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Per-frame gesture flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureState {
    pub is_pinching: bool,
    /// Previous frame's `is_pinching`.
    pub was_pinching: bool,
    pub is_fist: bool,
}

impl GestureState {
    /// Rising edge of a pinch: fires once per engagement.
    pub fn click_edge(&self) -> bool {
        self.is_pinching && !self.was_pinching
    }

    /// Edges from `previous` to `self`.
    pub fn transitions(&self, previous: &GestureState) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        for (gesture, was, is) in [
            (GestureType::Pinch, previous.is_pinching, self.is_pinching),
            (GestureType::Fist, previous.is_fist, self.is_fist),
        ] {
            match (was, is) {
                (false, true) => events.push(GestureEvent::Started(gesture)),
                (true, false) => events.push(GestureEvent::Released(gesture)),
                _ => {}
            }
        }
        events
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:pinching {} :fist {})",
            if self.is_pinching { "t" } else { "nil" },
            if self.is_fist { "t" } else { "nil" },
        )
    }
}

// ── Classifier ─────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    pub config: GestureConfig,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self { config }
    }

    /// Classify one frame. Lost tracking clears both gestures.
    pub fn classify(
        &self,
        frame: Option<&LandmarkFrame>,
        previous: &GestureState,
    ) -> GestureState {
        let Some(frame) = frame else {
            return GestureState {
                is_pinching: false,
                was_pinching: previous.is_pinching,
                is_fist: false,
            };
        };

        let next = GestureState {
            is_pinching: self.is_pinching(frame),
            was_pinching: previous.is_pinching,
            is_fist: is_fist(frame),
        };
        if next.click_edge() {
            debug!("Pinch engaged");
        }
        next
    }

    fn is_pinching(&self, frame: &LandmarkFrame) -> bool {
        frame.distance(HandLandmark::ThumbTip, HandLandmark::IndexTip) < self.config.pinch_threshold
    }
}

/// A finger is folded when its tip is nearer the wrist than its knuckle.
pub fn is_folded(frame: &LandmarkFrame, finger: Finger) -> bool {
    frame.distance(finger.tip(), HandLandmark::Wrist)
        < frame.distance(finger.knuckle(), HandLandmark::Wrist)
}

/// All four non-thumb fingers folded at once.
pub fn is_fist(frame: &LandmarkFrame) -> bool {
    Finger::ALL.iter().all(|f| is_folded(frame, *f))
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) fn make_pinch() -> LandmarkFrame {
    use super::landmarks::{make_open_hand, set_landmark};

    let mut frame = make_open_hand();
    set_landmark(&mut frame, HandLandmark::ThumbTip, 0.42, 0.31);
    frame
}

/// Fold every non-thumb finger: tips pulled between knuckle and wrist.
#[cfg(test)]
pub(crate) fn make_fist() -> LandmarkFrame {
    use super::landmarks::{make_open_hand, set_landmark};

    let mut frame = make_open_hand();
    for finger in Finger::ALL {
        let knuckle = frame.point(finger.knuckle());
        set_landmark(&mut frame, finger.tip(), knuckle.x, 0.7);
    }
    frame
}

// ── Tests ──────────────────────────────────────────────────
