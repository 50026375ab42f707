//! Hand landmark data as delivered by the external detector.
//!
//! Models the 21 normalized joints of a single tracked hand.
//! A frame is either present with all 21 points or absent entirely.

use tracing::debug;

use crate::geometry::Point;

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in detector index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Fingers ────────────────────────────────────────────────

/// The four non-thumb fingers, used for fist detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    pub fn tip(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexTip,
            Self::Middle => HandLandmark::MiddleTip,
            Self::Ring => HandLandmark::RingTip,
            Self::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// Base knuckle (MCP joint).
    pub fn knuckle(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexMcp,
            Self::Middle => HandLandmark::MiddleMcp,
            Self::Ring => HandLandmark::RingMcp,
            Self::Pinky => HandLandmark::PinkyMcp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
        }
    }
}

// ── Frame ──────────────────────────────────────────────────

/// One detector result: 21 normalized points in `[0,1]` camera space.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: [Point; LANDMARK_COUNT],
    /// Capture time in milliseconds (host clock).
    pub timestamp_ms: f64,
}

impl LandmarkFrame {
    pub fn new(points: [Point; LANDMARK_COUNT], timestamp_ms: f64) -> Self {
        Self {
            points,
            timestamp_ms,
        }
    }

    /// Build a frame from detector output.
    ///
    /// Returns `None` unless exactly 21 points are supplied; the caller
    /// treats that the same as "no hand this frame".
    pub fn from_points(points: &[Point], timestamp_ms: f64) -> Option<Self> {
        let points: [Point; LANDMARK_COUNT] = match points.try_into() {
            Ok(p) => p,
            Err(_) => {
                debug!(
                    "Landmark frame: expected {} points, got {}",
                    LANDMARK_COUNT,
                    points.len(),
                );
                return None;
            }
        };
        Some(Self::new(points, timestamp_ms))
    }

    /// Build a frame from a flat `[x0, y0, x1, y1, ...]` slice of 42 values.
    pub fn from_flat(flat: &[f32], timestamp_ms: f64) -> Option<Self> {
        if flat.len() != LANDMARK_COUNT * 2 {
            debug!(
                "Landmark frame: expected {} coordinates, got {}",
                LANDMARK_COUNT * 2,
                flat.len(),
            );
            return None;
        }
        let points: Vec<Point> = flat
            .chunks_exact(2)
            .map(|c| Point::new(c[0], c[1]))
            .collect();
        Self::from_points(&points, timestamp_ms)
    }

    pub fn point(&self, landmark: HandLandmark) -> Point {
        self.points[landmark.index()]
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }

    /// Euclidean distance between two landmarks in normalized camera space.
    pub fn distance(&self, a: HandLandmark, b: HandLandmark) -> f32 {
        self.point(a).distance(self.point(b))
    }
}

// ── Test helpers ───────────────────────────────────────────

/// An open hand, fingers pointing up, centered in the camera frame.
/// Thumb and index tips are far apart.
#[cfg(test)]
pub(crate) fn make_open_hand() -> LandmarkFrame {
    let mut points = [Point::new(0.5, 0.5); LANDMARK_COUNT];
    points[HandLandmark::Wrist.index()] = Point::new(0.5, 0.8);
    points[HandLandmark::ThumbTip.index()] = Point::new(0.3, 0.55);
    let columns = [
        (Finger::Index, 0.42),
        (Finger::Middle, 0.48),
        (Finger::Ring, 0.54),
        (Finger::Pinky, 0.60),
    ];
    for (finger, x) in columns {
        points[finger.knuckle().index()] = Point::new(x, 0.6);
        points[finger.tip().index()] = Point::new(x, 0.3);
    }
    LandmarkFrame::new(points, 0.0)
}

/// Override one landmark of a frame.
#[cfg(test)]
pub(crate) fn set_landmark(frame: &mut LandmarkFrame, landmark: HandLandmark, x: f32, y: f32) {
    frame.points[landmark.index()] = Point::new(x, y);
}

// ── Tests ──────────────────────────────────────────────────
