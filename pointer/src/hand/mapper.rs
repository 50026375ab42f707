//! Camera-to-screen coordinate mapping with low-pass smoothing.
//!
//! The index fingertip is center-cropped by `sensitivity`, clamped to the
//! unit square, scaled to the viewport and then fed through a single-pole
//! exponential filter.

use crate::geometry::{Point, Viewport};

use super::landmarks::{HandLandmark, LandmarkFrame};

/// Fixed per-frame lerp factor.
pub const LERP_FACTOR: f32 = 0.2;

/// Sensitivity range the host settings expose. The mapper does not enforce it.
pub const SENSITIVITY_MIN: f32 = 1.0;
pub const SENSITIVITY_MAX: f32 = 5.0;

/// How the smoothed point chases the raw point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothingMode {
    /// Move `factor` of the remaining distance once per landmark frame,
    /// regardless of elapsed time.
    PerFrame { factor: f32 },
    /// `factor = 1 - exp(-dt / tau)`, so responsiveness is independent of
    /// detector frame rate. `dt` must span the whole gap since the previous
    /// filtered frame, including ticks without a detector result.
    TimeScaled { tau_ms: f64 },
}

impl SmoothingMode {
    /// Effective lerp factor for a frame `dt_ms` after the previous one.
    pub fn factor(&self, dt_ms: f64) -> f32 {
        match *self {
            Self::PerFrame { factor } => factor,
            Self::TimeScaled { tau_ms } => {
                if dt_ms <= 0.0 || tau_ms <= 0.0 {
                    return 0.0;
                }
                (1.0 - (-dt_ms / tau_ms).exp()) as f32
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerFrame { .. } => "per-frame",
            Self::TimeScaled { .. } => "time-scaled",
        }
    }
}

/// Configuration for the coordinate mapper.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    pub smoothing: SmoothingMode,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingMode::PerFrame {
                factor: LERP_FACTOR,
            },
        }
    }
}

/// Cursor position before and after smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorState {
    /// This frame's unsmoothed screen point.
    pub raw: Point,
    /// Filter output; persists across frames.
    pub smoothed: Point,
    /// Sensitivity used for the last mapping.
    pub sensitivity: f32,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            raw: Point::default(),
            smoothed: Point::default(),
            sensitivity: SENSITIVITY_MIN,
        }
    }
}

/// Center-crop one normalized axis and clamp it to `[0,1]`.
///
/// `sensitivity` is applied as-is; keeping it in range is the caller's job.
pub fn crop_axis(l: f32, sensitivity: f32) -> f32 {
    ((l - 0.5) * sensitivity + 0.5).clamp(0.0, 1.0)
}

/// Stateless mapper; the previous cursor is passed in and a new one returned.
#[derive(Debug, Clone, Default)]
pub struct CoordinateMapper {
    pub config: MapperConfig,
}

impl CoordinateMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Map one landmark frame into screen space.
    ///
    /// With no frame the previous cursor is returned untouched, so the
    /// pointer holds still while tracking is lost.
    pub fn map(
        &self,
        frame: Option<&LandmarkFrame>,
        viewport: Viewport,
        sensitivity: f32,
        previous: CursorState,
        dt_ms: f64,
    ) -> CursorState {
        let Some(frame) = frame else {
            return previous;
        };

        let tip = frame.point(HandLandmark::IndexTip);
        let raw = Point::new(
            crop_axis(tip.x, sensitivity) * viewport.width,
            crop_axis(tip.y, sensitivity) * viewport.height,
        );

        let t = self.config.smoothing.factor(dt_ms);
        CursorState {
            raw,
            smoothed: previous.smoothed.lerp(raw, t),
            sensitivity,
        }
    }
}
