//! Throttled hand-off of pointer state to the rendering layer.
//!
//! The engine updates every tick; the renderer only needs a coarse view.
//! Snapshots are published at most `max_hz` times per second of frame
//! time, except that a change in the pinch/snap/drag flags is always
//! published immediately so visual feedback never lags an action.

use crate::geometry::Point;
use crate::layout::PanelId;

/// Default cap on snapshots per second.
pub const DEFAULT_PUBLISH_HZ: f64 = 30.0;

/// Configuration for publish throttling.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Maximum snapshots per second. Zero or negative disables throttling.
    pub max_hz: f64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_hz: DEFAULT_PUBLISH_HZ,
        }
    }
}

impl PublishConfig {
    fn interval_ms(&self) -> f64 {
        if self.max_hz > 0.0 {
            1000.0 / self.max_hz
        } else {
            0.0
        }
    }
}

/// Render-facing pointer state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSnapshot {
    /// Post-snap cursor position.
    pub cursor: Point,
    /// Draw the "pinched" cursor variant.
    pub pinched: bool,
    pub snapped: Option<u64>,
    pub dragging: Option<PanelId>,
}

impl PointerSnapshot {
    fn flags_differ(&self, other: &PointerSnapshot) -> bool {
        self.pinched != other.pinched
            || self.snapped != other.snapped
            || self.dragging != other.dragging
    }
}

/// Rate limiter for [`PointerSnapshot`]s.
#[derive(Debug, Default)]
pub struct PublishThrottle {
    pub config: PublishConfig,
    since_last_ms: f64,
    last: Option<PointerSnapshot>,
    /// Snapshots handed to the renderer.
    pub published: u64,
    /// Snapshots dropped by the rate cap.
    pub suppressed: u64,
}

impl PublishThrottle {
    pub fn new(config: PublishConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Offer this tick's snapshot. Returns it if it should be published.
    pub fn offer(&mut self, snapshot: PointerSnapshot, dt_ms: f64) -> Option<PointerSnapshot> {
        self.since_last_ms += dt_ms.max(0.0);

        let flags_changed = self
            .last
            .map_or(true, |last| last.flags_differ(&snapshot));

        if flags_changed || self.since_last_ms >= self.config.interval_ms() {
            self.since_last_ms = 0.0;
            self.last = Some(snapshot);
            self.published += 1;
            Some(snapshot)
        } else {
            self.suppressed += 1;
            None
        }
    }

    /// Most recently published snapshot.
    pub fn last(&self) -> Option<PointerSnapshot> {
        self.last
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:max-hz {:.0} :published {} :suppressed {})",
            self.config.max_hz, self.published, self.suppressed
        )
    }
}
