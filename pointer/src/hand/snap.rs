//! Snap resolver — pulls the cursor onto nearby interactive targets.
//!
//! Two-state machine with hysteresis: engage below `snap_threshold_px` from
//! a target's center, release only once the cursor is more than
//! `unsnap_threshold_px` from the stored snap point.
//!
//! Boundaries: engaging is strict (`d < 50` snaps, `d == 50` does not);
//! releasing is strict too (`d > 100` releases, `d == 100` stays snapped).

use tracing::debug;

use crate::geometry::Point;
use crate::ui::InteractiveTarget;

/// Distance from a target center below which the cursor snaps on.
pub const SNAP_THRESHOLD_PX: f32 = 50.0;
/// Distance from the snap point above which the cursor is released.
pub const UNSNAP_THRESHOLD_PX: f32 = 100.0;

/// Configuration for snap hysteresis.
#[derive(Debug, Clone)]
pub struct SnapConfig {
    pub snap_threshold_px: f32,
    pub unsnap_threshold_px: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: SNAP_THRESHOLD_PX,
            unsnap_threshold_px: UNSNAP_THRESHOLD_PX,
        }
    }
}

/// Snap state machine.
///
/// `Snapped.target` may go stale if the element moves or is removed; the
/// lock still holds until the cursor leaves the unsnap radius.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SnapState {
    #[default]
    Free,
    Snapped { target: u64, point: Point },
}

impl SnapState {
    pub fn is_snapped(&self) -> bool {
        matches!(self, Self::Snapped { .. })
    }

    pub fn target_id(&self) -> Option<u64> {
        match self {
            Self::Snapped { target, .. } => Some(*target),
            Self::Free => None,
        }
    }

    pub fn snap_point(&self) -> Option<Point> {
        match self {
            Self::Snapped { point, .. } => Some(*point),
            Self::Free => None,
        }
    }
}

/// What changed during one resolve step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapTransition {
    Engaged { target: u64 },
    Released { target: u64 },
}

/// Result of one resolve step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOutcome {
    /// Cursor point after snapping.
    pub point: Point,
    pub state: SnapState,
    pub transition: Option<SnapTransition>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapResolver {
    pub config: SnapConfig,
}

impl SnapResolver {
    pub fn new(config: SnapConfig) -> Self {
        Self { config }
    }

    /// Nearest target by center distance. Ties keep the first in list order.
    fn nearest(point: Point, targets: &[InteractiveTarget]) -> Option<(&InteractiveTarget, f32)> {
        let mut best: Option<(&InteractiveTarget, f32)> = None;
        for target in targets {
            let d = point.distance(target.bounds.center());
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((target, d));
            }
        }
        best
    }

    /// Advance the snap state machine for this frame's smoothed point.
    ///
    /// `targets` must be the live set queried this frame.
    pub fn resolve(
        &self,
        smoothed: Point,
        state: SnapState,
        targets: &[InteractiveTarget],
    ) -> SnapOutcome {
        match state {
            SnapState::Free => {
                if let Some((target, d)) = Self::nearest(smoothed, targets) {
                    if d < self.config.snap_threshold_px {
                        let center = target.bounds.center();
                        debug!("Snap engaged: element {} at {:.1}px", target.id, d);
                        return SnapOutcome {
                            point: center,
                            state: SnapState::Snapped {
                                target: target.id,
                                point: center,
                            },
                            transition: Some(SnapTransition::Engaged { target: target.id }),
                        };
                    }
                }
                SnapOutcome {
                    point: smoothed,
                    state: SnapState::Free,
                    transition: None,
                }
            }
            SnapState::Snapped { target, point } => {
                let d = smoothed.distance(point);
                if d > self.config.unsnap_threshold_px {
                    debug!("Snap released: element {} at {:.1}px", target, d);
                    SnapOutcome {
                        point: smoothed,
                        state: SnapState::Free,
                        transition: Some(SnapTransition::Released { target }),
                    }
                } else {
                    SnapOutcome {
                        point,
                        state,
                        transition: None,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    /// Target 1 centered at (100, 100).
    fn make_targets() -> Vec<InteractiveTarget> {
        vec![InteractiveTarget {
            id: 1,
            bounds: Rect::new(80.0, 90.0, 40.0, 20.0),
        }]
    }

    fn snapped_on_first() -> SnapState {
        SnapState::Snapped {
            target: 1,
            point: Point::new(100.0, 100.0),
        }
    }

    #[test]
    fn test_engage_inside_threshold() {
        let resolver = SnapResolver::default();
        let out = resolver.resolve(Point::new(149.0, 100.0), SnapState::Free, &make_targets());
        assert_eq!(out.state, snapped_on_first());
        assert_eq!(out.point, Point::new(100.0, 100.0));
        assert_eq!(out.transition, Some(SnapTransition::Engaged { target: 1 }));
    }

    #[test]
    fn test_no_engage_outside_threshold() {
        let resolver = SnapResolver::default();
        let p = Point::new(151.0, 100.0);
        let out = resolver.resolve(p, SnapState::Free, &make_targets());
        assert_eq!(out.state, SnapState::Free);
        assert_eq!(out.point, p);
        assert!(out.transition.is_none());
    }

    #[test]
    fn test_engage_boundary_is_exclusive() {
        let resolver = SnapResolver::default();
        let out = resolver.resolve(Point::new(150.0, 100.0), SnapState::Free, &make_targets());
        assert!(!out.state.is_snapped());
    }

    #[test]
    fn test_hold_inside_unsnap_radius() {
        let resolver = SnapResolver::default();
        let out = resolver.resolve(Point::new(100.0, 199.0), snapped_on_first(), &make_targets());
        assert_eq!(out.state, snapped_on_first());
        assert_eq!(out.point, Point::new(100.0, 100.0));
        assert!(out.transition.is_none());
    }

    #[test]
    fn test_release_boundary_is_inclusive_hold() {
        let resolver = SnapResolver::default();
        let out = resolver.resolve(Point::new(200.0, 100.0), snapped_on_first(), &make_targets());
        assert!(out.state.is_snapped());
    }

    #[test]
    fn test_release_outside_unsnap_radius() {
        let resolver = SnapResolver::default();
        let p = Point::new(100.0, 201.0);
        let out = resolver.resolve(p, snapped_on_first(), &make_targets());
        assert_eq!(out.state, SnapState::Free);
        assert_eq!(out.point, p);
        assert_eq!(out.transition, Some(SnapTransition::Released { target: 1 }));
    }

    #[test]
    fn test_nearest_target_wins() {
        let resolver = SnapResolver::default();
        let targets = vec![
            InteractiveTarget {
                id: 1,
                bounds: Rect::new(0.0, 0.0, 20.0, 20.0),
            },
            InteractiveTarget {
                id: 2,
                bounds: Rect::new(30.0, 0.0, 20.0, 20.0),
            },
        ];
        let out = resolver.resolve(Point::new(35.0, 10.0), SnapState::Free, &targets);
        assert_eq!(out.state.target_id(), Some(2));
    }

    #[test]
    fn test_stale_target_stays_locked() {
        let resolver = SnapResolver::default();
        let out = resolver.resolve(Point::new(110.0, 100.0), snapped_on_first(), &[]);
        assert_eq!(out.state, snapped_on_first());
    }

    #[test]
    fn test_no_targets_stays_free() {
        let resolver = SnapResolver::default();
        let out = resolver.resolve(Point::new(10.0, 10.0), SnapState::Free, &[]);
        assert_eq!(out.state, SnapState::Free);
    }
}
