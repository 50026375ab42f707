//! Fist-drag controller for panel layout editing.
//!
//! While the fist is closed, the panel region under the cursor is claimed
//! and translated by the frame-to-frame cursor delta. Opening the fist (or
//! losing the hand, which the classifier reports as an open fist) releases
//! the claim. Only one panel can be held at a time.

use tracing::debug;

use crate::geometry::Point;
use crate::layout::{PanelId, PanelLayout};
use crate::ui::DraggableRegion;

use super::gesture::GestureState;

/// Drag state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { panel: PanelId },
}

impl DragState {
    pub fn active_panel(&self) -> Option<PanelId> {
        match self {
            Self::Dragging { panel } => Some(*panel),
            Self::Idle => None,
        }
    }

    pub fn as_sexp(&self) -> String {
        match self {
            Self::Idle => "nil".to_string(),
            Self::Dragging { panel } => format!(":{}", panel.as_str()),
        }
    }
}

/// What changed during one drag step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragTransition {
    Started { panel: PanelId },
    Moved { panel: PanelId, dx: f32, dy: f32 },
    Ended { panel: PanelId },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DragController;

impl DragController {
    /// First region containing `point`, by fixed panel priority.
    pub fn hit_test(point: Point, regions: &[DraggableRegion]) -> Option<PanelId> {
        regions
            .iter()
            .filter(|r| r.bounds.contains(point))
            .map(|r| r.panel)
            .min_by_key(|p| p.priority())
    }

    /// Advance one frame.
    ///
    /// `point` and `previous` are post-snap cursor points. The claim frame
    /// only records the target; movement starts on the following frame.
    /// With `edit_mode` off the controller is inert and drops any claim.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        gesture: &GestureState,
        point: Point,
        previous: Point,
        state: DragState,
        regions: &[DraggableRegion],
        layout: &mut PanelLayout,
        edit_mode: bool,
    ) -> (DragState, Option<DragTransition>) {
        match state {
            DragState::Dragging { panel } if !edit_mode || !gesture.is_fist => {
                debug!("Drag ended: {}", panel.as_str());
                (DragState::Idle, Some(DragTransition::Ended { panel }))
            }
            DragState::Dragging { panel } => {
                let (dx, dy) = point.delta(previous);
                if dx == 0.0 && dy == 0.0 {
                    return (state, None);
                }
                layout.translate(panel, dx, dy);
                (state, Some(DragTransition::Moved { panel, dx, dy }))
            }
            DragState::Idle if edit_mode && gesture.is_fist => {
                match Self::hit_test(point, regions) {
                    Some(panel) => {
                        debug!("Drag started: {}", panel.as_str());
                        (
                            DragState::Dragging { panel },
                            Some(DragTransition::Started { panel }),
                        )
                    }
                    None => (DragState::Idle, None),
                }
            }
            DragState::Idle => (DragState::Idle, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Viewport};

    fn fist(on: bool) -> GestureState {
        GestureState {
            is_fist: on,
            ..GestureState::default()
        }
    }

    fn make_regions() -> Vec<DraggableRegion> {
        vec![
            DraggableRegion {
                panel: PanelId::Chat,
                bounds: Rect::new(0.0, 0.0, 200.0, 200.0),
            },
            DraggableRegion {
                panel: PanelId::Video,
                bounds: Rect::new(100.0, 100.0, 200.0, 200.0),
            },
        ]
    }

    #[test]
    fn test_claim_on_fist() {
        let mut layout = PanelLayout::with_defaults(Viewport::default());
        let before = layout.clone();
        let (state, t) = DragController.step(
            &fist(true),
            Point::new(50.0, 50.0),
            Point::new(40.0, 40.0),
            DragState::Idle,
            &make_regions(),
            &mut layout,
            true,
        );
        assert_eq!(state, DragState::Dragging { panel: PanelId::Chat });
        assert_eq!(t, Some(DragTransition::Started { panel: PanelId::Chat }));
        assert_eq!(layout, before);
    }

    #[test]
    fn test_priority_on_overlap() {
        assert_eq!(
            DragController::hit_test(Point::new(150.0, 150.0), &make_regions()),
            Some(PanelId::Video)
        );
    }

    #[test]
    fn test_no_region_stays_idle() {
        let mut layout = PanelLayout::with_defaults(Viewport::default());
        let (state, t) = DragController.step(
            &fist(true),
            Point::new(900.0, 900.0),
            Point::new(900.0, 900.0),
            DragState::Idle,
            &make_regions(),
            &mut layout,
            true,
        );
        assert_eq!(state, DragState::Idle);
        assert!(t.is_none());
    }

    #[test]
    fn test_dragging_applies_delta() {
        let mut layout = PanelLayout::with_defaults(Viewport::default());
        let start = layout.position(PanelId::Chat);
        let held = DragState::Dragging { panel: PanelId::Chat };
        let (state, t) = DragController.step(
            &fist(true),
            Point::new(60.0, 45.0),
            Point::new(50.0, 50.0),
            held,
            &[],
            &mut layout,
            true,
        );
        assert_eq!(state, held);
        assert_eq!(
            t,
            Some(DragTransition::Moved {
                panel: PanelId::Chat,
                dx: 10.0,
                dy: -5.0
            })
        );
        assert_eq!(layout.position(PanelId::Chat), Point::new(start.x + 10.0, start.y - 5.0));
    }

    #[test]
    fn test_open_fist_releases() {
        let mut layout = PanelLayout::with_defaults(Viewport::default());
        let (state, t) = DragController.step(
            &fist(false),
            Point::new(60.0, 60.0),
            Point::new(50.0, 50.0),
            DragState::Dragging { panel: PanelId::Cad },
            &make_regions(),
            &mut layout,
            true,
        );
        assert_eq!(state, DragState::Idle);
        assert_eq!(t, Some(DragTransition::Ended { panel: PanelId::Cad }));
    }

    #[test]
    fn test_disabled_outside_edit_mode() {
        let mut layout = PanelLayout::with_defaults(Viewport::default());
        let (state, _) = DragController.step(
            &fist(true),
            Point::new(50.0, 50.0),
            Point::new(50.0, 50.0),
            DragState::Idle,
            &make_regions(),
            &mut layout,
            false,
        );
        assert_eq!(state, DragState::Idle);

        let (state, t) = DragController.step(
            &fist(true),
            Point::new(50.0, 50.0),
            Point::new(50.0, 50.0),
            DragState::Dragging { panel: PanelId::Chat },
            &make_regions(),
            &mut layout,
            false,
        );
        assert_eq!(state, DragState::Idle);
        assert_eq!(t, Some(DragTransition::Ended { panel: PanelId::Chat }));
    }

    #[test]
    fn test_drag_state_sexp() {
        assert_eq!(DragState::Idle.as_sexp(), "nil");
        assert_eq!(DragState::Dragging { panel: PanelId::Tools }.as_sexp(), ":tools");
    }
}
