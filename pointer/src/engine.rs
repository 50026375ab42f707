//! Pointer engine — the per-frame pipeline tying the hand components together.
//!
//! Runs once per display frame, in strict order:
//! mapper → snap resolver → gesture classifier → drag controller.
//! All state lives in one owned struct updated imperatively; the renderer
//! reads throttled [`PointerSnapshot`]s and the panel layout.

use tracing::{debug, info};

use crate::geometry::{Point, Viewport};
use crate::hand::drag::{DragController, DragState, DragTransition};
use crate::hand::gesture::{GestureClassifier, GestureConfig, GestureEvent, GestureState, GestureType};
use crate::hand::landmarks::LandmarkFrame;
use crate::hand::mapper::{CoordinateMapper, CursorState, MapperConfig, SmoothingMode};
use crate::hand::snap::{SnapConfig, SnapResolver, SnapState, SnapTransition};
use crate::layout::{PanelId, PanelLayout};
use crate::publish::{PointerSnapshot, PublishConfig, PublishThrottle};
use crate::ui::{click_target, DraggableRegion, InteractiveTarget, UiHost};

// ── Config ─────────────────────────────────────────────────

/// Tunables for every engine component.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub mapper: MapperConfig,
    pub snap: SnapConfig,
    pub gesture: GestureConfig,
    pub publish: PublishConfig,
}

// ── Input ──────────────────────────────────────────────────

/// Everything the host supplies for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Detector result, or `None` when no hand was found this frame.
    pub landmarks: Option<&'a LandmarkFrame>,
    pub viewport: Viewport,
    /// Expected in `[1.0, 5.0]`; not clamped here.
    pub sensitivity: f32,
    /// Live snap candidates, queried fresh this frame.
    pub targets: &'a [InteractiveTarget],
    /// Live panel drag handles, queried fresh this frame.
    pub regions: &'a [DraggableRegion],
    pub layout_edit: bool,
    /// Time since the previous frame.
    pub dt_ms: f64,
}

// ── Events ─────────────────────────────────────────────────

/// Side effects and transitions produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    TrackingLost,
    TrackingResumed,
    SnapEngaged { target: u64, x: f32, y: f32 },
    SnapReleased { target: u64 },
    GestureStarted(GestureType),
    GestureReleased(GestureType),
    Click { target: u64, x: f32, y: f32 },
    DragStarted { panel: PanelId },
    PanelMoved { panel: PanelId, dx: f32, dy: f32 },
    DragEnded { panel: PanelId },
}

impl PointerEvent {
    /// Convert the event to an IPC s-expression.
    pub fn to_sexp(&self) -> String {
        match self {
            Self::TrackingLost => "(:type :event :event :tracking-lost)".to_string(),
            Self::TrackingResumed => "(:type :event :event :tracking-resumed)".to_string(),
            Self::SnapEngaged { target, x, y } => format!(
                "(:type :event :event :snap-engaged :element {} :x {:.0} :y {:.0})",
                target, x, y
            ),
            Self::SnapReleased { target } => {
                format!("(:type :event :event :snap-released :element {})", target)
            }
            Self::GestureStarted(g) => {
                format!("(:type :event :event :gesture-started :gesture :{})", g.as_str())
            }
            Self::GestureReleased(g) => {
                format!("(:type :event :event :gesture-released :gesture :{})", g.as_str())
            }
            Self::Click { target, x, y } => format!(
                "(:type :event :event :click :element {} :x {:.0} :y {:.0})",
                target, x, y
            ),
            Self::DragStarted { panel } => {
                format!("(:type :event :event :drag-started :panel :{})", panel.as_str())
            }
            Self::PanelMoved { panel, dx, dy } => format!(
                "(:type :event :event :panel-moved :panel :{} :dx {:.1} :dy {:.1})",
                panel.as_str(),
                dx,
                dy
            ),
            Self::DragEnded { panel } => {
                format!("(:type :event :event :drag-ended :panel :{})", panel.as_str())
            }
        }
    }
}

impl From<GestureEvent> for PointerEvent {
    fn from(e: GestureEvent) -> Self {
        match e {
            GestureEvent::Started(g) => Self::GestureStarted(g),
            GestureEvent::Released(g) => Self::GestureReleased(g),
        }
    }
}

/// Revert a snap highlight, tolerating an element that has already gone.
fn clear_highlight<H: UiHost + ?Sized>(host: &mut H, target: u64) {
    if host.element_exists(target) {
        host.set_highlight(target, false);
    } else {
        debug!("Snap target {} gone before highlight cleared", target);
    }
}

// ── Engine ─────────────────────────────────────────────────

/// Central gesture-pointer state.
pub struct PointerEngine {
    mapper: CoordinateMapper,
    resolver: SnapResolver,
    classifier: GestureClassifier,
    drag_controller: DragController,
    throttle: PublishThrottle,

    cursor: CursorState,
    /// Post-snap cursor point.
    adjusted: Point,
    snap: SnapState,
    gesture: GestureState,
    drag: DragState,
    layout: PanelLayout,

    /// Whether the last frame carried landmarks.
    tracking: bool,
    /// Tick time elapsed since the last frame that reached the filter.
    since_filtered_ms: f64,
    /// Capture time of the last frame that reached the filter.
    last_filtered_ts: Option<f64>,
    frames: u64,
    clicks: u64,
}

impl PointerEngine {
    pub fn new(config: EngineConfig, viewport: Viewport) -> Self {
        info!(
            "Pointer engine initialized ({:.0}x{:.0}, smoothing {})",
            viewport.width,
            viewport.height,
            config.mapper.smoothing.as_str()
        );
        Self {
            mapper: CoordinateMapper::new(config.mapper),
            resolver: SnapResolver::new(config.snap),
            classifier: GestureClassifier::new(config.gesture),
            drag_controller: DragController,
            throttle: PublishThrottle::new(config.publish),
            cursor: CursorState::default(),
            adjusted: Point::default(),
            snap: SnapState::Free,
            gesture: GestureState::default(),
            drag: DragState::Idle,
            layout: PanelLayout::with_defaults(viewport),
            tracking: false,
            since_filtered_ms: 0.0,
            last_filtered_ts: None,
            frames: 0,
            clicks: 0,
        }
    }

    /// Run one frame of the pipeline and return what happened.
    pub fn tick<H: UiHost + ?Sized>(
        &mut self,
        input: &FrameInput<'_>,
        host: &mut H,
    ) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        self.frames += 1;

        let has_hand = input.landmarks.is_some();
        match (self.tracking, has_hand) {
            (true, false) => {
                debug!("Hand tracking lost at frame {}", self.frames);
                events.push(PointerEvent::TrackingLost);
            }
            (false, true) => events.push(PointerEvent::TrackingResumed),
            _ => {}
        }
        self.tracking = has_hand;

        // ── Step 1: Map ──
        let filter_dt = self.filter_dt(input);
        self.cursor = self.mapper.map(
            input.landmarks,
            input.viewport,
            input.sensitivity,
            self.cursor,
            filter_dt,
        );

        // ── Step 2: Snap ──
        let previous_point = self.adjusted;
        let outcome = self
            .resolver
            .resolve(self.cursor.smoothed, self.snap, input.targets);
        match outcome.transition {
            Some(SnapTransition::Engaged { target }) => {
                if host.element_exists(target) {
                    host.set_highlight(target, true);
                }
                events.push(PointerEvent::SnapEngaged {
                    target,
                    x: outcome.point.x,
                    y: outcome.point.y,
                });
            }
            Some(SnapTransition::Released { target }) => {
                clear_highlight(host, target);
                events.push(PointerEvent::SnapReleased { target });
            }
            None => {}
        }
        self.snap = outcome.state;
        self.adjusted = outcome.point;

        // ── Step 3: Classify ──
        let previous_gesture = self.gesture;
        self.gesture = self.classifier.classify(input.landmarks, &previous_gesture);
        events.extend(
            self.gesture
                .transitions(&previous_gesture)
                .into_iter()
                .map(PointerEvent::from),
        );
        if self.gesture.click_edge() {
            match click_target(&*host, self.adjusted) {
                Some(target) => {
                    host.dispatch_click(target, self.adjusted);
                    self.clicks += 1;
                    events.push(PointerEvent::Click {
                        target,
                        x: self.adjusted.x,
                        y: self.adjusted.y,
                    });
                }
                None => debug!(
                    "Pinch click at ({:.0}, {:.0}) hit nothing",
                    self.adjusted.x, self.adjusted.y
                ),
            }
        }

        // ── Step 4: Drag ──
        let (drag, transition) = self.drag_controller.step(
            &self.gesture,
            self.adjusted,
            previous_point,
            self.drag,
            input.regions,
            &mut self.layout,
            input.layout_edit,
        );
        self.drag = drag;
        match transition {
            Some(DragTransition::Started { panel }) => {
                events.push(PointerEvent::DragStarted { panel })
            }
            Some(DragTransition::Moved { panel, dx, dy }) => {
                events.push(PointerEvent::PanelMoved { panel, dx, dy })
            }
            Some(DragTransition::Ended { panel }) => {
                events.push(PointerEvent::DragEnded { panel })
            }
            None => {}
        }

        events
    }

    /// Time the smoothing filter should advance by for this tick.
    ///
    /// Measured between frames that actually carry landmarks: capture
    /// timestamps when they advance, otherwise the summed tick `dt`s,
    /// including ticks where the detector had no result.
    fn filter_dt(&mut self, input: &FrameInput<'_>) -> f64 {
        let dt = if input.dt_ms.is_finite() {
            input.dt_ms.max(0.0)
        } else {
            0.0
        };
        let elapsed = self.since_filtered_ms + dt;

        let Some(frame) = input.landmarks else {
            self.since_filtered_ms = elapsed;
            return 0.0;
        };

        let filter_dt = match self.last_filtered_ts {
            Some(last) if frame.timestamp_ms.is_finite() && frame.timestamp_ms > last => {
                frame.timestamp_ms - last
            }
            _ => elapsed,
        };
        self.since_filtered_ms = 0.0;
        if frame.timestamp_ms.is_finite() {
            self.last_filtered_ts = Some(frame.timestamp_ms);
        }
        filter_dt
    }

    /// Stop hand tracking: clear gestures, drop any drag claim and the snap
    /// lock. The cursor keeps its last position.
    pub fn stop_tracking<H: UiHost + ?Sized>(&mut self, host: &mut H) -> Vec<PointerEvent> {
        let mut events = Vec::new();

        if let Some(target) = self.snap.target_id() {
            clear_highlight(host, target);
            events.push(PointerEvent::SnapReleased { target });
        }
        self.snap = SnapState::Free;
        self.adjusted = self.cursor.smoothed;

        let released = GestureState::default();
        events.extend(
            released
                .transitions(&self.gesture)
                .into_iter()
                .map(PointerEvent::from),
        );
        self.gesture = released;

        if let Some(panel) = self.drag.active_panel() {
            events.push(PointerEvent::DragEnded { panel });
        }
        self.drag = DragState::Idle;

        if self.tracking {
            events.push(PointerEvent::TrackingLost);
        }
        self.tracking = false;

        info!("Hand tracking stopped");
        events
    }

    /// Window resized: re-center the centered panels.
    pub fn resize(&mut self, viewport: Viewport) {
        self.layout.recenter(viewport);
    }

    pub fn snapshot(&self) -> PointerSnapshot {
        PointerSnapshot {
            cursor: self.adjusted,
            pinched: self.gesture.is_pinching,
            snapped: self.snap.target_id(),
            dragging: self.drag.active_panel(),
        }
    }

    /// Offer this tick's snapshot to the renderer, subject to the rate cap.
    pub fn publish(&mut self, dt_ms: f64) -> Option<PointerSnapshot> {
        let snapshot = self.snapshot();
        self.throttle.offer(snapshot, dt_ms)
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn adjusted_point(&self) -> Point {
        self.adjusted
    }

    pub fn snap_state(&self) -> SnapState {
        self.snap
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Switch the cursor filter. Takes effect on the next frame.
    pub fn set_smoothing(&mut self, mode: SmoothingMode) {
        if self.mapper.config.smoothing != mode {
            info!("Smoothing: {} -> {}", self.mapper.config.smoothing.as_str(), mode.as_str());
            self.mapper.config.smoothing = mode;
        }
    }

    pub fn smoothing(&self) -> SmoothingMode {
        self.mapper.config.smoothing
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        let snap = match self.snap {
            SnapState::Free => "nil".to_string(),
            SnapState::Snapped { target, point } => {
                format!("(:element {} :x {:.1} :y {:.1})", target, point.x, point.y)
            }
        };
        format!(
            "(:tracking {} :cursor (:x {:.1} :y {:.1}) :raw (:x {:.1} :y {:.1}) :sensitivity {:.2} :smoothing {} :snap {} :gesture {} :drag {} :frames {} :clicks {} :publish {})",
            if self.tracking { "t" } else { "nil" },
            self.adjusted.x,
            self.adjusted.y,
            self.cursor.raw.x,
            self.cursor.raw.y,
            self.cursor.sensitivity,
            self.mapper.config.smoothing.as_str(),
            snap,
            self.gesture.status_sexp(),
            self.drag.as_sexp(),
            self.frames,
            self.clicks,
            self.throttle.status_sexp(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
