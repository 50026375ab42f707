//! Headless session — replay landmark traces against an in-memory UI.
//!
//! Owns the host-side settings the engine reads every frame (viewport,
//! sensitivity, layout edit mode) plus a [`HeadlessUi`] tree, and drives
//! the engine one control message at a time.

use std::io::{BufRead, Write};

use anyhow::Context;
use tracing::{info, warn};

use crate::engine::{EngineConfig, FrameInput, PointerEngine, PointerEvent};
use crate::geometry::Viewport;
use crate::hand::landmarks::LandmarkFrame;
use crate::hand::mapper::{SmoothingMode, SENSITIVITY_MAX, SENSITIVITY_MIN};
use crate::ipc;
use crate::ui::HeadlessUi;

/// Headless session configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub viewport: Viewport,
    pub sensitivity: f32,
    pub layout_edit: bool,
    pub engine: EngineConfig,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            sensitivity: 2.0,
            layout_edit: false,
            engine: EngineConfig::default(),
        }
    }
}

/// Engine, UI tree and host settings for one replay.
pub struct HeadlessSession {
    pub engine: PointerEngine,
    pub ui: HeadlessUi,
    viewport: Viewport,
    sensitivity: f32,
    layout_edit: bool,
    /// Sum of frame `dt`s; stamps decoded landmark frames.
    clock_ms: f64,
    /// Event lines produced since the last drain.
    pending: Vec<String>,
}

impl HeadlessSession {
    pub fn new(config: HeadlessConfig) -> Self {
        info!(
            "Headless session: {:.0}x{:.0}, sensitivity {:.2}, layout edit {}",
            config.viewport.width, config.viewport.height, config.sensitivity, config.layout_edit
        );
        Self {
            engine: PointerEngine::new(config.engine, config.viewport),
            ui: HeadlessUi::new(),
            viewport: config.viewport,
            sensitivity: config.sensitivity,
            layout_edit: config.layout_edit,
            clock_ms: 0.0,
            pending: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn layout_edit(&self) -> bool {
        self.layout_edit
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Values outside the settings range are kept as given.
    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        if !(SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&sensitivity) {
            warn!(
                "Sensitivity {:.2} outside [{:.1}, {:.1}]",
                sensitivity, SENSITIVITY_MIN, SENSITIVITY_MAX
            );
        }
        info!("Sensitivity: {:.2} -> {:.2}", self.sensitivity, sensitivity);
        self.sensitivity = sensitivity;
    }

    /// Turning edit mode off releases any held panel on the next frame.
    pub fn set_layout_edit(&mut self, enabled: bool) {
        if self.layout_edit != enabled {
            info!("Layout edit mode: {}", if enabled { "on" } else { "off" });
        }
        self.layout_edit = enabled;
    }

    pub fn set_smoothing(&mut self, mode: SmoothingMode) {
        self.engine.set_smoothing(mode);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.engine.resize(viewport);
    }

    /// Decode a flat coordinate list into a landmark frame stamped with the
    /// session clock. Wrong lengths yield `None`.
    pub fn decode_landmarks(&self, flat: &[f32]) -> Option<LandmarkFrame> {
        LandmarkFrame::from_flat(flat, self.clock_ms)
    }

    /// Run one engine frame against the live UI tree.
    pub fn frame(&mut self, landmarks: Option<&LandmarkFrame>, dt_ms: f64) -> Vec<PointerEvent> {
        self.clock_ms += dt_ms.max(0.0);

        let targets = self.ui.interactive_targets();
        let regions = self.ui.draggable_regions();
        let input = FrameInput {
            landmarks,
            viewport: self.viewport,
            sensitivity: self.sensitivity,
            targets: &targets,
            regions: &regions,
            layout_edit: self.layout_edit,
            dt_ms,
        };
        let events = self.engine.tick(&input, &mut self.ui);

        // Keep handle hit-testing in step with the layout store.
        for event in &events {
            if let PointerEvent::PanelMoved { panel, dx, dy } = event {
                self.ui.move_panel(*panel, *dx, *dy);
            }
        }
        self.queue(&events);

        if let Some(snapshot) = self.engine.publish(dt_ms) {
            let x = format!("{:.1}", snapshot.cursor.x);
            let y = format!("{:.1}", snapshot.cursor.y);
            let snapped = snapshot
                .snapped
                .map(|id| id.to_string())
                .unwrap_or_else(|| "nil".to_string());
            let dragging = snapshot
                .dragging
                .map(|p| format!(":{}", p.as_str()))
                .unwrap_or_else(|| "nil".to_string());
            self.pending.push(ipc::format_event(
                "pointer",
                &[
                    ("x", x.as_str()),
                    ("y", y.as_str()),
                    ("pinched", if snapshot.pinched { "t" } else { "nil" }),
                    ("snapped", snapped.as_str()),
                    ("dragging", dragging.as_str()),
                ],
            ));
        }

        events
    }

    pub fn stop_tracking(&mut self) -> Vec<PointerEvent> {
        let events = self.engine.stop_tracking(&mut self.ui);
        self.queue(&events);
        events
    }

    fn queue(&mut self, events: &[PointerEvent]) {
        self.pending.extend(events.iter().map(PointerEvent::to_sexp));
    }

    /// Take every event line queued since the last call.
    pub fn drain_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}

/// Totals for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub messages: u64,
    pub errors: u64,
    pub events: u64,
}

/// Replay a trace: one s-expression per line, blank lines and `;` comments
/// skipped. Responses and events are written to `out` in order.
pub fn run<R: BufRead, W: Write>(
    session: &mut HeadlessSession,
    reader: R,
    out: &mut W,
    ipc_trace: bool,
) -> anyhow::Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading trace line {}", lineno + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        if ipc_trace {
            info!(line = lineno + 1, "<< {}", trimmed);
        }
        stats.messages += 1;

        if let Some(response) = ipc::handle_message(session, trimmed) {
            if response.contains(":status :error") {
                stats.errors += 1;
            }
            if ipc_trace {
                info!(line = lineno + 1, ">> {}", response);
            }
            writeln!(out, "{}", response).context("writing response")?;
        }
        for event in session.drain_events() {
            stats.events += 1;
            if ipc_trace {
                info!("event >> {}", event);
            }
            writeln!(out, "{}", event).context("writing event")?;
        }
    }

    info!(
        "Replay finished: {} messages, {} errors, {} events",
        stats.messages, stats.errors, stats.events
    );
    info!("Final status: {}", session.engine.status_sexp());
    Ok(stats)
}
