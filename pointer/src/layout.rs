//! Panel layout store — screen positions of the movable UI regions.
//!
//! Shared with the rendering layer. Written only by the drag controller
//! and by resize centering.

use std::collections::BTreeMap;

use tracing::info;

use crate::geometry::{Point, Viewport};

/// The application's movable panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PanelId {
    Video,
    Visualizer,
    Chat,
    Cad,
    Browser,
    Devices,
    Tools,
}

impl PanelId {
    /// Drag claim priority: when regions overlap, the earliest wins.
    pub const PRIORITY: [PanelId; 7] = [
        Self::Video,
        Self::Visualizer,
        Self::Chat,
        Self::Cad,
        Self::Browser,
        Self::Devices,
        Self::Tools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Visualizer => "visualizer",
            Self::Chat => "chat",
            Self::Cad => "cad",
            Self::Browser => "browser",
            Self::Devices => "devices",
            Self::Tools => "tools",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "video" => Some(Self::Video),
            "visualizer" => Some(Self::Visualizer),
            "chat" => Some(Self::Chat),
            "cad" => Some(Self::Cad),
            "browser" => Some(Self::Browser),
            "devices" => Some(Self::Devices),
            "tools" => Some(Self::Tools),
            _ => None,
        }
    }

    /// Position in [`PanelId::PRIORITY`].
    pub fn priority(&self) -> usize {
        *self as usize
    }

    /// Panels re-centered horizontally when the window is resized.
    pub fn is_centered(&self) -> bool {
        matches!(self, Self::Visualizer | Self::Chat | Self::Tools)
    }

    /// Default anchor position for a viewport.
    pub fn default_position(&self, viewport: Viewport) -> Point {
        let (w, h) = (viewport.width, viewport.height);
        match self {
            Self::Video => Point::new(w * 0.12, h * 0.18),
            Self::Visualizer => Point::new(w * 0.5, h * 0.28),
            Self::Chat => Point::new(w * 0.5, h * 0.62),
            Self::Cad => Point::new(w * 0.82, h * 0.30),
            Self::Browser => Point::new(w * 0.82, h * 0.68),
            Self::Devices => Point::new(w * 0.12, h * 0.68),
            Self::Tools => Point::new(w * 0.5, h * 0.92),
        }
    }
}

/// One panel's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPosition {
    pub id: PanelId,
    pub x: f32,
    pub y: f32,
}

/// Mapping from panel to anchor position.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    positions: BTreeMap<PanelId, Point>,
}

impl PanelLayout {
    /// Every panel at its default position for `viewport`.
    pub fn with_defaults(viewport: Viewport) -> Self {
        let positions = PanelId::PRIORITY
            .iter()
            .map(|id| (*id, id.default_position(viewport)))
            .collect();
        Self { positions }
    }

    pub fn position(&self, id: PanelId) -> Point {
        self.positions.get(&id).copied().unwrap_or_default()
    }

    /// Apply a drag delta. Panels may leave the screen.
    pub fn translate(&mut self, id: PanelId, dx: f32, dy: f32) {
        let p = self.positions.entry(id).or_default();
        p.x += dx;
        p.y += dy;
    }

    /// Reset the centered panels after a window resize.
    pub fn recenter(&mut self, viewport: Viewport) {
        for id in PanelId::PRIORITY.iter().filter(|id| id.is_centered()) {
            self.positions.insert(*id, id.default_position(viewport));
        }
        info!(
            "Panel layout recentered for {:.0}x{:.0}",
            viewport.width, viewport.height
        );
    }

    pub fn panels(&self) -> Vec<PanelPosition> {
        self.positions
            .iter()
            .map(|(id, p)| PanelPosition {
                id: *id,
                x: p.x,
                y: p.y,
            })
            .collect()
    }

    /// Generate s-expression for IPC.
    pub fn status_sexp(&self) -> String {
        let mut s = String::from("(");
        for (i, panel) in self.panels().iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            s.push_str(&format!(
                "(:panel :{} :x {:.1} :y {:.1})",
                panel.id.as_str(),
                panel.x,
                panel.y
            ));
        }
        s.push(')');
        s
    }
}
