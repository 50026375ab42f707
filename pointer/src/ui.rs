//! UI host seam — the live element tree the pointer engine acts on.
//!
//! The engine never owns UI elements. Each frame it asks the host for the
//! current interactive targets and drives highlight and click side effects
//! back through [`UiHost`]. Element IDs are host-assigned and may vanish
//! between frames.

use std::collections::BTreeMap;

use tracing::debug;

use crate::geometry::{Point, Rect};
use crate::layout::PanelId;

/// Kind of UI element, as far as the pointer cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Button,
    Input,
    Select,
    /// Explicitly marked draggable surface.
    Draggable,
    /// Plain container or text; hit-testable but not a snap target.
    Static,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Input => "input",
            Self::Select => "select",
            Self::Draggable => "draggable",
            Self::Static => "static",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "button" => Some(Self::Button),
            "input" => Some(Self::Input),
            "select" => Some(Self::Select),
            "draggable" => Some(Self::Draggable),
            "static" => Some(Self::Static),
            _ => None,
        }
    }

    /// Whether the cursor may snap onto elements of this kind.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Self::Static)
    }

    /// Whether a synthetic click may be delivered to this kind.
    pub fn is_clickable(&self) -> bool {
        matches!(self, Self::Button | Self::Input | Self::Select)
    }
}

/// A snap candidate, computed fresh each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractiveTarget {
    pub id: u64,
    pub bounds: Rect,
}

/// A named panel region that a fist drag can claim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraggableRegion {
    pub panel: PanelId,
    pub bounds: Rect,
}

/// Side-effect surface the engine drives.
pub trait UiHost {
    /// Whether the element is still in the live tree.
    fn element_exists(&self, id: u64) -> bool;

    /// Apply or revert the snap highlight (glow, border, background).
    fn set_highlight(&mut self, id: u64, on: bool);

    /// Innermost element under a screen point.
    fn element_at(&self, point: Point) -> Option<u64>;

    /// Nearest clickable element at or above `id`, if any.
    fn clickable_ancestor(&self, id: u64) -> Option<u64>;

    /// Deliver a synthetic click.
    fn dispatch_click(&mut self, id: u64, point: Point);
}

/// Resolve which element a synthetic click at `point` should reach:
/// the innermost clickable ancestor, falling back to the hit element itself.
pub fn click_target<H: UiHost + ?Sized>(host: &H, point: Point) -> Option<u64> {
    let hit = host.element_at(point)?;
    Some(host.clickable_ancestor(hit).unwrap_or(hit))
}

// ── Headless host ──────────────────────────────────────────

/// One element of the in-memory UI tree.
#[derive(Debug, Clone)]
pub struct HeadlessElement {
    pub id: u64,
    pub kind: ElementKind,
    pub bounds: Rect,
    pub parent: Option<u64>,
    /// Panel this element is the drag handle for.
    pub panel: Option<PanelId>,
    pub highlighted: bool,
}

/// In-memory UI tree used for replay and tests.
#[derive(Debug, Default)]
pub struct HeadlessUi {
    /// Ordered by ID; later IDs are treated as painted on top.
    elements: BTreeMap<u64, HeadlessElement>,
    /// Every click delivered, in order.
    pub clicks: Vec<(u64, Point)>,
}

impl HeadlessUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: u64, kind: ElementKind, bounds: Rect, parent: Option<u64>) {
        self.elements.insert(
            id,
            HeadlessElement {
                id,
                kind,
                bounds,
                parent,
                panel: None,
                highlighted: false,
            },
        );
    }

    /// Add a draggable surface bound to a panel.
    pub fn add_panel_handle(&mut self, id: u64, panel: PanelId, bounds: Rect) {
        self.add(id, ElementKind::Draggable, bounds, None);
        if let Some(el) = self.elements.get_mut(&id) {
            el.panel = Some(panel);
        }
    }

    /// Remove an element. Children keep their dangling parent link,
    /// the same as a detached DOM subtree.
    pub fn remove(&mut self, id: u64) -> bool {
        self.elements.remove(&id).is_some()
    }

    pub fn get(&self, id: u64) -> Option<&HeadlessElement> {
        self.elements.get(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_highlighted(&self, id: u64) -> bool {
        self.elements.get(&id).map(|e| e.highlighted).unwrap_or(false)
    }

    /// Query the live tree for snap candidates.
    pub fn interactive_targets(&self) -> Vec<InteractiveTarget> {
        self.elements
            .values()
            .filter(|e| e.kind.is_interactive())
            .map(|e| InteractiveTarget {
                id: e.id,
                bounds: e.bounds,
            })
            .collect()
    }

    /// Query the live tree for panel drag handles.
    pub fn draggable_regions(&self) -> Vec<DraggableRegion> {
        self.elements
            .values()
            .filter_map(|e| {
                e.panel.map(|panel| DraggableRegion {
                    panel,
                    bounds: e.bounds,
                })
            })
            .collect()
    }

    /// Parent-chain length; bounded so a parent cycle terminates.
    fn depth(&self, id: u64) -> usize {
        let mut depth = 0;
        let mut current = self.elements.get(&id).and_then(|e| e.parent);
        while let Some(pid) = current {
            if depth > self.elements.len() {
                break;
            }
            depth += 1;
            current = self.elements.get(&pid).and_then(|e| e.parent);
        }
        depth
    }

    /// Shift a panel handle, keeping hit-testing in step with the layout.
    pub fn move_panel(&mut self, panel: PanelId, dx: f32, dy: f32) {
        for el in self.elements.values_mut() {
            if el.panel == Some(panel) {
                el.bounds.x += dx;
                el.bounds.y += dy;
            }
        }
    }
}

impl UiHost for HeadlessUi {
    fn element_exists(&self, id: u64) -> bool {
        self.elements.contains_key(&id)
    }

    fn set_highlight(&mut self, id: u64, on: bool) {
        if let Some(el) = self.elements.get_mut(&id) {
            el.highlighted = on;
        }
    }

    fn element_at(&self, point: Point) -> Option<u64> {
        // Innermost = deepest in the tree; ties go to the topmost (highest ID).
        self.elements
            .values()
            .filter(|e| e.bounds.contains(point))
            .max_by_key(|e| (self.depth(e.id), e.id))
            .map(|e| e.id)
    }

    fn clickable_ancestor(&self, id: u64) -> Option<u64> {
        let mut current = Some(id);
        // Bounded walk; a malformed parent cycle must not hang the frame.
        for _ in 0..=self.elements.len() {
            let el = self.elements.get(&current?)?;
            if el.kind.is_clickable() {
                return Some(el.id);
            }
            current = el.parent;
        }
        None
    }

    fn dispatch_click(&mut self, id: u64, point: Point) {
        debug!(element = id, x = point.x, y = point.y, "synthetic click");
        self.clicks.push((id, point));
    }
}
