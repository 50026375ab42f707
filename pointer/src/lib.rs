//! Gesture-driven virtual pointer.
//!
//! Turns per-frame hand landmarks into a smoothed screen cursor that snaps
//! onto nearby interactive elements, clicks on pinch and drags layout
//! panels with a closed fist.

pub mod engine;
pub mod geometry;
pub mod hand;
pub mod headless;
pub mod ipc;
pub mod layout;
pub mod publish;
pub mod ui;

pub use engine::{EngineConfig, FrameInput, PointerEngine, PointerEvent};
pub use geometry::{Point, Rect, Viewport};
pub use layout::{PanelId, PanelLayout};
pub use ui::{HeadlessUi, UiHost};
