//! Hand-driven pointer components.
//!
//! Provides, leaf-first:
//! - `landmarks`: the detector's 21-point hand frame
//! - `mapper`: camera-to-screen mapping with exponential smoothing
//! - `snap`: hysteresis snapping onto interactive targets
//! - `gesture`: pinch/fist classification and click edge detection
//! - `drag`: fist-drag of layout panels

pub mod drag;
pub mod gesture;
pub mod landmarks;
pub mod mapper;
pub mod snap;

pub use drag::{DragController, DragState, DragTransition};
pub use gesture::{GestureClassifier, GestureConfig, GestureState, GestureType};
pub use landmarks::{Finger, HandLandmark, LandmarkFrame, LANDMARK_COUNT};
pub use mapper::{CoordinateMapper, CursorState, MapperConfig, SmoothingMode};
pub use snap::{SnapConfig, SnapResolver, SnapState, SnapTransition};
