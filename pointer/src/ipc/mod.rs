//! S-expression control surface for the pointer engine.

pub mod dispatch;

pub use dispatch::{format_event, handle_message};
