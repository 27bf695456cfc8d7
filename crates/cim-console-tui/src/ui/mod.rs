//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout and overlays
//! - `input`: keyboard event handling
//! - `styles`: colors and text styling
//! - `views`: per-screen content (dashboard, users, groups, policies)

pub mod input;
pub mod render;
pub mod styles;
pub mod views;
