//! Coordinate and geometry types.
//!
//! Canonical CPU space:
//! - Surface pixels
//! - Origin bottom-left
//! - +X right, +Y up
//!
//! The panel shader converts to clip space with `Viewport::ortho()`.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
