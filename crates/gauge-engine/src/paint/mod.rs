//! Color model shared by the quad builder and vertex layouts.

pub mod color;

pub use color::Color8;
