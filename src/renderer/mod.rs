//! Canvas rendering module
//!
//! `shapes` turns game state into a flat list of `DrawCmd`s; the wasm-only
//! `canvas` painter replays them on a 2D context.

pub mod command;
pub mod shapes;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasPainter;
pub use command::{ApproxMeasure, DrawCmd, Rgba, TextAlign, TextMeasure};
pub use shapes::build_scene;
