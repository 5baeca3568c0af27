//! PixelPad: a grid-snapped pixel-art pad.
//!
//! The library holds everything except the window: grid mapping, line
//! tracing, color and tool state, the raster canvas, snapshots and storage.

pub mod canvas;
pub mod color;
pub mod error;
pub mod grid;
pub mod line;
pub mod logger;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod tools;

pub use error::{PadError, Result};
pub use state::AppState;
