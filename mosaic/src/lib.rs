//! Library side of the `mosaic` command line tool.

pub mod renderer;
pub use renderer::CanvasRenderer;
