mod bitmap;
pub use bitmap::*;

mod tile_grid;
pub use tile_grid::*;
