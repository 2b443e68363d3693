mod blob;
pub use blob::*;

mod color;
pub use color::*;

mod resource_key;
pub use resource_key::*;

mod tile_coord;
pub use tile_coord::*;
