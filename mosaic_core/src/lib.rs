//! Core of the mosaic renderer: cuts an image into tiles, averages their colors, resolves
//! every color to a remotely fetched resource and reassembles the results in row order.
//!
//! The entry point is [`MosaicSession`]. The stages it wires together are usable on their
//! own: [`TileGrid`], [`average_color`], [`ResourceResolver`], [`FetchCache`],
//! [`WorkDistributor`] and [`RowAssembler`].

pub mod assembler;
pub use assembler::*;

pub mod average;
pub use average::*;

pub mod concurrency;
pub use concurrency::*;

pub mod distributor;
pub use distributor::*;

pub mod error;
pub use error::*;

pub mod events;
pub use events::*;

pub mod fetch;
pub use fetch::*;

pub mod grid;
pub use grid::*;

pub mod resolver;
pub use resolver::*;

pub mod session;
pub use session::*;

pub mod store;
pub use store::*;

pub mod transport;
pub use transport::*;

pub mod types;
pub use types::*;
