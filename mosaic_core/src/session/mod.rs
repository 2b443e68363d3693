mod builder;
mod config;
mod mosaic_session;
mod report;

pub use builder::SessionBuilder;
pub use config::{IncompleteRowPolicy, SessionConfig};
pub use mosaic_session::MosaicSession;
pub use report::SessionReport;
