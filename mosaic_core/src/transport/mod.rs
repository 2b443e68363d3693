mod http;
mod traits;

pub use http::HttpTransport;
pub use traits::{SharedTransport, Transport};
