mod disk;
mod memory;
mod store_type;
mod traits;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use store_type::{DEFAULT_STORE_DIR, StoreType};
pub use traits::ResourceStore;
