//! Object storage for merged images.
//!
//! A merged image is persisted once under a fresh key and the store hands
//! back the URL it can be fetched from. Backends:
//! - **filesystem**: writes below `<root_dir>/<bucket>/`
//! - **http**: PUTs to an S3-compatible endpoint (presigned gateway, MinIO, proxy)
//! - **memory**: keeps objects in process, for tests and embedding

pub mod filesystem;
pub mod http;
pub mod memory;
pub mod store;

pub use filesystem::FilesystemStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use store::{object_key, resolve_env_var, ObjectStore, StoreFactory, StoredObject};
