//! I/O operations module
//!
//! Source file resolution, chunked local file copies for the mounted
//! backend, and the versioned object stores behind the direct backend.

pub mod fileset;
pub mod gridfs;
pub mod local;
pub mod store;

pub use fileset::{FileSet, SourceFile, SourceStatus};
pub use gridfs::GridFsStore;
pub use store::{Download, MemoryStore, ObjectStore};
