//! Virtual filesystem for termquest
//!
//! Provides an async filesystem trait and an in-memory implementation:
//! - `InMemoryFs::new()`: bare tree with `/home/user` and `/tmp`
//! - `InMemoryFs::seeded()`: the challenge levels a terminal session starts with

mod memory;
mod seed;
mod traits;

pub use memory::InMemoryFs;
pub use traits::{
    DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_OWNER, DirEntry, FileSystem, FileType, Metadata,
};
