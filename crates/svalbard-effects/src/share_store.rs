//! Share store handlers
//!
//! Both handlers keep the existence check and the write of `store` atomic:
//! the memory store under its write lock, the filesystem store through an
//! exclusive `create_new` open.

mod filesystem;
mod memory;

pub use filesystem::FilesystemShareStore;
pub use memory::MemoryShareStore;
