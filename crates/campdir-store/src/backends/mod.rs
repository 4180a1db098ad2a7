//! Document service implementations.

mod fs;
mod memory;

pub use fs::FsDocumentService;
pub use memory::{Fault, Faults, MemoryDocumentService, WRITE_LOG_CAPACITY};
