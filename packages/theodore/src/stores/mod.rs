//! Vector store implementations.

mod memory;

pub use memory::MemoryVectorStore;
