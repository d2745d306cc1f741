//! Frame storage

pub mod memory;

pub use memory::FrameStore;
