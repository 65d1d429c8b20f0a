pub mod builder;
pub mod client;
pub mod error;
pub mod memory;

pub use builder::MemoryPlatformBuilder;
pub use client::{PlatformClient, SnapshotStream};
pub use error::{PlatformError, Result};
pub use memory::MemoryPlatform;
