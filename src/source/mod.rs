//! Raw byte sources.
//!
//! This module provides the abstraction over the two independent noise
//! devices that feed the extractor. A source is treated as an opaque
//! producer of single bytes; it is not assumed to be unbiased.

mod device;
mod mock;

pub use device::{ByteSource, DeviceSource, SourceError};
pub use mock::MockSource;
