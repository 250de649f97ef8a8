//! Output of completed words.
//!
//! The generator only produces values; how they reach the consumer
//! (stdout, a serial line, a socket) is up to the sink.

mod sink;

pub use sink::{OutputFormat, SinkError, UnknownFormat, WordSink, WriterSink};
