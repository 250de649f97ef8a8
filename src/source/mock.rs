//! Synthetic byte source for tests and demonstrations.

use super::{ByteSource, SourceError};

/// Mock source that replays a fixed script of reads forever.
///
/// Each script entry is either a byte or `None` for a failed read.
/// NOT an entropy source - only for exercising the pipeline.
#[derive(Debug, Clone)]
pub struct MockSource {
    name: String,
    script: Vec<Option<u8>>,
    position: usize,
    reads: u64,
}

impl MockSource {
    /// Creates a source replaying `script` in a loop.
    pub fn from_script(name: impl Into<String>, script: Vec<Option<u8>>) -> Self {
        Self {
            name: name.into(),
            script,
            position: 0,
            reads: 0,
        }
    }

    /// A source that always returns `value`.
    pub fn constant(value: u8) -> Self {
        Self::from_script(format!("constant({value})"), vec![Some(value)])
    }

    /// A source that cycles through `bytes`.
    pub fn cycle(bytes: &[u8]) -> Self {
        Self::from_script("cycle", bytes.iter().copied().map(Some).collect())
    }

    /// A source whose every read fails.
    pub fn failing() -> Self {
        Self::from_script("failing", Vec::new())
    }

    /// Number of reads attempted so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl ByteSource for MockSource {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        self.reads += 1;
        if self.script.is_empty() {
            return Err(SourceError::Exhausted);
        }

        let entry = self.script[self.position];
        self.position = (self.position + 1) % self.script.len();
        entry.ok_or_else(|| {
            SourceError::Read(std::io::Error::new(
                std::io::ErrorKind::Other,
                "scripted read failure",
            ))
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_wraps() {
        let mut source = MockSource::cycle(&[1, 2]);
        let bytes: Vec<u8> = (0..5).map(|_| source.read_byte().unwrap()).collect();
        assert_eq!(bytes, vec![1, 2, 1, 2, 1]);
        assert_eq!(source.reads(), 5);
    }

    #[test]
    fn test_script_failures() {
        let mut source = MockSource::from_script("flaky", vec![Some(9), None]);
        assert_eq!(source.read_byte().unwrap(), 9);
        assert!(matches!(source.read_byte(), Err(SourceError::Read(_))));
        assert_eq!(source.read_byte().unwrap(), 9);
    }

    #[test]
    fn test_failing_source() {
        let mut source = MockSource::failing();
        assert!(matches!(source.read_byte(), Err(SourceError::Exhausted)));
        assert_eq!(source.reads(), 1);
    }
}
