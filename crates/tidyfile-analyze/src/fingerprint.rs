//! Whole-file content fingerprinting.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use blake3::Hasher;

use tidyfile_core::{Fingerprint, TidyError, DEFAULT_CHUNK_SIZE};

/// Streams a file through BLAKE3 in bounded chunks.
///
/// Peak memory is one chunk regardless of file size. Empty files all share
/// the digest of the empty input.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    chunk_size: usize,
}

impl Fingerprinter {
    /// Create a fingerprinter with the default 64 KiB chunk.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a fingerprinter with a custom chunk size (minimum 1 byte).
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Read buffer size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Digest the full content of `path`.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, TidyError> {
        let file = File::open(path).map_err(|e| TidyError::io(path, e))?;
        self.fingerprint_reader(file)
            .map_err(|e| TidyError::io(path, e))
    }

    /// Digest everything a reader yields.
    pub fn fingerprint_reader(&self, mut reader: impl Read) -> std::io::Result<Fingerprint> {
        let mut hasher = Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Fingerprint::new(*hasher.finalize().as_bytes()))
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identical_content_identical_fingerprint() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "duplicate content here").unwrap();
        fs::write(temp.path().join("b.txt"), "duplicate content here").unwrap();
        fs::write(temp.path().join("c.txt"), "duplicate content herE").unwrap();

        let fp = Fingerprinter::new();
        let a = fp.fingerprint(&temp.path().join("a.txt")).unwrap();
        let b = fp.fingerprint(&temp.path().join("b.txt")).unwrap();
        let c = fp.fingerprint(&temp.path().join("c.txt")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_chunk_size_does_not_change_digest() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let small = Fingerprinter::with_chunk_size(7).fingerprint_reader(&data[..]).unwrap();
        let large = Fingerprinter::new().fingerprint_reader(&data[..]).unwrap();
        assert_eq!(small, large);
        assert_eq!(small.as_bytes(), blake3::hash(&data).as_bytes());
    }

    #[test]
    fn test_empty_files_match() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "").unwrap();
        fs::write(temp.path().join("b"), "").unwrap();

        let fp = Fingerprinter::new();
        assert_eq!(
            fp.fingerprint(&temp.path().join("a")).unwrap(),
            fp.fingerprint(&temp.path().join("b")).unwrap()
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = Fingerprinter::new()
            .fingerprint(&temp.path().join("missing"))
            .unwrap_err();
        assert!(err.is_io());
        assert!(matches!(err, TidyError::NotFound { .. }));
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        assert_eq!(Fingerprinter::with_chunk_size(0).chunk_size(), 1);
    }
}
