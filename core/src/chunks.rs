//! Fixed-size chunking of streamed bodies.

use std::fmt;
use std::io::{ErrorKind, Read};

use crate::error::ApiError;

/// Chunk size used by `ImageStore::read` unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Single-pass iterator over `chunk_size` pieces of a reader.
///
/// Every chunk is full except possibly the last, so N bytes come out as
/// ceil(N / chunk_size) chunks. The reader is dropped as soon as it reports
/// end of input or an error; for a network body that releases the
/// connection. Dropping the iterator early releases it as well.
pub struct Chunks<R> {
    reader: Option<R>,
    chunk_size: usize,
}

impl<R> fmt::Debug for Chunks<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunks")
            .field("chunk_size", &self.chunk_size)
            .field("finished", &self.reader.is_none())
            .finish_non_exhaustive()
    }
}

impl<R: Read> Chunks<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader: Some(reader),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Drain the remaining chunks into one buffer.
    pub fn read_all(self) -> Result<Vec<u8>, ApiError> {
        let mut out = Vec::new();
        for chunk in self {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl<R: Read> Iterator for Chunks<R> {
    type Item = Result<Vec<u8>, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.reader = None;
                    return Some(Err(ApiError::Io(e)));
                }
            }
        }
        if filled < buf.len() {
            self.reader = None;
        }
        if filled == 0 {
            return None;
        }
        buf.truncate(filled);
        Some(Ok(buf))
    }
}

impl<R: Read> std::iter::FusedIterator for Chunks<R> {}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;

    /// Hands out at most `step` bytes per read call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Yields some bytes, then fails.
    struct Broken {
        sent: bool,
    }

    impl Read for Broken {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            buf[0] = 7;
            Ok(1)
        }
    }

    fn data(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn chunk_count_is_ceiling_of_length() {
        for (n, c) in [(10, 3), (9, 3), (1, 4096), (4096, 4096), (4097, 4096), (0, 8)] {
            let chunks: Vec<Vec<u8>> = Chunks::new(Cursor::new(data(n)), c)
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(chunks.len(), n.div_ceil(c), "n={n} c={c}");
            assert_eq!(chunks.concat(), data(n), "n={n} c={c}");
        }
    }

    #[test]
    fn empty_body_yields_nothing() {
        let mut chunks = Chunks::new(Cursor::new(Vec::new()), DEFAULT_CHUNK_SIZE);
        assert!(chunks.next().is_none());
        assert!(chunks.next().is_none());
    }

    #[test]
    fn short_reads_are_coalesced_into_full_chunks() {
        let reader = Trickle {
            data: data(100),
            pos: 0,
            step: 7,
        };
        let sizes: Vec<usize> = Chunks::new(reader, 32).map(|c| c.unwrap().len()).collect();
        assert_eq!(sizes, [32, 32, 32, 4]);
    }

    #[test]
    fn read_error_ends_the_sequence() {
        let mut chunks = Chunks::new(Broken { sent: false }, 4);
        let err = chunks.next().unwrap().unwrap_err();
        assert!(matches!(err, ApiError::Io(ref e) if e.kind() == ErrorKind::ConnectionReset));
        assert!(chunks.next().is_none());
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let chunks = Chunks::new(Cursor::new(data(3)), 0);
        assert_eq!(chunks.chunk_size(), 1);
        assert_eq!(chunks.count(), 3);
    }

    #[test]
    fn debug_does_not_need_a_debug_reader() {
        let reader = Trickle {
            data: data(4),
            pos: 0,
            step: 4,
        };
        let mut chunks = Chunks::new(reader, 8);
        assert_eq!(
            format!("{chunks:?}"),
            "Chunks { chunk_size: 8, finished: false, .. }"
        );
        let _ = chunks.next();
        assert!(format!("{chunks:?}").contains("finished: true"));

        let failed: Result<Chunks<Trickle>, ApiError> = Err(ApiError::Http {
            status: 404,
            body: String::new(),
        });
        assert_eq!(failed.unwrap_err().status(), Some(404));
    }

    #[test]
    fn read_all_concatenates() {
        let chunks = Chunks::new(Cursor::new(data(50)), 16);
        assert_eq!(chunks.read_all().unwrap(), data(50));
    }
}
