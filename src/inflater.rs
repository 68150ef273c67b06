//! Pooled inflate engine backed by `flate2::Decompress`

use crate::engine::{Recyclable, Variant};
use crate::errors::{InflateError, InflateResult};

use flate2::{Decompress, FlushDecompress, Status};
use std::fmt;

/// Output growth step while streaming into a `Vec`
const CHUNK_SIZE: usize = 32 * 1024;

/// A reusable inflate engine for one stream at a time.
///
/// The underlying `Decompress` owns a sizeable window and Huffman tables,
/// which is what makes pooling worthwhile.
///
/// # Examples
///
/// ```
/// use esox_inflaterpool::{Inflater, Variant};
/// use flate2::{Compression, write::ZlibEncoder};
/// use std::io::Write;
///
/// let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
/// encoder.write_all(b"hello hello hello").unwrap();
/// let compressed = encoder.finish().unwrap();
///
/// let mut inflater = Inflater::new(Variant::Header);
/// let plain = inflater.inflate_to_vec(&compressed).unwrap();
/// assert_eq!(plain, b"hello hello hello");
/// assert!(inflater.is_finished());
/// ```
pub struct Inflater {
    inner: Decompress,
    variant: Variant,
    finished: bool,
}

impl Inflater {
    pub fn new(variant: Variant) -> Self {
        Self {
            inner: Decompress::new(variant.has_zlib_header()),
            variant,
            finished: false,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Compressed bytes consumed since the last reset
    pub fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    /// Decompressed bytes produced since the last reset
    pub fn total_out(&self) -> u64 {
        self.inner.total_out()
    }

    /// Whether the end of the current stream has been reached
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run a single decompression step into a caller-owned buffer.
    pub fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushDecompress,
    ) -> InflateResult<Status> {
        if self.finished {
            return Err(InflateError::Finished);
        }

        let status = self.inner.decompress(input, output, flush)?;
        if matches!(status, Status::StreamEnd) {
            self.finished = true;
        }
        Ok(status)
    }

    /// Inflate as much of `input` as possible, appending to `output`.
    ///
    /// Can be called repeatedly with successive chunks of one stream. Returns
    /// the number of bytes appended; stops early once the stream ends.
    pub fn inflate_into(&mut self, input: &[u8], output: &mut Vec<u8>) -> InflateResult<usize> {
        if self.finished {
            return Err(InflateError::Finished);
        }

        let start_in = self.inner.total_in();
        let start_out = self.inner.total_out();

        loop {
            if output.capacity() - output.len() < CHUNK_SIZE {
                output.reserve(CHUNK_SIZE);
            }

            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();
            let consumed = (before_in - start_in) as usize;

            let status =
                self.inner
                    .decompress_vec(&input[consumed..], output, FlushDecompress::None)?;

            if matches!(status, Status::StreamEnd) {
                self.finished = true;
                break;
            }

            // No progress: input exhausted, waiting for the next chunk
            if self.inner.total_in() == before_in && self.inner.total_out() == before_out {
                break;
            }
        }

        Ok((self.inner.total_out() - start_out) as usize)
    }

    /// Inflate one complete stream.
    pub fn inflate_to_vec(&mut self, input: &[u8]) -> InflateResult<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len().saturating_mul(2));
        self.inflate_into(input, &mut output)?;

        if !self.finished {
            return Err(InflateError::Truncated);
        }
        Ok(output)
    }
}

impl Recyclable for Inflater {
    fn create(variant: Variant) -> Self {
        Inflater::new(variant)
    }

    fn variant(&self) -> Variant {
        Inflater::variant(self)
    }

    fn reset(&mut self) {
        self.inner.reset(self.variant.has_zlib_header());
        self.finished = false;
    }
}

impl fmt::Debug for Inflater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inflater")
            .field("variant", &self.variant)
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .field("finished", &self.finished)
            .finish()
    }
}
