use crate::engine::Engine;
use crate::error::{Error, Result, eof};
use crate::leb128;

/// Cursor state for one decode call.
///
/// Holds the borrowed input, the byte cursor and the bit cursor used for
/// packed booleans. A fresh reader is created for every
/// [`Decoder::decode`](super::Decoder::decode) call, so the cursors always
/// start at zero.
#[derive(Debug)]
pub struct Reader<'de> {
    buf: &'de [u8],
    index: usize,
    bool_pos: usize,
    bool_bit: u8,
    engine: &'de Engine,
    max_length: usize,
}

impl<'de> Reader<'de> {
    /// Creates a reader at the start of `buf`.
    pub fn new(buf: &'de [u8], engine: &'de Engine) -> Self {
        Self {
            buf,
            index: 0,
            bool_pos: 0,
            bool_bit: 0,
            engine,
            max_length: engine.config().max_length,
        }
    }

    /// The engine whose strategies and registry this reader decodes with.
    pub fn engine(&self) -> &'de Engine {
        self.engine
    }

    /// The amount of bytes consumed so far, including bytes holding packed
    /// booleans.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Gets the remaining unread part of the buffer.
    pub fn remainder(&self) -> &'de [u8] {
        self.buf.get(self.index..).unwrap_or_default()
    }

    /// Upper bound on how many more values the input can hold.
    ///
    /// Every value with a non-zero size occupies at least one bit. The extra
    /// byte accounts for bits left in the current packed-bool byte.
    pub(crate) fn max_items(&self) -> usize {
        self.remainder().len().saturating_add(1).saturating_mul(8)
    }

    /// Advances the byte cursor by `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than `len` bytes remain.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        if len > self.remainder().len() {
            return Err(eof());
        }

        self.index += len;
        Ok(())
    }

    /// Reads a constant size chunk of bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than `N` bytes remain.
    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let (out, _) = self.remainder().split_first_chunk::<N>().ok_or_else(eof)?;
        self.index += N;
        Ok(*out)
    }

    /// Reads `len` bytes, borrowed from the input.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than `len` bytes remain.
    pub fn read_slice(&mut self, len: usize) -> Result<&'de [u8]> {
        let out = self.remainder().get(..len).ok_or_else(eof)?;
        self.index += len;
        Ok(out)
    }

    /// Reads one packed boolean.
    ///
    /// Booleans share bytes: the first boolean of every group of eight claims
    /// the byte at the current cursor, the following ones use its higher bits.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a new bit byte is needed but the input is exhausted.
    pub fn read_packed_bool(&mut self) -> Result<bool> {
        if self.bool_bit == 0 {
            if self.index >= self.buf.len() {
                return Err(eof());
            }

            self.bool_pos = self.index;
            self.bool_bit = 1;
            self.index += 1;
        }

        let byte = self.buf.get(self.bool_pos).copied().ok_or_else(eof)?;
        let value = byte & self.bool_bit != 0;
        self.bool_bit <<= 1;
        Ok(value)
    }

    /// Reads a length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthLimit`] if the length exceeds the configured
    /// maximum, or `Err` if the input is malformed.
    pub fn read_length(&mut self) -> Result<usize> {
        let len: usize = self.read_leb128()?;
        if len > self.max_length {
            return Err(Error::LengthLimit {
                len,
                max: self.max_length,
            });
        }

        Ok(len)
    }

    /// Reads a length-prefixed string, borrowed from the input.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the input is malformed or not valid UTF-8.
    pub fn read_str(&mut self) -> Result<&'de str> {
        let len = self.read_length()?;
        let bytes = self.read_slice(len)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    pub(crate) fn read_leb128<T: leb128::Leb128>(&mut self) -> Result<T> {
        let (value, len) = leb128::read(self.remainder())?;
        self.index += len;
        Ok(value)
    }
}
