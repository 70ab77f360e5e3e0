use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::leb128;
use crate::overrides::{BinaryMarshal, NativeCodec, Record};

/// Output state for one encode call.
///
/// Mirrors [`Reader`](crate::Reader): the first boolean of every group of
/// eight reserves a byte at the current end of the output, and the following
/// booleans set its higher bits.
#[derive(Debug)]
pub struct Writer<'e> {
    buf: Vec<u8>,
    bool_pos: usize,
    bool_bit: u8,
    engine: &'e Engine,
}

impl<'e> Writer<'e> {
    /// Creates a writer with an empty output.
    pub fn new(engine: &'e Engine) -> Self {
        Self::with_buffer(Vec::new(), engine)
    }

    /// Creates a writer appending to `buf`.
    pub fn with_buffer(buf: Vec<u8>, engine: &'e Engine) -> Self {
        Self {
            buf,
            bool_pos: 0,
            bool_bit: 0,
            engine,
        }
    }

    /// The engine whose registry names dynamic values.
    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// Consumes the writer, returning the output.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends one raw byte.
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes one packed boolean.
    pub fn write_packed_bool(&mut self, value: bool) {
        if self.bool_bit == 0 {
            self.bool_pos = self.buf.len();
            self.bool_bit = 1;
            self.buf.push(0);
        }

        if value && let Some(byte) = self.buf.get_mut(self.bool_pos) {
            *byte |= self.bool_bit;
        }

        self.bool_bit <<= 1;
    }

    /// Writes a length prefix.
    pub fn write_length(&mut self, len: usize) {
        self.write_leb128(len);
    }

    /// Writes a length-prefixed string.
    pub fn write_str(&mut self, value: &str) {
        self.write_length(value.len());
        self.write_bytes(value.as_bytes());
    }

    /// Writes `value` through its [`Record`] capability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capability`] if the record could not be produced.
    pub fn write_record<T: Record>(&mut self, value: &T) -> Result<()> {
        let data = value.encode_record().map_err(Error::capability::<T>)?;
        self.write_length(data.len());
        self.write_bytes(&data);
        Ok(())
    }

    /// Writes `value` through its [`BinaryMarshal`] capability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capability`] if marshaling failed.
    pub fn write_binary<T: BinaryMarshal>(&mut self, value: &T) -> Result<()> {
        let data = value.marshal_binary().map_err(Error::capability::<T>)?;
        self.write_length(data.len());
        self.write_bytes(&data);
        Ok(())
    }

    /// Writes `value` through its [`NativeCodec`] capability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capability`] if the codec failed.
    pub fn write_native<T: NativeCodec>(&mut self, value: &T) -> Result<()> {
        value
            .encode_native(&mut self.buf)
            .map_err(Error::capability::<T>)
    }

    pub(crate) fn write_leb128<T: leb128::Leb128>(&mut self, value: T) {
        leb128::write(&mut self.buf, value);
    }
}
