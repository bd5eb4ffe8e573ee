//! Big-endian encoding of the values exchanged with the simulator.

use crate::constants::{TYPE_COMPOUND, TYPE_INTEGER, TYPE_STRING, TYPE_STRINGLIST};
use crate::error::TraciError;

#[derive(Debug, Default)]
pub struct StorageWriter {
    buf: Vec<u8>,
}

impl StorageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn write_string(&mut self, value: &str) -> &mut Self {
        self.write_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn write_typed_string(&mut self, value: &str) -> &mut Self {
        self.write_u8(TYPE_STRING).write_string(value)
    }

    pub fn write_typed_int(&mut self, value: i32) -> &mut Self {
        self.write_u8(TYPE_INTEGER).write_i32(value)
    }

    pub fn write_typed_string_list<S: AsRef<str>>(&mut self, values: &[S]) -> &mut Self {
        self.write_u8(TYPE_STRINGLIST);
        self.write_len(values.len());
        values.iter().for_each(|value| {
            self.write_string(value.as_ref());
        });
        self
    }

    pub fn write_compound_header(&mut self, items: usize) -> &mut Self {
        self.write_u8(TYPE_COMPOUND);
        self.write_len(items);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_len(&mut self, len: usize) {
        // Lengths beyond i32::MAX cannot be expressed on the wire; such payloads are
        // never built for a single vehicle.
        let len = i32::try_from(len).unwrap_or(i32::MAX);
        self.write_i32(len);
    }
}

/// Cursor over a received message.
#[derive(Debug)]
pub struct Storage {
    buf: Vec<u8>,
    pos: usize,
}

impl Storage {
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8, TraciError> {
        let bytes = self.take(1)?;
        Ok(bytes[0])
    }

    pub fn read_i32(&mut self) -> Result<i32, TraciError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64, TraciError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_be_bytes(raw))
    }

    pub fn read_string(&mut self) -> Result<String, TraciError> {
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| TraciError::Protocol(format!("invalid utf8 string: {}", e)))
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>, TraciError> {
        let count = self.read_len()?;
        (0..count).map(|_| self.read_string()).collect()
    }

    /// Reads a value type tag and fails unless it is `expected`.
    pub fn expect_type(&mut self, expected: u8) -> Result<(), TraciError> {
        let found = self.read_u8()?;
        if found != expected {
            return Err(TraciError::Protocol(format!(
                "expected value type 0x{:02x}, found 0x{:02x}",
                expected, found
            )));
        }
        Ok(())
    }

    /// Reads a command length: one byte, or a zero byte followed by a 32-bit length.
    /// Returns the length of the remaining command body.
    pub fn read_command_length(&mut self) -> Result<usize, TraciError> {
        let short = self.read_u8()?;
        if short > 0 {
            return Ok(usize::from(short) - 1);
        }
        let long = self.read_len()?;
        long.checked_sub(5)
            .ok_or_else(|| TraciError::Protocol(format!("invalid command length {}", long)))
    }

    pub fn skip(&mut self, count: usize) -> Result<(), TraciError> {
        self.take(count).map(|_| ())
    }

    fn read_len(&mut self) -> Result<usize, TraciError> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| TraciError::Protocol(format!("negative length {}", len)))
    }

    fn take(&mut self, count: usize) -> Result<&[u8], TraciError> {
        if self.remaining() < count {
            return Err(TraciError::Protocol(format!(
                "needed {} bytes at offset {}, only {} left",
                count,
                self.pos,
                self.remaining()
            )));
        }
        let start = self.pos;
        self.pos += count;
        Ok(&self.buf[start..self.pos])
    }
}
