use byteorder::{LittleEndian, WriteBytesExt};

use crate::datum::DatumType;

/// Builds typed datum streams in the layout `ChunkReader` expects.
#[derive(Debug, Default, Clone)]
pub struct ChunkWriter {
    bytes: Vec<u8>,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn write_type(&mut self, kind: DatumType) {
        // Writing into a Vec cannot fail.
        let _ = self.bytes.write_u16::<LittleEndian>(kind.raw());
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_type(DatumType::Uint8);
        self.bytes.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_type(DatumType::Uint16_1);
        let _ = self.bytes.write_u16::<LittleEndian>(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_type(DatumType::Uint32_1);
        let _ = self.bytes.write_u32::<LittleEndian>(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_type(DatumType::Int16_1);
        let _ = self.bytes.write_i16::<LittleEndian>(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_type(DatumType::Int32);
        let _ = self.bytes.write_i32::<LittleEndian>(value);
    }

    pub fn write_double(&mut self, value: f64) {
        self.write_type(DatumType::Float64_1);
        let _ = self.bytes.write_f64::<LittleEndian>(value);
    }

    /// Strings longer than `u16::MAX` bytes are truncated.
    pub fn write_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        let len = bytes.len().min(u16::MAX as usize);
        self.write_type(DatumType::String);
        let _ = self.bytes.write_u16::<LittleEndian>(len as u16);
        self.bytes.extend_from_slice(&bytes[..len]);
    }

    /// Writes a nested chunk: typed length followed by the body.
    pub fn write_chunk(&mut self, body: &[u8]) {
        self.write_u32(body.len() as u32);
        self.bytes.extend_from_slice(body);
    }

    pub fn append_raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }
}
