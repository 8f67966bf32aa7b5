use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use thiserror::Error;

/// Type tags that prefix every value stored in a bytecode stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatumType {
    Uint8,
    Uint16_1,
    Uint32_1,
    Int16_1,
    Uint32_2,
    Float64_2,
    Int16_2,
    Float64_1,
    String,
    Uint16_2,
    Int32,
}

impl DatumType {
    pub fn from_raw(raw: u16) -> Option<Self> {
        let kind = match raw {
            0x0002 => Self::Uint8,
            0x0003 => Self::Uint16_1,
            0x0004 => Self::Uint32_1,
            0x0006 => Self::Int16_1,
            0x0007 => Self::Uint32_2,
            0x0009 => Self::Float64_2,
            0x0010 => Self::Int16_2,
            0x0011 => Self::Float64_1,
            0x0012 => Self::String,
            0x0013 => Self::Uint16_2,
            0x0014 => Self::Int32,
            _ => return None,
        };
        Some(kind)
    }

    pub fn raw(self) -> u16 {
        match self {
            Self::Uint8 => 0x0002,
            Self::Uint16_1 => 0x0003,
            Self::Uint32_1 => 0x0004,
            Self::Int16_1 => 0x0006,
            Self::Uint32_2 => 0x0007,
            Self::Float64_2 => 0x0009,
            Self::Int16_2 => 0x0010,
            Self::Float64_1 => 0x0011,
            Self::String => 0x0012,
            Self::Uint16_2 => 0x0013,
            Self::Int32 => 0x0014,
        }
    }

    /// Size in bytes of the payload that follows the tag; strings carry their
    /// own length prefix and report `None`.
    pub fn payload_len(self) -> Option<usize> {
        match self {
            Self::Uint8 => Some(1),
            Self::Uint16_1 | Self::Uint16_2 | Self::Int16_1 | Self::Int16_2 => Some(2),
            Self::Uint32_1 | Self::Uint32_2 | Self::Int32 => Some(4),
            Self::Float64_1 | Self::Float64_2 => Some(8),
            Self::String => None,
        }
    }
}

/// Error conditions raised while decoding typed datums.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatumError {
    #[error("bytecode truncated at offset {offset}: needed {needed} bytes, {available} left")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("unknown datum type {raw:#06x} at offset {offset}")]
    UnknownType { raw: u16, offset: usize },
    #[error("expected {expected} datum at offset {offset}, found {found:?}")]
    UnexpectedType {
        expected: &'static str,
        found: DatumType,
        offset: usize,
    },
}

/// One decoded datum, used by dump tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Datum {
    Unsigned(u32),
    Signed(i32),
    Double(f64),
    String(String),
}

/// Cursor over an immutable byte slice holding typed datums.
///
/// Nested chunks are handed out as sub-slices, so a reader for an inner block
/// never shares position state with its parent.
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], DatumError> {
        let available = self.remaining();
        if needed > available {
            return Err(DatumError::Truncated {
                offset: self.pos,
                needed,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    pub fn read_type(&mut self) -> Result<DatumType, DatumError> {
        let offset = self.pos;
        let raw = LittleEndian::read_u16(self.take(2)?);
        DatumType::from_raw(raw).ok_or(DatumError::UnknownType { raw, offset })
    }

    fn read_integer(&mut self, kind: DatumType) -> Result<Option<i64>, DatumError> {
        let value = match kind {
            DatumType::Uint8 => self.take(1)?[0] as i64,
            DatumType::Uint16_1 | DatumType::Uint16_2 => LittleEndian::read_u16(self.take(2)?) as i64,
            DatumType::Int16_1 | DatumType::Int16_2 => LittleEndian::read_i16(self.take(2)?) as i64,
            DatumType::Uint32_1 | DatumType::Uint32_2 => LittleEndian::read_u32(self.take(4)?) as i64,
            DatumType::Int32 => LittleEndian::read_i32(self.take(4)?) as i64,
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    pub fn read_typed_u16(&mut self) -> Result<u16, DatumError> {
        let offset = self.pos;
        let kind = self.read_type()?;
        match kind {
            DatumType::Uint8 => Ok(self.take(1)?[0] as u16),
            DatumType::Uint16_1 | DatumType::Uint16_2 => Ok(LittleEndian::read_u16(self.take(2)?)),
            found => Err(DatumError::UnexpectedType {
                expected: "uint16",
                found,
                offset,
            }),
        }
    }

    pub fn read_typed_u32(&mut self) -> Result<u32, DatumError> {
        let offset = self.pos;
        let kind = self.read_type()?;
        match kind {
            DatumType::Uint8 => Ok(self.take(1)?[0] as u32),
            DatumType::Uint16_1 | DatumType::Uint16_2 => {
                Ok(LittleEndian::read_u16(self.take(2)?) as u32)
            }
            DatumType::Uint32_1 | DatumType::Uint32_2 => Ok(LittleEndian::read_u32(self.take(4)?)),
            found => Err(DatumError::UnexpectedType {
                expected: "uint32",
                found,
                offset,
            }),
        }
    }

    pub fn read_typed_i32(&mut self) -> Result<i32, DatumError> {
        let offset = self.pos;
        let kind = self.read_type()?;
        match kind {
            DatumType::Uint8 => Ok(self.take(1)?[0] as i32),
            DatumType::Uint16_1 | DatumType::Uint16_2 => {
                Ok(LittleEndian::read_u16(self.take(2)?) as i32)
            }
            DatumType::Int16_1 | DatumType::Int16_2 => {
                Ok(LittleEndian::read_i16(self.take(2)?) as i32)
            }
            DatumType::Int32 => Ok(LittleEndian::read_i32(self.take(4)?)),
            found => Err(DatumError::UnexpectedType {
                expected: "int32",
                found,
                offset,
            }),
        }
    }

    pub fn read_typed_double(&mut self) -> Result<f64, DatumError> {
        let offset = self.pos;
        let kind = self.read_type()?;
        match kind {
            DatumType::Float64_1 | DatumType::Float64_2 => {
                Ok(LittleEndian::read_f64(self.take(8)?))
            }
            DatumType::String => Err(DatumError::UnexpectedType {
                expected: "float64",
                found: kind,
                offset,
            }),
            integer => match self.read_integer(integer)? {
                Some(value) => Ok(value as f64),
                None => Err(DatumError::UnexpectedType {
                    expected: "float64",
                    found: integer,
                    offset,
                }),
            },
        }
    }

    pub fn read_typed_string(&mut self) -> Result<String, DatumError> {
        let offset = self.pos;
        let kind = self.read_type()?;
        if kind != DatumType::String {
            return Err(DatumError::UnexpectedType {
                expected: "string",
                found: kind,
                offset,
            });
        }
        let len = LittleEndian::read_u16(self.take(2)?) as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Reads a length-prefixed chunk body and advances past it.
    pub fn read_chunk(&mut self) -> Result<&'a [u8], DatumError> {
        let len = self.read_typed_u32()? as usize;
        self.take(len)
    }

    /// Reads whatever datum comes next, for tooling that does not know the
    /// stream layout.
    pub fn read_any(&mut self) -> Result<(DatumType, Datum), DatumError> {
        let kind = self.read_type()?;
        let datum = match kind {
            DatumType::Float64_1 | DatumType::Float64_2 => {
                Datum::Double(LittleEndian::read_f64(self.take(8)?))
            }
            DatumType::String => {
                let len = LittleEndian::read_u16(self.take(2)?) as usize;
                Datum::String(String::from_utf8_lossy(self.take(len)?).into_owned())
            }
            DatumType::Int16_1 | DatumType::Int16_2 | DatumType::Int32 => {
                let value = self.read_integer(kind)?.unwrap_or_default();
                Datum::Signed(value as i32)
            }
            _ => {
                let value = self.read_integer(kind)?.unwrap_or_default();
                Datum::Unsigned(value as u32)
            }
        };
        Ok((kind, datum))
    }
}
