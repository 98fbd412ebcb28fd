//! Structural CBOR reader.
//!
//! Covers exactly the shapes found in attestation objects, authenticator data
//! and COSE keys: unsigned and negative integers, byte strings, text strings
//! and maps. Arrays are understood only so that opaque values (an attestation
//! statement's certificate chain) can be skipped. Lengths are accepted inline
//! or with one or two extra bytes; anything else is rejected.
//!
//! The reader walks items positionally. Callers pull one key and one value at
//! a time, so a field name appearing inside some other value can never be
//! mistaken for a map key.

use thiserror::Error;

/// Deepest nesting accepted when skipping over opaque values.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Structural decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),

    #[error("unexpected major type {found} at offset {offset}")]
    UnexpectedType { offset: usize, found: u8 },

    #[error("unsupported additional info {info} at offset {offset}")]
    UnsupportedLength { offset: usize, info: u8 },

    #[error("text string at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),

    #[error("nesting deeper than {MAX_NESTING_DEPTH} levels")]
    TooDeep,

    #[error("{0} trailing bytes after the last item")]
    TrailingBytes(usize),
}

/// CBOR major types this reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorType {
    Unsigned = 0,
    Negative = 1,
    Bytes = 2,
    Text = 3,
    Array = 4,
    Map = 5,
}

impl MajorType {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Unsigned),
            1 => Some(Self::Negative),
            2 => Some(Self::Bytes),
            3 => Some(Self::Text),
            4 => Some(Self::Array),
            5 => Some(Self::Map),
            _ => None,
        }
    }
}

/// Decoded initial byte plus its length/value argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: MajorType,
    pub arg: u16,
}

/// A map key: COSE keys use integer labels, attestation objects use text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKey<'a> {
    Int(i64),
    Text(&'a str),
}

/// Forward-only reader over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct CborReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> CborReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::Truncated(self.pos))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Major type of the next item without consuming it.
    pub fn peek_major(&self) -> Result<MajorType, DecodeError> {
        let initial = *self
            .buf
            .get(self.pos)
            .ok_or(DecodeError::Truncated(self.pos))?;
        MajorType::from_bits(initial >> 5).ok_or(DecodeError::UnexpectedType {
            offset: self.pos,
            found: initial >> 5,
        })
    }

    pub fn read_header(&mut self) -> Result<Header, DecodeError> {
        let offset = self.pos;
        let initial = self.take(1)?[0];
        let major = MajorType::from_bits(initial >> 5).ok_or(DecodeError::UnexpectedType {
            offset,
            found: initial >> 5,
        })?;

        let arg = match initial & 0x1f {
            info @ 0..=23 => u16::from(info),
            24 => u16::from(self.take(1)?[0]),
            25 => {
                let b = self.take(2)?;
                u16::from_be_bytes([b[0], b[1]])
            }
            info => return Err(DecodeError::UnsupportedLength { offset, info }),
        };

        Ok(Header { major, arg })
    }

    fn expect(&mut self, major: MajorType) -> Result<u16, DecodeError> {
        let offset = self.pos;
        let header = self.read_header()?;
        if header.major != major {
            return Err(DecodeError::UnexpectedType {
                offset,
                found: header.major as u8,
            });
        }
        Ok(header.arg)
    }

    /// Read a map header and return its number of key/value pairs.
    pub fn read_map_len(&mut self) -> Result<usize, DecodeError> {
        self.expect(MajorType::Map).map(usize::from)
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.expect(MajorType::Bytes)?;
        self.take(usize::from(len))
    }

    pub fn read_text(&mut self) -> Result<&'a str, DecodeError> {
        let offset = self.pos;
        let len = self.expect(MajorType::Text)?;
        let raw = self.take(usize::from(len))?;
        std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8(offset))
    }

    /// Read an unsigned or negative integer.
    pub fn read_int(&mut self) -> Result<i64, DecodeError> {
        let offset = self.pos;
        let header = self.read_header()?;
        match header.major {
            MajorType::Unsigned => Ok(i64::from(header.arg)),
            MajorType::Negative => Ok(-1 - i64::from(header.arg)),
            other => Err(DecodeError::UnexpectedType {
                offset,
                found: other as u8,
            }),
        }
    }

    pub fn read_key(&mut self) -> Result<MapKey<'a>, DecodeError> {
        match self.peek_major()? {
            MajorType::Unsigned | MajorType::Negative => self.read_int().map(MapKey::Int),
            MajorType::Text => self.read_text().map(MapKey::Text),
            other => Err(DecodeError::UnexpectedType {
                offset: self.pos,
                found: other as u8,
            }),
        }
    }

    /// Consume the next complete item, including everything nested in it.
    pub fn skip_item(&mut self) -> Result<(), DecodeError> {
        self.skip_nested(0)
    }

    fn skip_nested(&mut self, depth: usize) -> Result<(), DecodeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(DecodeError::TooDeep);
        }
        let header = self.read_header()?;
        match header.major {
            MajorType::Unsigned | MajorType::Negative => Ok(()),
            MajorType::Bytes | MajorType::Text => self.take(usize::from(header.arg)).map(drop),
            MajorType::Array => {
                for _ in 0..header.arg {
                    self.skip_nested(depth + 1)?;
                }
                Ok(())
            }
            MajorType::Map => {
                for _ in 0..header.arg {
                    self.skip_nested(depth + 1)?;
                    self.skip_nested(depth + 1)?;
                }
                Ok(())
            }
        }
    }

    /// Consume the next item and return the raw bytes it spans.
    pub fn read_raw_item(&mut self) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        self.skip_item()?;
        Ok(&self.buf[start..self.pos])
    }

    /// Fail if any input is left unread.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}
