//! Object header writer for v1 and v2 headers.

use crate::checksum::jenkins_lookup3;
use crate::codec::{align8, write_uint};
use crate::error::{FormatError, Result};
use crate::message_type::MessageType;

/// Message flag: the message content never changes.
pub const MSG_FLAG_CONSTANT: u8 = 0x01;

/// Collects header messages and encodes them as a single-chunk header.
#[derive(Debug, Clone)]
pub struct ObjectHeaderWriter {
    version: u8,
    messages: Vec<(MessageType, Vec<u8>, u8)>,
}

impl ObjectHeaderWriter {
    /// A writer for header version 1 or 2.
    pub fn new(version: u8) -> Self {
        Self { version, messages: Vec::new() }
    }

    /// Add a message with flags 0.
    pub fn add_message(&mut self, msg_type: MessageType, data: Vec<u8>) {
        self.messages.push((msg_type, data, 0));
    }

    /// Add a message with specific flags.
    pub fn add_message_with_flags(&mut self, msg_type: MessageType, data: Vec<u8>, flags: u8) {
        self.messages.push((msg_type, data, flags));
    }

    fn chunk_size(&self) -> usize {
        match self.version {
            1 => self.messages.iter().map(|(_, d, _)| 8 + align8(d.len())).sum(),
            _ => self.messages.iter().map(|(_, d, _)| 4 + d.len()).sum(),
        }
    }

    fn size_field_width(chunk: usize) -> (u8, u8) {
        if chunk <= 0xFF {
            (0, 1)
        } else if chunk <= 0xFFFF {
            (1, 2)
        } else if chunk <= 0xFFFF_FFFF {
            (2, 4)
        } else {
            (3, 8)
        }
    }

    /// Size of [`ObjectHeaderWriter::serialize`] output.
    pub fn encoded_size(&self) -> usize {
        let chunk = self.chunk_size();
        match self.version {
            1 => 16 + chunk,
            _ => 6 + Self::size_field_width(chunk).1 as usize + chunk + 4,
        }
    }

    /// Encode the header.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        match self.version {
            1 => self.serialize_v1(),
            2 => self.serialize_v2(),
            version => Err(FormatError::InvalidVersion { structure: "object header", version }),
        }
    }

    fn serialize_v1(&self) -> Result<Vec<u8>> {
        let chunk = u32::try_from(self.chunk_size())
            .map_err(|_| FormatError::TooLarge("object header"))?;
        let count = u16::try_from(self.messages.len())
            .map_err(|_| FormatError::TooLarge("object header"))?;

        let mut buf = Vec::with_capacity(self.encoded_size());
        buf.push(1);
        buf.push(0);
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes()); // reference count
        buf.extend_from_slice(&chunk.to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]); // messages start 8-aligned

        for (msg_type, data, flags) in &self.messages {
            let padded = align8(data.len());
            let size = u16::try_from(padded).map_err(|_| FormatError::TooLarge("header message"))?;
            buf.extend_from_slice(&msg_type.to_u16().to_le_bytes());
            buf.extend_from_slice(&size.to_le_bytes());
            buf.push(*flags);
            buf.extend_from_slice(&[0u8; 3]);
            buf.extend_from_slice(data);
            buf.resize(buf.len() + padded - data.len(), 0);
        }
        Ok(buf)
    }

    fn serialize_v2(&self) -> Result<Vec<u8>> {
        let chunk = self.chunk_size();
        let (width_bits, width) = Self::size_field_width(chunk);

        let mut buf = Vec::with_capacity(self.encoded_size());
        buf.extend_from_slice(b"OHDR");
        buf.push(2);
        buf.push(width_bits);
        write_uint(&mut buf, chunk as u64, width);

        for (msg_type, data, flags) in &self.messages {
            let id = u8::try_from(msg_type.to_u16())
                .map_err(|_| FormatError::UnsupportedMessage(msg_type.to_u16()))?;
            let size = u16::try_from(data.len()).map_err(|_| FormatError::TooLarge("header message"))?;
            buf.push(id);
            buf.extend_from_slice(&size.to_le_bytes());
            buf.push(*flags);
            buf.extend_from_slice(data);
        }

        let checksum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        Ok(buf)
    }
}
