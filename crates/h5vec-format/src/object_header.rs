//! HDF5 object header parsing (v1 and v2), following continuation chunks.

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum::jenkins_lookup3;
use crate::codec::{ensure_len, read_u16, read_u32, read_uint, to_usize};
use crate::error::{FormatError, Result};
use crate::message_type::MessageType;

const OHDR_SIGNATURE: &[u8; 4] = b"OHDR";
const OCHK_SIGNATURE: &[u8; 4] = b"OCHK";

/// Message flag: message data lives in the shared object header message heap.
pub const MSG_FLAG_SHARED: u8 = 0x02;
/// Message flag: fail to open the object if the message type is unknown.
pub const MSG_FLAG_FAIL_IF_UNKNOWN: u8 = 0x80;

/// v2 header flag: messages carry a creation-order field.
pub const OH_FLAG_ATTR_CREATION_ORDER: u8 = 0x04;
/// v2 header flag: attribute phase-change values are stored.
pub const OH_FLAG_ATTR_PHASE_CHANGE: u8 = 0x10;
/// v2 header flag: access, modification, change, and birth times are stored.
pub const OH_FLAG_TIMES: u8 = 0x20;

/// Upper bound on continuation chunks followed for one header.
const MAX_CHUNKS: usize = 1024;

/// A single parsed header message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMessage {
    pub msg_type: MessageType,
    /// Message flags byte.
    pub flags: u8,
    /// Creation order (v2 only, when tracked).
    pub creation_order: Option<u16>,
    /// Raw message body.
    pub data: Vec<u8>,
}

impl HeaderMessage {
    pub fn is_shared(&self) -> bool {
        self.flags & MSG_FLAG_SHARED != 0
    }
}

/// The four v2 object timestamps, in seconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectTimes {
    pub access: u32,
    pub modification: u32,
    pub change: u32,
    pub birth: u32,
}

/// Parsed HDF5 object header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    /// Header version (1 or 2).
    pub version: u8,
    /// All messages from all chunks, minus NIL and continuation messages.
    pub messages: Vec<HeaderMessage>,
    /// Hard link count. Version 2 headers store 1 implicitly.
    pub reference_count: u32,
    /// Header flags (v2 only; 0 for v1).
    pub flags: u8,
    /// Stored timestamps (v2, when [`OH_FLAG_TIMES`] is set).
    pub times: Option<ObjectTimes>,
}

impl ObjectHeader {
    /// Parse an object header at the given offset.
    ///
    /// Unknown messages are kept as [`MessageType::Unknown`] unless flagged
    /// [`MSG_FLAG_FAIL_IF_UNKNOWN`], which is an error.
    pub fn parse(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader> {
        ensure_len(data, offset, 4)?;
        if &data[offset..offset + 4] == OHDR_SIGNATURE {
            Self::parse_v2(data, offset, offset_size, length_size)
        } else {
            Self::parse_v1(data, offset, offset_size, length_size)
        }
    }

    /// First message of the given type.
    pub fn find(&self, msg_type: MessageType) -> Option<&HeaderMessage> {
        self.messages.iter().find(|m| m.msg_type == msg_type)
    }

    /// All messages of the given type, in header order.
    pub fn find_all(&self, msg_type: MessageType) -> impl Iterator<Item = &HeaderMessage> {
        self.messages.iter().filter(move |m| m.msg_type == msg_type)
    }

    fn parse_v1(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader> {
        // version, reserved, message count, reference count, chunk size, 4 pad bytes
        ensure_len(data, offset, 16)?;
        let version = data[offset];
        if version != 1 {
            return Err(FormatError::InvalidVersion { structure: "object header", version });
        }
        let num_messages = read_u16(data, offset + 2)? as usize;
        let reference_count = read_u32(data, offset + 4)?;
        let chunk_size = read_u32(data, offset + 8)? as usize;

        let mut messages = Vec::new();
        let mut chunks = vec![(offset + 16, chunk_size)];
        let mut seen = 0usize;
        let mut followed = 0usize;

        while let Some((start, len)) = chunks.pop() {
            followed += 1;
            if followed > MAX_CHUNKS {
                return Err(FormatError::Unsupported("object header continuation loop".into()));
            }
            ensure_len(data, start, len)?;
            let end = start + len;
            let mut pos = start;

            while pos + 8 <= end && seen < num_messages {
                let raw_type = LittleEndian::read_u16(&data[pos..pos + 2]);
                let size = LittleEndian::read_u16(&data[pos + 2..pos + 4]) as usize;
                let flags = data[pos + 4];
                pos += 8;
                if pos + size > end {
                    return Err(FormatError::UnexpectedEof { expected: pos + size, available: end });
                }
                seen += 1;
                let body = &data[pos..pos + size];
                pos += size;

                let msg_type = classify(raw_type, flags)?;
                match msg_type {
                    MessageType::Nil => {}
                    MessageType::ObjectHeaderContinuation => {
                        chunks.push(continuation_target(body, offset_size, length_size)?);
                    }
                    _ => messages.push(HeaderMessage {
                        msg_type,
                        flags,
                        creation_order: None,
                        data: body.to_vec(),
                    }),
                }
            }
        }

        Ok(ObjectHeader {
            version: 1,
            messages,
            reference_count,
            flags: 0,
            times: None,
        })
    }

    fn parse_v2(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader> {
        ensure_len(data, offset, 6)?;
        let version = data[offset + 4];
        if version != 2 {
            return Err(FormatError::InvalidVersion { structure: "object header", version });
        }
        let flags = data[offset + 5];
        let mut pos = offset + 6;

        let times = if flags & OH_FLAG_TIMES != 0 {
            ensure_len(data, pos, 16)?;
            let t = ObjectTimes {
                access: LittleEndian::read_u32(&data[pos..]),
                modification: LittleEndian::read_u32(&data[pos + 4..]),
                change: LittleEndian::read_u32(&data[pos + 8..]),
                birth: LittleEndian::read_u32(&data[pos + 12..]),
            };
            pos += 16;
            Some(t)
        } else {
            None
        };
        if flags & OH_FLAG_ATTR_PHASE_CHANGE != 0 {
            // max compact / min dense attribute counts
            pos += 4;
        }

        let width = 1u8 << (flags & 0x03);
        let chunk0_size = to_usize(read_uint(data, pos, width)?)?;
        pos += width as usize;

        let chunk0_end = pos
            .checked_add(chunk0_size)
            .ok_or(FormatError::AddressOverflow(chunk0_size as u64))?;
        verify_checksum(data, offset, chunk0_end, "object header")?;

        let with_order = flags & OH_FLAG_ATTR_CREATION_ORDER != 0;
        let mut messages = Vec::new();
        let mut chunks = Vec::new();
        parse_v2_messages(
            data,
            pos,
            chunk0_end,
            with_order,
            (offset_size, length_size),
            &mut messages,
            &mut chunks,
        )?;

        let mut followed = 0usize;
        while let Some((start, len)) = chunks.pop() {
            followed += 1;
            if followed > MAX_CHUNKS {
                return Err(FormatError::Unsupported("object header continuation loop".into()));
            }
            if len < 8 {
                return Err(FormatError::UnexpectedEof { expected: 8, available: len });
            }
            ensure_len(data, start, len)?;
            if &data[start..start + 4] != OCHK_SIGNATURE {
                return Err(FormatError::InvalidSignature { structure: "OCHK" });
            }
            let checksum_pos = start + len - 4;
            verify_checksum(data, start, checksum_pos, "object header continuation")?;
            parse_v2_messages(
                data,
                start + 4,
                checksum_pos,
                with_order,
                (offset_size, length_size),
                &mut messages,
                &mut chunks,
            )?;
        }

        Ok(ObjectHeader {
            version: 2,
            messages,
            reference_count: 1,
            flags,
            times,
        })
    }
}

fn classify(raw_type: u16, flags: u8) -> Result<MessageType> {
    let msg_type = MessageType::from_u16(raw_type);
    if let MessageType::Unknown(id) = msg_type {
        if flags & MSG_FLAG_FAIL_IF_UNKNOWN != 0 {
            return Err(FormatError::UnsupportedMessage(id));
        }
    }
    Ok(msg_type)
}

fn continuation_target(body: &[u8], offset_size: u8, length_size: u8) -> Result<(usize, usize)> {
    let addr = read_uint(body, 0, offset_size)?;
    let len = read_uint(body, offset_size as usize, length_size)?;
    Ok((to_usize(addr)?, to_usize(len)?))
}

/// Check the lookup3 checksum stored right after `data[start..end]`.
fn verify_checksum(data: &[u8], start: usize, end: usize, structure: &'static str) -> Result<()> {
    let stored = read_u32(data, end)?;
    let computed = jenkins_lookup3(&data[start..end]);
    if stored != computed {
        return Err(FormatError::ChecksumMismatch { structure, expected: stored, computed });
    }
    Ok(())
}

fn parse_v2_messages(
    data: &[u8],
    start: usize,
    end: usize,
    with_order: bool,
    (offset_size, length_size): (u8, u8),
    messages: &mut Vec<HeaderMessage>,
    chunks: &mut Vec<(usize, usize)>,
) -> Result<()> {
    let prefix = if with_order { 6 } else { 4 };
    let mut pos = start;

    // A gap smaller than a message prefix may trail the last message.
    while pos + prefix <= end {
        let raw_type = data[pos] as u16;
        let size = LittleEndian::read_u16(&data[pos + 1..pos + 3]) as usize;
        let flags = data[pos + 3];
        let creation_order = with_order.then(|| LittleEndian::read_u16(&data[pos + 4..pos + 6]));
        pos += prefix;
        if pos + size > end {
            return Err(FormatError::UnexpectedEof { expected: pos + size, available: end });
        }
        let body = &data[pos..pos + size];
        pos += size;

        let msg_type = classify(raw_type, flags)?;
        match msg_type {
            MessageType::Nil => {}
            MessageType::ObjectHeaderContinuation => {
                chunks.push(continuation_target(body, offset_size, length_size)?);
            }
            _ => messages.push(HeaderMessage {
                msg_type,
                flags,
                creation_order,
                data: body.to_vec(),
            }),
        }
    }
    Ok(())
}
