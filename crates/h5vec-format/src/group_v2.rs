//! Link-message groups (compact storage) and group kind detection.

use crate::error::{FormatError, Result};
use crate::group_v1::GroupEntry;
use crate::link_info::LinkInfoMessage;
use crate::link_message::LinkMessage;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;

/// How a group object stores its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Symbol Table message: local heap + v1 B-tree.
    SymbolTable,
    /// Link Info message with Link messages in the header.
    Links,
}

/// Classify an object header as a group, or `None` if it is not one.
pub fn group_kind(header: &ObjectHeader) -> Option<GroupKind> {
    if header.find(MessageType::SymbolTable).is_some() {
        Some(GroupKind::SymbolTable)
    } else if header.find(MessageType::LinkInfo).is_some() || header.find(MessageType::Link).is_some() {
        Some(GroupKind::Links)
    } else {
        None
    }
}

/// Resolve the members of a link-message group.
///
/// Dense storage (fractal heap + v2 B-tree) is not supported.
pub fn resolve_v2_group_entries(header: &ObjectHeader, offset_size: u8) -> Result<Vec<GroupEntry>> {
    if let Some(msg) = header.find(MessageType::LinkInfo) {
        let info = LinkInfoMessage::parse(&msg.data, offset_size)?;
        if info.is_dense() {
            return Err(FormatError::Unsupported("dense link storage".into()));
        }
    }

    let mut entries = header
        .find_all(MessageType::Link)
        .map(|msg| {
            LinkMessage::parse(&msg.data, offset_size)
                .map(|link| GroupEntry { name: link.name, target: link.target })
        })
        .collect::<Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Group Info message (type 0x000A) with no stored phase-change values.
pub fn group_info_message() -> Vec<u8> {
    vec![0u8, 0]
}
