//! Whole-file reader: file bytes to [`FileTree`].

use std::collections::HashSet;

use crate::codec::to_usize;
use crate::data_layout::DataLayout;
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::{FormatError, Result};
use crate::group_v1::{resolve_v1_group_entries, GroupEntry};
use crate::group_v2::{group_kind, resolve_v2_group_entries, GroupKind};
use crate::link_message::LinkTarget;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;
use crate::property_list::{FileCreateProps, FormatVersion};
use crate::signature::find_signature;
use crate::superblock::Superblock;
use crate::symbol_table::SymbolTableMessage;
use crate::tree::{DatasetNode, FileTree, GroupNode, Node, Skipped};

/// Largest never-written contiguous dataset materialized as fill bytes.
const MAX_UNALLOCATED_BYTES: u64 = 1 << 30;

/// Parse a complete HDF5 file into an object tree.
///
/// Objects outside the supported subset become [`Node::Unsupported`] and
/// ignored messages (attributes, unknown types) are listed in
/// [`FileTree::skipped`]; neither is an error. Structural damage is.
pub fn read_tree(data: &[u8]) -> Result<FileTree> {
    let sig = find_signature(data)?;
    let sb = Superblock::parse(data, sig)?;
    // A user block prepended after writing leaves a stale base address;
    // the superblock position is authoritative.
    let base = if sb.base_address != sig as u64 {
        log::debug!("base address {:#x} differs from superblock at {sig}, using {sig}", sb.base_address);
        sig
    } else {
        to_usize(sb.base_address)?
    };
    let file = data.get(base..).ok_or(FormatError::UnexpectedEof {
        expected: base,
        available: data.len(),
    })?;
    log::debug!(
        "superblock v{} at {sig}: offsets {}, lengths {}, root group at {:#x}",
        sb.version,
        sb.offset_size,
        sb.length_size,
        sb.root_group_address
    );

    let version = if sb.version >= 2 { FormatVersion::Latest } else { FormatVersion::Earliest };
    let defaults = FileCreateProps::default();
    let create = FileCreateProps {
        sym_leaf_k: sb.group_leaf_node_k.unwrap_or(defaults.sym_leaf_k).max(1),
        btree_k: sb.group_internal_node_k.unwrap_or(defaults.btree_k).max(1),
    };

    let mut reader = TreeReader {
        file,
        offset_size: sb.offset_size,
        length_size: sb.length_size,
        visited: HashSet::new(),
        ancestors: Vec::new(),
        skipped: Vec::new(),
    };

    let root = match reader.read_object(sb.root_group_address, "/")? {
        Node::Group(g) => g,
        Node::Unsupported { reason } => {
            return Err(FormatError::Unsupported(format!("root group: {reason}")))
        }
        Node::Dataset(_) => return Err(FormatError::Unsupported("root object is a dataset".into())),
    };

    Ok(FileTree { version, create, root, skipped: reader.skipped })
}

struct TreeReader<'a> {
    file: &'a [u8],
    offset_size: u8,
    length_size: u8,
    visited: HashSet<u64>,
    ancestors: Vec<u64>,
    skipped: Vec<Skipped>,
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn unsupported(reason: impl Into<String>) -> Node {
    Node::Unsupported { reason: reason.into() }
}

impl TreeReader<'_> {
    fn skip(&mut self, path: &str, reason: impl Into<String>) {
        let reason = reason.into();
        log::trace!("{path}: skipped {reason}");
        self.skipped.push(Skipped { path: path.to_owned(), reason });
    }

    fn read_object(&mut self, address: u64, path: &str) -> Result<Node> {
        if self.ancestors.contains(&address) {
            return Ok(unsupported("hard link cycle"));
        }
        if !self.visited.insert(address) {
            return Ok(unsupported(format!("second hard link to object at {address:#x}")));
        }

        let header =
            ObjectHeader::parse(self.file, to_usize(address)?, self.offset_size, self.length_size)?;
        log::trace!("{path}: v{} header at {address:#x}, {} messages", header.version, header.messages.len());

        match group_kind(&header) {
            Some(kind) => {
                self.note_messages(&header, path, |t| matches!(t, MessageType::Link));
                self.ancestors.push(address);
                let group = self.read_group(&header, kind, path);
                self.ancestors.pop();
                group
            }
            None if header.find(MessageType::DataLayout).is_some() => {
                self.note_messages(&header, path, |t| {
                    matches!(t, MessageType::Dataspace | MessageType::Datatype | MessageType::DataLayout)
                });
                self.read_dataset(&header, path)
            }
            None if header.find(MessageType::Datatype).is_some() => Ok(unsupported("named datatype")),
            None => Ok(unsupported("unrecognized object")),
        }
    }

    /// Record messages the tree cannot carry.
    fn note_messages(&mut self, header: &ObjectHeader, path: &str, expected: impl Fn(MessageType) -> bool) {
        let ignored: Vec<String> = header
            .messages
            .iter()
            .filter(|m| !m.msg_type.is_bookkeeping() && !expected(m.msg_type))
            .filter(|m| {
                // handled when the dataset itself is read
                !matches!(m.msg_type, MessageType::FilterPipeline | MessageType::ExternalFileList)
            })
            .map(|m| match m.msg_type {
                MessageType::Attribute | MessageType::AttributeInfo => "attributes".to_owned(),
                other => format!("message type {:#06x}", other.to_u16()),
            })
            .collect();
        for reason in ignored {
            self.skip(path, reason);
        }
    }

    fn read_group(&mut self, header: &ObjectHeader, kind: GroupKind, path: &str) -> Result<Node> {
        let entries = match kind {
            GroupKind::SymbolTable => {
                let msg = header
                    .find(MessageType::SymbolTable)
                    .ok_or(FormatError::MissingMessage("symbol table"))?;
                let stab = SymbolTableMessage::parse(&msg.data, self.offset_size)?;
                resolve_v1_group_entries(self.file, &stab, self.offset_size, self.length_size)
            }
            GroupKind::Links => resolve_v2_group_entries(header, self.offset_size),
        };
        let entries = match entries {
            Ok(entries) => entries,
            Err(FormatError::Unsupported(reason)) => return Ok(unsupported(reason)),
            Err(e) => return Err(e),
        };

        let mut group = GroupNode::new();
        for GroupEntry { name, target } in entries {
            let path = child_path(path, &name);
            let node = match target {
                LinkTarget::Hard { object_header_address } => {
                    self.read_object(object_header_address, &path)?
                }
                LinkTarget::Soft { target_path } => unsupported(format!("soft link to {target_path}")),
                LinkTarget::External { link_type } => {
                    unsupported(format!("link of type {link_type}"))
                }
            };
            if let Node::Unsupported { reason } = &node {
                let reason = reason.clone();
                self.skip(&path, reason);
            }
            if !group.insert(name, node) {
                self.skip(&path, "duplicate link name");
            }
        }
        Ok(Node::Group(group))
    }

    fn read_dataset(&mut self, header: &ObjectHeader, path: &str) -> Result<Node> {
        if header.find(MessageType::FilterPipeline).is_some() {
            return Ok(unsupported("filtered dataset"));
        }
        if header.find(MessageType::ExternalFileList).is_some() {
            return Ok(unsupported("external storage"));
        }

        let space_msg = header
            .find(MessageType::Dataspace)
            .ok_or(FormatError::MissingMessage("dataspace"))?;
        let type_msg = header
            .find(MessageType::Datatype)
            .ok_or(FormatError::MissingMessage("datatype"))?;
        let layout_msg = header
            .find(MessageType::DataLayout)
            .ok_or(FormatError::MissingMessage("data layout"))?;
        if space_msg.is_shared() || type_msg.is_shared() {
            return Ok(unsupported("shared message"));
        }

        let dataspace = Dataspace::parse(&space_msg.data, self.length_size)?;
        let datatype = Datatype::parse(&type_msg.data)?;
        let layout = DataLayout::parse(&layout_msg.data, self.offset_size, self.length_size)?;

        let expected = dataspace
            .num_elements()
            .checked_mul(datatype.type_size() as u64)
            .ok_or(FormatError::TooLarge("dataset"))?;
        let expected_len = to_usize(expected)?;

        let data = match layout {
            DataLayout::Compact { data } => data,
            // never written: reads as the default fill value
            DataLayout::Contiguous { address: None, .. } => {
                if expected > MAX_UNALLOCATED_BYTES {
                    return Err(FormatError::TooLarge("unallocated dataset"));
                }
                vec![0u8; expected_len]
            }
            DataLayout::Contiguous { address: Some(addr), size } => {
                if size < expected {
                    return Err(FormatError::DataSizeMismatch { expected, actual: size });
                }
                let start = to_usize(addr)?;
                let end = start.checked_add(expected_len).ok_or(FormatError::AddressOverflow(addr))?;
                self.file
                    .get(start..end)
                    .ok_or(FormatError::UnexpectedEof { expected: end, available: self.file.len() })?
                    .to_vec()
            }
            other => return Ok(unsupported(format!("{} storage", other.kind()))),
        };

        if let Datatype::Other { .. } = datatype {
            self.skip(path, format!("{} datatype", datatype.class_name()));
        }
        log::trace!("{path}: {} dataset, shape {:?}", datatype.class_name(), dataspace.dimensions);
        Ok(Node::Dataset(DatasetNode::new(datatype, dataspace, data)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_writer::write_tree;
    use crate::object_header_writer::ObjectHeaderWriter;
    use crate::property_list::WriteOptions;

    #[test]
    fn not_hdf5() {
        assert_eq!(read_tree(b"plain text, not a container"), Err(FormatError::SignatureNotFound));
    }

    #[test]
    fn empty_file_both_versions() {
        for version in [FormatVersion::Earliest, FormatVersion::Latest] {
            let opts = WriteOptions { version, ..Default::default() };
            let bytes = write_tree(&GroupNode::new(), &opts).unwrap();
            let tree = read_tree(&bytes).unwrap();
            assert_eq!(tree.version, version);
            assert!(tree.root.is_empty());
            assert!(tree.is_lossless());
        }
    }

    #[test]
    fn bare_header_is_unrecognized() {
        let mut writer = ObjectHeaderWriter::new(2);
        writer.add_message(MessageType::ObjectModificationTime, vec![1, 0, 0, 0, 0, 0, 0, 0]);
        let bytes = writer.serialize().unwrap();

        let mut reader = TreeReader {
            file: &bytes,
            offset_size: 8,
            length_size: 8,
            visited: HashSet::new(),
            ancestors: Vec::new(),
            skipped: Vec::new(),
        };
        assert_eq!(reader.read_object(0, "/bare").unwrap(), unsupported("unrecognized object"));
        // a second link to the same header is reported, not followed
        assert!(matches!(
            reader.read_object(0, "/again").unwrap(),
            Node::Unsupported { reason } if reason.starts_with("second hard link")
        ));
    }

    #[test]
    fn child_paths() {
        assert_eq!(child_path("/", "a"), "/a");
        assert_eq!(child_path("/a", "b"), "/a/b");
    }
}
