//! Whole-file writer: object tree to file bytes.
//!
//! The file is laid out as superblock, then every object header in
//! depth-first order (each symbol-table group followed by its heap, nodes
//! and B-tree), then raw dataset data. Header and group storage sizes do
//! not depend on addresses, so a first pass sizes everything and a second
//! pass writes it at the assigned addresses.

use crate::data_layout::DataLayout;
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::{FormatError, Result};
use crate::group_v1::{build_v1_group_storage, v1_group_storage_size, V1Child, V1GroupParams};
use crate::group_v2::group_info_message;
use crate::link_info::LinkInfoMessage;
use crate::link_message::LinkMessage;
use crate::message_type::MessageType;
use crate::object_header_writer::{ObjectHeaderWriter, MSG_FLAG_CONSTANT};
use crate::property_list::{FormatVersion, WriteOptions};
use crate::superblock::Superblock;
use crate::symbol_table::SymbolTableMessage;
use crate::tree::{DatasetNode, GroupNode, Node};

/// Offset and length width of written files.
pub const OFFSET_SIZE: u8 = 8;
pub const LENGTH_SIZE: u8 = 8;

/// Fill value message: allocate late, write fill value only if set, none defined.
const FILL_VALUE_V2: [u8; 4] = [2, 2, 2, 0];
const FILL_VALUE_V3: [u8; 2] = [3, 0x0a];

/// Encode `root` as a complete HDF5 file.
///
/// Fails with [`FormatError::Unsupported`] if the tree holds
/// [`Node::Unsupported`] objects or non-numeric datatypes.
pub fn write_tree(root: &GroupNode, opts: &WriteOptions) -> Result<Vec<u8>> {
    let mut items = Vec::new();
    flatten(root, &mut items)?;
    let writer = TreeWriter { opts, items };
    let bytes = writer.write()?;
    log::debug!(
        "encoded {} objects in {} bytes (superblock v{})",
        writer.items.len(),
        bytes.len(),
        opts.version.superblock_version()
    );
    Ok(bytes)
}

enum Object<'a> {
    Group(&'a GroupNode),
    Dataset(&'a DatasetNode),
}

struct Item<'a> {
    object: Object<'a>,
    /// (name, item index) of group members, in name order.
    members: Vec<(&'a str, usize)>,
}

fn flatten<'a>(group: &'a GroupNode, items: &mut Vec<Item<'a>>) -> Result<usize> {
    let index = items.len();
    items.push(Item { object: Object::Group(group), members: Vec::new() });

    let mut members = Vec::with_capacity(group.len());
    for (name, node) in group.iter() {
        let child = match node {
            Node::Group(g) => flatten(g, items)?,
            Node::Dataset(d) => {
                items.push(Item { object: Object::Dataset(d), members: Vec::new() });
                items.len() - 1
            }
            Node::Unsupported { reason } => {
                return Err(FormatError::Unsupported(format!("cannot write {name:?}: {reason}")))
            }
        };
        members.push((name, child));
    }
    items[index].members = members;
    Ok(index)
}

#[derive(Debug, Clone, Copy, Default)]
struct Placement {
    header: u64,
    /// Group storage (symbol-table groups) or raw data (datasets).
    body: Option<u64>,
}

struct TreeWriter<'a> {
    opts: &'a WriteOptions,
    items: Vec<Item<'a>>,
}

impl TreeWriter<'_> {
    fn symbol_tables(&self) -> bool {
        self.opts.version == FormatVersion::Earliest
    }

    fn group_params(&self) -> V1GroupParams {
        V1GroupParams {
            leaf_k: self.opts.create.sym_leaf_k,
            internal_k: self.opts.create.btree_k,
            offset_size: OFFSET_SIZE,
            length_size: LENGTH_SIZE,
        }
    }

    fn header(&self, index: usize, places: &[Placement], stab: Option<&SymbolTableMessage>) -> Result<ObjectHeaderWriter> {
        let version = self.opts.version;
        let mut oh = ObjectHeaderWriter::new(version.object_header_version());
        let item = &self.items[index];

        match item.object {
            Object::Group(_) if self.symbol_tables() => {
                let placeholder = SymbolTableMessage { btree_address: 0, local_heap_address: 0 };
                let stab = stab.unwrap_or(&placeholder);
                oh.add_message(MessageType::SymbolTable, stab.serialize(OFFSET_SIZE));
            }
            Object::Group(_) => {
                oh.add_message(MessageType::LinkInfo, LinkInfoMessage::serialize_compact(OFFSET_SIZE));
                oh.add_message(MessageType::GroupInfo, group_info_message());
                for &(name, child) in &item.members {
                    let link = LinkMessage::hard(name, places[child].header);
                    oh.add_message(MessageType::Link, link.serialize(OFFSET_SIZE)?);
                }
            }
            Object::Dataset(d) => {
                let space = d.dataspace.serialize(version.dataspace_version(), LENGTH_SIZE)?;
                oh.add_message(MessageType::Dataspace, space);
                oh.add_message_with_flags(MessageType::Datatype, d.datatype.serialize()?, MSG_FLAG_CONSTANT);
                match version {
                    FormatVersion::Earliest => oh.add_message_with_flags(
                        MessageType::FillValue,
                        FILL_VALUE_V2.to_vec(),
                        MSG_FLAG_CONSTANT,
                    ),
                    FormatVersion::Latest => oh.add_message_with_flags(
                        MessageType::FillValue,
                        FILL_VALUE_V3.to_vec(),
                        MSG_FLAG_CONSTANT,
                    ),
                }
                let layout = DataLayout::Contiguous {
                    address: places[index].body,
                    size: d.data().len() as u64,
                };
                let layout = layout.serialize(version.layout_version(), OFFSET_SIZE, LENGTH_SIZE)?;
                oh.add_message(MessageType::DataLayout, layout);
            }
        }
        Ok(oh)
    }

    /// First pass: assign every address. Returns placements and the end of file.
    fn place(&self) -> Result<(Vec<Placement>, u64)> {
        let dummy = vec![Placement::default(); self.items.len()];
        let params = self.group_params();
        let mut places = vec![Placement::default(); self.items.len()];
        let mut cursor = Superblock::encoded_size(self.opts.version.superblock_version(), OFFSET_SIZE) as u64;

        for (i, item) in self.items.iter().enumerate() {
            places[i].header = cursor;
            cursor += self.header(i, &dummy, None)?.encoded_size() as u64;
            if matches!(item.object, Object::Group(_)) && self.symbol_tables() {
                places[i].body = Some(cursor);
                let names = item.members.iter().map(|&(name, _)| name);
                cursor += v1_group_storage_size(names, &params) as u64;
            }
        }
        for (i, item) in self.items.iter().enumerate() {
            if let Object::Dataset(d) = item.object {
                if !d.data().is_empty() {
                    places[i].body = Some(cursor);
                    cursor += d.data().len() as u64;
                }
            }
        }
        Ok((places, cursor))
    }

    fn write(&self) -> Result<Vec<u8>> {
        let (places, eof) = self.place()?;
        let params = self.group_params();

        // Children come after their parent, so walking backwards builds every
        // child group's storage before the parent caches its address.
        let mut stabs: Vec<Option<SymbolTableMessage>> = vec![None; self.items.len()];
        let mut storage: Vec<Vec<u8>> = vec![Vec::new(); self.items.len()];
        if self.symbol_tables() {
            for (i, item) in self.items.iter().enumerate().rev() {
                let (Object::Group(_), Some(base)) = (&item.object, places[i].body) else {
                    continue;
                };
                let children: Vec<V1Child<'_>> = item
                    .members
                    .iter()
                    .map(|&(name, child)| V1Child {
                        name,
                        object_header_address: places[child].header,
                        cached_stab: stabs[child].clone(),
                    })
                    .collect();
                let (stab, bytes) = build_v1_group_storage(base, &children, &params)?;
                stabs[i] = Some(stab);
                storage[i] = bytes;
            }
        }

        let capacity = usize::try_from(eof).map_err(|_| FormatError::AddressOverflow(eof))?;
        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(&self.superblock(places[0].header, eof, stabs[0].clone()).serialize());

        for (i, stab) in stabs.iter().enumerate() {
            debug_assert_eq!(buf.len() as u64, places[i].header);
            buf.extend_from_slice(&self.header(i, &places, stab.as_ref())?.serialize()?);
            buf.extend_from_slice(&storage[i]);
        }
        for item in &self.items {
            if let Object::Dataset(d) = item.object {
                buf.extend_from_slice(d.data());
            }
        }
        debug_assert_eq!(buf.len() as u64, eof);
        log::trace!("root group header at {:#x}, eof {:#x}", places[0].header, eof);
        Ok(buf)
    }

    fn superblock(&self, root: u64, eof: u64, root_stab: Option<SymbolTableMessage>) -> Superblock {
        let early = self.symbol_tables();
        Superblock {
            version: self.opts.version.superblock_version(),
            offset_size: OFFSET_SIZE,
            length_size: LENGTH_SIZE,
            base_address: 0,
            eof_address: eof,
            root_group_address: root,
            group_leaf_node_k: early.then_some(self.opts.create.sym_leaf_k),
            group_internal_node_k: early.then_some(self.opts.create.btree_k),
            root_symbol_table: root_stab,
            consistency_flags: 0,
            superblock_extension_address: None,
        }
    }
}

/// Build a rank-1 dataset node from little-endian element bytes.
pub fn dataset_1d(datatype: Datatype, data: Vec<u8>) -> Result<DatasetNode> {
    let size = datatype.type_size().max(1) as usize;
    let len = (data.len() / size) as u64;
    DatasetNode::new(datatype, Dataspace::simple_1d(len), data)
}
