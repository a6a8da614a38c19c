//! Symbol-table groups: resolve their entries and build their storage.
//!
//! A symbol-table group keeps link names in a local heap, entries in
//! symbol table nodes, and indexes the nodes with a type-0 v1 B-tree.

use crate::btree_v1::{build_group_btree, collect_symbol_table_nodes, group_btree_size};
use crate::codec::to_usize;
use crate::error::{FormatError, Result};
use crate::link_message::LinkTarget;
use crate::local_heap::{LocalHeap, LocalHeapBuilder};
use crate::symbol_table::{SymbolTableEntry, SymbolTableMessage, SymbolTableNode};

/// Symbol table entry cache types.
pub const CACHE_NONE: u32 = 0;
pub const CACHE_STAB: u32 = 1;
pub const CACHE_SOFT_LINK: u32 = 2;

/// A resolved group member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub target: LinkTarget,
}

/// Resolve all members of a symbol-table group, in name order.
pub fn resolve_v1_group_entries(
    file_data: &[u8],
    stab: &SymbolTableMessage,
    offset_size: u8,
    length_size: u8,
) -> Result<Vec<GroupEntry>> {
    let heap = LocalHeap::parse(
        file_data,
        to_usize(stab.local_heap_address)?,
        offset_size,
        length_size,
    )?;
    let snods = collect_symbol_table_nodes(file_data, stab.btree_address, offset_size, length_size)?;

    let mut entries = Vec::new();
    for addr in snods {
        let node = SymbolTableNode::parse(file_data, to_usize(addr)?, offset_size)?;
        for entry in &node.entries {
            let name = heap.read_string(file_data, entry.link_name_offset)?;
            let target = if entry.cache_type == CACHE_SOFT_LINK {
                // scratch pad holds the heap offset of the link value
                let value_offset = u32::from_le_bytes([
                    entry.scratch_pad[0],
                    entry.scratch_pad[1],
                    entry.scratch_pad[2],
                    entry.scratch_pad[3],
                ]);
                LinkTarget::Soft {
                    target_path: heap.read_string(file_data, value_offset as u64)?,
                }
            } else {
                LinkTarget::Hard { object_header_address: entry.object_header_address }
            };
            entries.push(GroupEntry { name, target });
        }
    }
    log::trace!(
        "symbol table group (heap {:#x}, B-tree {:#x}): {} entries",
        stab.local_heap_address,
        stab.btree_address,
        entries.len()
    );
    Ok(entries)
}

/// A child to be listed in a new symbol-table group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V1Child<'a> {
    pub name: &'a str,
    pub object_header_address: u64,
    /// For child groups: their own heap and B-tree, cached in the entry.
    pub cached_stab: Option<SymbolTableMessage>,
}

/// Write parameters of symbol-table group storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V1GroupParams {
    /// Symbol table nodes hold up to `2 * leaf_k` entries.
    pub leaf_k: u16,
    /// B-tree nodes hold up to `2 * internal_k` children.
    pub internal_k: u16,
    pub offset_size: u8,
    pub length_size: u8,
}

fn node_count(n: usize, leaf_k: u16) -> usize {
    n.div_ceil(2 * leaf_k.max(1) as usize)
}

fn heap_for<'a>(names: impl Iterator<Item = &'a str>) -> (LocalHeapBuilder, Vec<u64>) {
    let mut heap = LocalHeapBuilder::new();
    let offsets = names.map(|n| heap.insert(n)).collect();
    (heap, offsets)
}

/// Bytes [`build_v1_group_storage`] emits for these member names.
pub fn v1_group_storage_size<'a>(
    names: impl Iterator<Item = &'a str>,
    params: &V1GroupParams,
) -> usize {
    let (heap, offsets) = heap_for(names);
    let nodes = node_count(offsets.len(), params.leaf_k);
    heap.encoded_size(params.offset_size, params.length_size)
        + nodes * SymbolTableNode::encoded_size(params.leaf_k, params.offset_size)
        + group_btree_size(nodes, params.internal_k, params.offset_size, params.length_size)
}

/// Build the heap, symbol table nodes, and B-tree of a group at `base`.
///
/// `children` must be sorted by name. Returns the Symbol Table message for
/// the group's object header and the storage bytes, laid out as
/// heap, nodes, B-tree.
pub fn build_v1_group_storage(
    base: u64,
    children: &[V1Child<'_>],
    params: &V1GroupParams,
) -> Result<(SymbolTableMessage, Vec<u8>)> {
    if children.windows(2).any(|w| w[0].name >= w[1].name) {
        return Err(FormatError::Unsupported("group members out of order".into()));
    }
    let V1GroupParams { leaf_k, internal_k, offset_size: os, length_size: ls } = *params;
    let leaf_k = leaf_k.max(1);

    let (heap, offsets) = heap_for(children.iter().map(|c| c.name));
    let heap_size = heap.encoded_size(os, ls) as u64;
    let mut bytes = heap.serialize(base, os, ls);

    let nodes = node_count(children.len(), leaf_k);
    let node_size = SymbolTableNode::encoded_size(leaf_k, os) as u64;
    let first_node = base + heap_size;

    let mut btree_children = Vec::with_capacity(nodes);
    let mut start = 0usize;
    for i in 0..nodes {
        // spread entries evenly so no node ends up nearly empty
        let len = children.len() / nodes + usize::from(i < children.len() % nodes);
        let entries = children[start..start + len]
            .iter()
            .zip(&offsets[start..start + len])
            .map(|(child, &name_offset)| {
                let mut scratch_pad = [0u8; 16];
                let cache_type = match &child.cached_stab {
                    Some(stab) => {
                        let mut raw = stab.serialize(os);
                        raw.resize(16, 0);
                        scratch_pad.copy_from_slice(&raw[..16]);
                        CACHE_STAB
                    }
                    None => CACHE_NONE,
                };
                SymbolTableEntry {
                    link_name_offset: name_offset,
                    object_header_address: child.object_header_address,
                    cache_type,
                    scratch_pad,
                }
            })
            .collect();
        bytes.extend_from_slice(&SymbolTableNode { entries }.serialize(leaf_k, os)?);
        btree_children.push((first_node + i as u64 * node_size, offsets[start + len - 1]));
        start += len;
    }

    let btree_base = first_node + nodes as u64 * node_size;
    let (btree_root, tree) = build_group_btree(btree_base, &btree_children, internal_k, os, ls)?;
    bytes.extend_from_slice(&tree);

    Ok((
        SymbolTableMessage { btree_address: btree_root, local_heap_address: base },
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(leaf_k: u16, internal_k: u16) -> V1GroupParams {
        V1GroupParams { leaf_k, internal_k, offset_size: 8, length_size: 8 }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item{i:04}")).collect()
    }

    fn place(base: u64, children: &[V1Child<'_>], p: &V1GroupParams) -> (SymbolTableMessage, Vec<u8>) {
        let (stab, bytes) = build_v1_group_storage(base, children, p).unwrap();
        assert_eq!(bytes.len(), v1_group_storage_size(children.iter().map(|c| c.name), p));
        let mut file = vec![0u8; base as usize];
        file.extend_from_slice(&bytes);
        (stab, file)
    }

    #[test]
    fn empty_group() {
        let p = params(4, 16);
        let (stab, file) = place(96, &[], &p);
        assert_eq!(stab.local_heap_address, 96);
        assert!(resolve_v1_group_entries(&file, &stab, 8, 8).unwrap().is_empty());
    }

    #[test]
    fn entries_resolve_in_order() {
        let p = params(4, 16);
        let names = names(5);
        let children: Vec<V1Child<'_>> = names
            .iter()
            .enumerate()
            .map(|(i, n)| V1Child {
                name: n,
                object_header_address: 1000 + i as u64,
                cached_stab: None,
            })
            .collect();
        let (stab, file) = place(0, &children, &p);
        let entries = resolve_v1_group_entries(&file, &stab, 8, 8).unwrap();
        let got: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(got, names.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(
            entries[4].target,
            LinkTarget::Hard { object_header_address: 1004 }
        );
    }

    #[test]
    fn large_group_spans_nodes_and_levels() {
        // leaf_k 1 and internal_k 1: 2 entries per node, 2 children per B-tree node
        let p = params(1, 1);
        let names = names(11);
        let children: Vec<V1Child<'_>> = names
            .iter()
            .map(|n| V1Child { name: n, object_header_address: 8, cached_stab: None })
            .collect();
        let (stab, file) = place(48, &children, &p);
        let entries = resolve_v1_group_entries(&file, &stab, 8, 8).unwrap();
        assert_eq!(entries.len(), 11);
        assert_eq!(entries[10].name, "item0010");
        let snods = collect_symbol_table_nodes(&file, stab.btree_address, 8, 8).unwrap();
        assert_eq!(snods.len(), 6);
    }

    #[test]
    fn cached_stab_written_to_scratch_pad() {
        let p = params(4, 16);
        let cached = SymbolTableMessage { btree_address: 0x500, local_heap_address: 0x600 };
        let children = [V1Child { name: "grp", object_header_address: 0x700, cached_stab: Some(cached.clone()) }];
        let (stab, file) = place(0, &children, &p);
        let snod_addr = collect_symbol_table_nodes(&file, stab.btree_address, 8, 8).unwrap()[0];
        let node = SymbolTableNode::parse(&file, snod_addr as usize, 8).unwrap();
        assert_eq!(node.entries[0].cache_type, CACHE_STAB);
        assert_eq!(SymbolTableMessage::parse(&node.entries[0].scratch_pad, 8).unwrap(), cached);
    }

    #[test]
    fn unsorted_children_rejected() {
        let children = [
            V1Child { name: "b", object_header_address: 1, cached_stab: None },
            V1Child { name: "a", object_header_address: 2, cached_stab: None },
        ];
        assert!(build_v1_group_storage(0, &children, &params(4, 16)).is_err());
    }
}
