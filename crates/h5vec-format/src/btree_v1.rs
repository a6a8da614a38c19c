//! HDF5 version 1 B-tree, node type 0 (group name index).
//!
//! Keys are heap offsets of link names (`length_size` bytes); key `i + 1`
//! is the greatest name stored under child `i`. Level 0 children are
//! symbol table nodes; higher levels point at B-tree nodes.

use crate::codec::{ensure_len, read_addr, read_u16, read_uint, write_addr, write_uint};
use crate::error::{FormatError, Result};

const TREE_SIGNATURE: &[u8; 4] = b"TREE";

/// A parsed B-tree v1 node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BTreeV1Node {
    /// Node type: 0 = group, 1 = raw data chunks.
    pub node_type: u8,
    /// Node level: 0 = leaf.
    pub node_level: u8,
    /// Left sibling address, if any.
    pub left_sibling: Option<u64>,
    /// Right sibling address, if any.
    pub right_sibling: Option<u64>,
    /// Keys (`children.len() + 1` values).
    pub keys: Vec<u64>,
    /// Child addresses.
    pub children: Vec<u64>,
}

impl BTreeV1Node {
    /// Parse a group B-tree node at the given offset.
    pub fn parse(
        file_data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<BTreeV1Node> {
        let os = offset_size as usize;
        let ls = length_size as usize;
        ensure_len(file_data, offset, 8 + 2 * os)?;
        if &file_data[offset..offset + 4] != TREE_SIGNATURE {
            return Err(FormatError::InvalidSignature { structure: "TREE" });
        }

        let node_type = file_data[offset + 4];
        if node_type != 0 {
            return Err(FormatError::Unsupported(format!("B-tree node type {node_type}")));
        }
        let node_level = file_data[offset + 5];
        let entries_used = read_u16(file_data, offset + 6)? as usize;
        let left_sibling = read_addr(file_data, offset + 8, offset_size)?;
        let right_sibling = read_addr(file_data, offset + 8 + os, offset_size)?;

        let mut pos = offset + 8 + 2 * os;
        ensure_len(file_data, pos, entries_used * (ls + os) + ls)?;

        let mut keys = Vec::with_capacity(entries_used + 1);
        let mut children = Vec::with_capacity(entries_used);
        for _ in 0..entries_used {
            keys.push(read_uint(file_data, pos, length_size)?);
            pos += ls;
            children.push(read_uint(file_data, pos, offset_size)?);
            pos += os;
        }
        keys.push(read_uint(file_data, pos, length_size)?);

        Ok(BTreeV1Node {
            node_type,
            node_level,
            left_sibling,
            right_sibling,
            keys,
            children,
        })
    }

    /// Encoded size of a group node with room for `2 * k` children.
    pub fn encoded_size(k: u16, offset_size: u8, length_size: u8) -> usize {
        let cap = 2 * k as usize;
        8 + 2 * offset_size as usize + cap * offset_size as usize + (cap + 1) * length_size as usize
    }

    /// Serialize as a group node padded to `2 * k` children.
    pub fn serialize(&self, k: u16, offset_size: u8, length_size: u8) -> Result<Vec<u8>> {
        if self.children.len() > 2 * k as usize || self.keys.len() != self.children.len() + 1 {
            return Err(FormatError::TooLarge("B-tree node"));
        }
        let size = Self::encoded_size(k, offset_size, length_size);
        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(TREE_SIGNATURE);
        buf.push(self.node_type);
        buf.push(self.node_level);
        buf.extend_from_slice(&(self.children.len() as u16).to_le_bytes());
        write_addr(&mut buf, self.left_sibling, offset_size);
        write_addr(&mut buf, self.right_sibling, offset_size);
        for (key, child) in self.keys.iter().zip(&self.children) {
            write_uint(&mut buf, *key, length_size);
            write_uint(&mut buf, *child, offset_size);
        }
        if let Some(last) = self.keys.last() {
            write_uint(&mut buf, *last, length_size);
        }
        buf.resize(size, 0);
        Ok(buf)
    }
}

/// Collect the symbol table node addresses of a group B-tree, in key order.
pub fn collect_symbol_table_nodes(
    file_data: &[u8],
    btree_address: u64,
    offset_size: u8,
    length_size: u8,
) -> Result<Vec<u64>> {
    let mut out = Vec::new();
    collect_into(file_data, btree_address, None, offset_size, length_size, &mut out)?;
    Ok(out)
}

fn collect_into(
    file_data: &[u8],
    address: u64,
    expected_level: Option<u8>,
    offset_size: u8,
    length_size: u8,
    out: &mut Vec<u64>,
) -> Result<()> {
    let offset = usize::try_from(address).map_err(|_| FormatError::AddressOverflow(address))?;
    let node = BTreeV1Node::parse(file_data, offset, offset_size, length_size)?;

    // Levels must strictly decrease; this also rules out cycles.
    if expected_level.is_some_and(|lvl| lvl != node.node_level) {
        return Err(FormatError::Unsupported(format!(
            "B-tree node at {address:#x} has inconsistent level {}",
            node.node_level
        )));
    }

    if node.node_level == 0 {
        out.extend_from_slice(&node.children);
        return Ok(());
    }
    for &child in &node.children {
        collect_into(file_data, child, Some(node.node_level - 1), offset_size, length_size, out)?;
    }
    Ok(())
}

/// Number of nodes on each level (leaf level first) for `n` children.
fn level_sizes(n: usize, k: u16) -> Vec<usize> {
    let cap = 2 * k.max(1) as usize;
    let mut levels = vec![n.div_ceil(cap).max(1)];
    while let Some(&last) = levels.last() {
        if last <= 1 {
            break;
        }
        levels.push(last.div_ceil(cap));
    }
    levels
}

/// Split `n` items into `parts` runs whose lengths differ by at most one.
fn split_even(n: usize, parts: usize) -> Vec<usize> {
    let base = n / parts;
    let extra = n % parts;
    (0..parts).map(|i| base + usize::from(i < extra)).collect()
}

/// Total bytes [`build_group_btree`] emits for `n` symbol table nodes.
pub fn group_btree_size(n: usize, k: u16, offset_size: u8, length_size: u8) -> usize {
    let nodes: usize = level_sizes(n, k).iter().sum();
    nodes * BTreeV1Node::encoded_size(k, offset_size, length_size)
}

/// Build a complete group B-tree placed contiguously at `base_address`.
///
/// `children` lists `(symbol table node address, greatest name key)` in
/// name order. Nodes are laid out level by level from the leaves up, so the
/// root is the last node. Returns the root address and the encoded bytes.
pub fn build_group_btree(
    base_address: u64,
    children: &[(u64, u64)],
    k: u16,
    offset_size: u8,
    length_size: u8,
) -> Result<(u64, Vec<u8>)> {
    let k = k.max(1);
    let node_size = BTreeV1Node::encoded_size(k, offset_size, length_size) as u64;
    let mut bytes = Vec::with_capacity(group_btree_size(children.len(), k, offset_size, length_size));

    // (address, smallest key, greatest key) of the previous level
    let mut current: Vec<(u64, u64, u64)> = children.iter().map(|&(a, key)| (a, 0, key)).collect();
    let mut next_address = base_address;
    let mut lower_bound = 0u64;

    for (level, &node_count) in level_sizes(children.len(), k).iter().enumerate() {
        let first = next_address;
        let runs = split_even(current.len(), node_count);
        let mut parents = Vec::with_capacity(node_count);
        let mut start = 0usize;

        for (i, &len) in runs.iter().enumerate() {
            let slice = &current[start..start + len];
            let addr = first + i as u64 * node_size;
            let left_key = if start == 0 { lower_bound } else { current[start - 1].2 };
            let mut keys = vec![left_key];
            keys.extend(slice.iter().map(|c| c.2));
            let node = BTreeV1Node {
                node_type: 0,
                node_level: level as u8,
                left_sibling: (i > 0).then(|| addr - node_size),
                right_sibling: (i + 1 < node_count).then(|| addr + node_size),
                keys,
                children: slice.iter().map(|c| c.0).collect(),
            };
            bytes.extend_from_slice(&node.serialize(k, offset_size, length_size)?);
            let greatest = slice.last().map_or(left_key, |c| c.2);
            parents.push((addr, left_key, greatest));
            start += len;
        }

        next_address = first + node_count as u64 * node_size;
        lower_bound = parents.first().map_or(0, |p| p.1);
        current = parents;
    }

    let root = current.first().map_or(base_address, |r| r.0);
    Ok((root, bytes))
}
