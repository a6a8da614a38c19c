//! In-memory object tree of an HDF5 file.
//!
//! [`crate::file_reader::read_tree`] builds it from file bytes and
//! [`crate::file_writer::write_tree`] encodes it back. Members of a group are
//! kept in name order, which is also the order symbol-table groups need.

use std::collections::BTreeMap;

use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::{FormatError, Result};
use crate::property_list::{FileCreateProps, FormatVersion};

/// A dataset: shape, element type, and raw element bytes in stored byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetNode {
    pub datatype: Datatype,
    pub dataspace: Dataspace,
    data: Vec<u8>,
}

impl DatasetNode {
    /// Build a dataset, checking that `data` matches shape × element size.
    pub fn new(datatype: Datatype, dataspace: Dataspace, data: Vec<u8>) -> Result<DatasetNode> {
        let expected = dataspace
            .num_elements()
            .checked_mul(datatype.type_size() as u64)
            .ok_or(FormatError::TooLarge("dataset"))?;
        if expected != data.len() as u64 {
            return Err(FormatError::DataSizeMismatch { expected, actual: data.len() as u64 });
        }
        Ok(DatasetNode { datatype, dataspace, data })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A group: named members in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupNode {
    children: BTreeMap<String, Node>,
}

/// One object in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Group(GroupNode),
    Dataset(DatasetNode),
    /// An object the reader cannot represent (soft link, chunked dataset, ...).
    Unsupported { reason: String },
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Group(_) => "group",
            Node::Dataset(_) => "dataset",
            Node::Unsupported { .. } => "unsupported object",
        }
    }
}

impl GroupNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Add a member. Returns `false`, leaving the group unchanged, if the
    /// name is already taken.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> bool {
        match self.children.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    /// Member names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Something the reader dropped or could not decode, with its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub path: String,
    pub reason: String,
}

/// A whole file: the root group plus the settings it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTree {
    pub version: FormatVersion,
    pub create: FileCreateProps,
    pub root: GroupNode,
    /// Content the reader ignored. Rewriting the file would lose it.
    pub skipped: Vec<Skipped>,
}

impl FileTree {
    /// An empty file.
    pub fn new(version: FormatVersion, create: FileCreateProps) -> Self {
        Self { version, create, root: GroupNode::new(), skipped: Vec::new() }
    }

    /// Whether writing this tree back reproduces everything that was read.
    pub fn is_lossless(&self) -> bool {
        self.skipped.is_empty()
    }
}
