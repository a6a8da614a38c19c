//! Pure-Rust HDF5 container subset.
//!
//! Low-level codecs for the structures needed to store groups and
//! contiguous numeric datasets, plus a whole-file reader and writer over
//! an in-memory [`tree::FileTree`].

pub mod btree_v1;
pub mod checksum;
mod codec;
pub mod data_layout;
pub mod dataspace;
pub mod datatype;
pub mod error;
pub mod file_reader;
pub mod file_writer;
pub mod group_v1;
pub mod group_v2;
pub mod link_info;
pub mod link_message;
pub mod local_heap;
pub mod message_type;
pub mod object_header;
pub mod object_header_writer;
pub mod property_list;
pub mod signature;
pub mod superblock;
pub mod symbol_table;
pub mod tree;

pub use dataspace::{Dataspace, DataspaceType};
pub use datatype::{Datatype, DatatypeByteOrder};
pub use error::{FormatError, Result};
pub use file_reader::read_tree;
pub use file_writer::{dataset_1d, write_tree};
pub use property_list::{FileCreateProps, FormatVersion, WriteOptions};
pub use tree::{DatasetNode, FileTree, GroupNode, Node, Skipped};
