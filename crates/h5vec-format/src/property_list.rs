//! Property types configuring how a file is written.

/// Which generation of on-disk structures to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FormatVersion {
    /// Superblock v0, v1 object headers, symbol-table groups. Readable by
    /// every HDF5 library release.
    #[default]
    Earliest,
    /// Superblock v3, v2 object headers, link-message groups.
    Latest,
}

impl FormatVersion {
    pub fn superblock_version(self) -> u8 {
        match self {
            FormatVersion::Earliest => 0,
            FormatVersion::Latest => 3,
        }
    }

    pub fn object_header_version(self) -> u8 {
        match self {
            FormatVersion::Earliest => 1,
            FormatVersion::Latest => 2,
        }
    }

    pub fn dataspace_version(self) -> u8 {
        match self {
            FormatVersion::Earliest => 1,
            FormatVersion::Latest => 2,
        }
    }

    pub fn layout_version(self) -> u8 {
        match self {
            FormatVersion::Earliest => 3,
            FormatVersion::Latest => 4,
        }
    }
}

/// File creation properties.
///
/// The group B-tree parameters only apply to symbol-table groups, that is
/// to files written with [`FormatVersion::Earliest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCreateProps {
    /// Symbol table nodes hold up to `2 * sym_leaf_k` entries (default 4).
    pub sym_leaf_k: u16,
    /// Group B-tree nodes hold up to `2 * btree_k` children (default 16).
    pub btree_k: u16,
}

impl Default for FileCreateProps {
    fn default() -> Self {
        Self { sym_leaf_k: 4, btree_k: 16 }
    }
}

impl FileCreateProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set symbol table node K. Values below 1 are raised to 1.
    pub fn sym_leaf_k(mut self, k: u16) -> Self {
        self.sym_leaf_k = k.max(1);
        self
    }

    /// Set group B-tree node K. Values below 1 are raised to 1.
    pub fn btree_k(mut self, k: u16) -> Self {
        self.btree_k = k.max(1);
        self
    }
}

/// Everything [`crate::file_writer::write_tree`] needs besides the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    pub version: FormatVersion,
    pub create: FileCreateProps,
}
