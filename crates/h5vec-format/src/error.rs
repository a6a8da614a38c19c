//! Error types for HDF5 format parsing and serialization.

/// Errors that can occur when reading or writing HDF5 binary format structures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The HDF5 magic signature was not found at any valid offset.
    #[error("HDF5 signature not found at any valid offset")]
    SignatureNotFound,

    /// The superblock version is not supported.
    #[error("unsupported superblock version: {0}")]
    UnsupportedSuperblockVersion(u8),

    /// Unexpected end of data.
    #[error("unexpected EOF: need {expected} bytes, have {available}")]
    UnexpectedEof {
        /// Number of bytes expected.
        expected: usize,
        /// Number of bytes actually available.
        available: usize,
    },

    /// Invalid offset size (must be 2, 4, or 8).
    #[error("invalid offset size: {0} (must be 2, 4, or 8)")]
    InvalidOffsetSize(u8),

    /// Invalid length size (must be 2, 4, or 8).
    #[error("invalid length size: {0} (must be 2, 4, or 8)")]
    InvalidLengthSize(u8),

    /// A structure did not start with its four-byte signature.
    #[error("invalid {structure} signature")]
    InvalidSignature {
        /// Name of the structure being parsed (`"HEAP"`, `"SNOD"`, ...).
        structure: &'static str,
    },

    /// A structure carried a version number this crate does not know.
    #[error("unsupported {structure} version: {version}")]
    InvalidVersion {
        /// Name of the structure being parsed.
        structure: &'static str,
        /// The version byte found in the file.
        version: u8,
    },

    /// Unknown message type that is marked as must-understand.
    #[error("unsupported message type {0:#06x} marked as must-understand")]
    UnsupportedMessage(u16),

    /// Jenkins lookup3 checksum mismatch.
    #[error("{structure} checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Name of the checksummed structure.
        structure: &'static str,
        /// The checksum stored in the file.
        expected: u32,
        /// The checksum we computed.
        computed: u32,
    },

    /// Invalid dataspace type byte.
    #[error("invalid dataspace type: {0}")]
    InvalidDataspaceType(u8),

    /// Invalid data layout class.
    #[error("invalid data layout class: {0}")]
    InvalidLayoutClass(u8),

    /// Invalid string in a heap or link message.
    #[error("invalid name encoding at heap offset {0}")]
    InvalidName(u64),

    /// An object header lacks a message the object kind requires.
    #[error("missing required {0} message")]
    MissingMessage(&'static str),

    /// The file uses a feature outside the supported subset.
    #[error("unsupported HDF5 feature: {0}")]
    Unsupported(String),

    /// Raw data length does not match shape × element size.
    #[error("data size mismatch: expected {expected} bytes, got {actual}")]
    DataSizeMismatch {
        /// Bytes implied by the dataspace and datatype.
        expected: u64,
        /// Bytes actually supplied or stored.
        actual: u64,
    },

    /// An address or size does not fit the platform's address space.
    #[error("address {0:#x} out of range")]
    AddressOverflow(u64),

    /// A structure is too large for the fields that encode it.
    #[error("{0} exceeds the encodable size")]
    TooLarge(&'static str),
}

/// Result alias for format operations.
pub type Result<T> = core::result::Result<T, FormatError>;
