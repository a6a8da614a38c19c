//! HDF5 object header message type identifiers.

/// Header message types this crate recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Nil,
    Dataspace,
    LinkInfo,
    Datatype,
    FillValueOld,
    FillValue,
    Link,
    ExternalFileList,
    DataLayout,
    GroupInfo,
    FilterPipeline,
    Attribute,
    ObjectComment,
    ObjectModificationTimeOld,
    SharedMessageTable,
    ObjectHeaderContinuation,
    SymbolTable,
    ObjectModificationTime,
    BTreeKValues,
    AttributeInfo,
    ObjectReferenceCount,
    /// Unknown message type with its raw type ID.
    Unknown(u16),
}

impl MessageType {
    /// Convert a raw type ID to a `MessageType`.
    pub fn from_u16(val: u16) -> MessageType {
        match val {
            0x0000 => MessageType::Nil,
            0x0001 => MessageType::Dataspace,
            0x0002 => MessageType::LinkInfo,
            0x0003 => MessageType::Datatype,
            0x0004 => MessageType::FillValueOld,
            0x0005 => MessageType::FillValue,
            0x0006 => MessageType::Link,
            0x0007 => MessageType::ExternalFileList,
            0x0008 => MessageType::DataLayout,
            0x000A => MessageType::GroupInfo,
            0x000B => MessageType::FilterPipeline,
            0x000C => MessageType::Attribute,
            0x000D => MessageType::ObjectComment,
            0x000E => MessageType::ObjectModificationTimeOld,
            0x000F => MessageType::SharedMessageTable,
            0x0010 => MessageType::ObjectHeaderContinuation,
            0x0011 => MessageType::SymbolTable,
            0x0012 => MessageType::ObjectModificationTime,
            0x0013 => MessageType::BTreeKValues,
            0x0015 => MessageType::AttributeInfo,
            0x0016 => MessageType::ObjectReferenceCount,
            other => MessageType::Unknown(other),
        }
    }

    /// Convert back to the raw type ID.
    pub fn to_u16(self) -> u16 {
        match self {
            MessageType::Nil => 0x0000,
            MessageType::Dataspace => 0x0001,
            MessageType::LinkInfo => 0x0002,
            MessageType::Datatype => 0x0003,
            MessageType::FillValueOld => 0x0004,
            MessageType::FillValue => 0x0005,
            MessageType::Link => 0x0006,
            MessageType::ExternalFileList => 0x0007,
            MessageType::DataLayout => 0x0008,
            MessageType::GroupInfo => 0x000A,
            MessageType::FilterPipeline => 0x000B,
            MessageType::Attribute => 0x000C,
            MessageType::ObjectComment => 0x000D,
            MessageType::ObjectModificationTimeOld => 0x000E,
            MessageType::SharedMessageTable => 0x000F,
            MessageType::ObjectHeaderContinuation => 0x0010,
            MessageType::SymbolTable => 0x0011,
            MessageType::ObjectModificationTime => 0x0012,
            MessageType::BTreeKValues => 0x0013,
            MessageType::AttributeInfo => 0x0015,
            MessageType::ObjectReferenceCount => 0x0016,
            MessageType::Unknown(v) => v,
        }
    }

    /// Messages that only describe bookkeeping of the object itself.
    ///
    /// Dropping them when an object is rewritten loses no user data.
    pub fn is_bookkeeping(self) -> bool {
        matches!(
            self,
            MessageType::Nil
                | MessageType::FillValueOld
                | MessageType::FillValue
                | MessageType::GroupInfo
                | MessageType::LinkInfo
                | MessageType::SymbolTable
                | MessageType::ObjectComment
                | MessageType::ObjectModificationTimeOld
                | MessageType::ObjectModificationTime
                | MessageType::BTreeKValues
                | MessageType::ObjectReferenceCount
                | MessageType::ObjectHeaderContinuation
        )
    }
}
