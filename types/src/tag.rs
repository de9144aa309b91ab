//! Meta tags for the payload pipeline: serializer selection and compression selection.

use core::fmt;

/// Which payload serializer was used to produce a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// The first schema language's binary encoding (protobuf-shaped).
    SchemaABinary,
    /// The second schema language's binary encoding (thrift-shaped).
    SchemaBBinary,
    /// A textual, self-describing encoding (JSON).
    TextJson,
}

impl DataType {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::SchemaABinary => 0,
            Self::SchemaBBinary => 1,
            Self::TextJson => 2,
        }
    }

    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::SchemaABinary),
            1 => Some(Self::SchemaBBinary),
            2 => Some(Self::TextJson),
            _ => None,
        }
    }

    /// The MIME `Content-Type` used by the HTTP-tunneled protocols for this data type.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::SchemaABinary => "application/x-protobuf",
            Self::SchemaBBinary => "application/x-thrift",
            Self::TextJson => "application/json",
        }
    }

    /// Recovers a data type from an HTTP `Content-Type` header value.
    #[must_use]
    pub fn from_content_type(value: &str) -> Option<Self> {
        let value = value.split(';').next().unwrap_or(value).trim();
        match value {
            "application/x-protobuf" | "application/protobuf" => Some(Self::SchemaABinary),
            "application/x-thrift" => Some(Self::SchemaBBinary),
            "application/json" => Some(Self::TextJson),
            _ => None,
        }
    }
}

/// Which compression transform was applied to a payload.
///
/// Tag values are part of the wire contract (they are written verbatim into every
/// protocol's meta) and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompressType {
    None,
    Snappy,
    Gzip,
    Zlib,
    Lz4,
}

impl CompressType {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Snappy => 1,
            Self::Gzip => 2,
            Self::Zlib => 3,
            Self::Lz4 => 4,
        }
    }

    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Snappy),
            2 => Some(Self::Gzip),
            3 => Some(Self::Zlib),
            4 => Some(Self::Lz4),
            _ => None,
        }
    }

    /// The HTTP `Content-Encoding` token used by the HTTP-tunneled protocols.
    #[must_use]
    pub fn content_encoding(self) -> &'static str {
        match self {
            Self::None => "identity",
            Self::Snappy => "snappy",
            Self::Gzip => "gzip",
            Self::Zlib => "deflate",
            Self::Lz4 => "lz4",
        }
    }

    /// Recovers a compression tag from an HTTP `Content-Encoding` header value.
    ///
    /// An absent header defaults to `None`; this function only handles the
    /// "present but unrecognised" half, the caller is responsible for
    /// defaulting on a missing header.
    #[must_use]
    pub fn from_content_encoding(value: &str) -> Option<Self> {
        match value.trim() {
            "identity" | "" => Some(Self::None),
            "snappy" => Some(Self::Snappy),
            "gzip" => Some(Self::Gzip),
            "deflate" => Some(Self::Zlib),
            "lz4" => Some(Self::Lz4),
            _ => None,
        }
    }
}

impl fmt::Display for CompressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_encoding())
    }
}
