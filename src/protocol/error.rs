//! SGP error types

use std::fmt;

use thiserror::Error;

use super::MessageTag;

/// Identifier space a composite reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSpace {
    /// Tree-node table (container ids bound by `UpdateFrame`/`UpdateStage`).
    Node,
    /// Asset table (shapes, bitmaps, text blocks, video streams).
    Asset,
}

impl fmt::Display for IdSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Asset => write!(f, "asset"),
        }
    }
}

/// SGP protocol errors
///
/// Every variant is fatal for the batch being decoded: processing stops and
/// updates already applied by earlier messages stand. Unimplemented filter
/// kinds are not an error; they are logged and dropped during decode.
#[derive(Error, Debug)]
pub enum Error {
    /// Byte cursor exhausted mid-read
    #[error("truncated stream: need {needed} more bytes, {available} available")]
    Truncated {
        /// Bytes the failed read required
        needed: usize,
        /// Bytes left in the cursor
        available: usize,
    },

    /// Referenced id missing from the expected table
    #[error("unresolved {space} reference: {id}")]
    UnresolvedReference {
        /// Table the id was looked up in
        space: IdSpace,
        /// The offending wire id (asset flag already masked off)
        id: i32,
    },

    /// Message tag outside the closed set
    #[error("unknown message tag: {tag}")]
    UnknownTag {
        /// Raw tag value read from the stream
        tag: i32,
    },

    /// Known tag that does not flow in the command direction
    #[error("unexpected message in command stream: {tag}")]
    UnexpectedTag {
        /// The producer-bound tag found in a consumer batch
        tag: MessageTag,
    },

    /// Asset token index outside the transferred side list
    #[error("asset token {index} out of range ({available} blobs transferred)")]
    BadAssetToken {
        /// Token read from the stream
        index: i32,
        /// Number of blobs in the side list
        available: usize,
    },

    /// Asset token slot already consumed by an earlier read
    #[error("asset token {index} already consumed")]
    AssetConsumed {
        /// Token read from the stream
        index: i32,
    },

    /// Asset id resolves to a different asset kind
    #[error("asset {id} is not a {expected} asset")]
    AssetKindMismatch {
        /// The asset id
        id: i32,
        /// Kind the message required
        expected: &'static str,
    },

    /// Enumerated field value outside its closed set
    #[error("invalid {what}: {value}")]
    InvalidValue {
        /// Field being decoded
        what: &'static str,
        /// Raw value read from the stream
        value: i32,
    },

    /// Invalid UTF-8 in a string field or text blob
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
