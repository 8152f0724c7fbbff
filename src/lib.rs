//! SGP (Scene Graph Protocol) - Binary remoting protocol for retained-mode scene graphs
//!
//! A producer describes incremental changes to a scene graph as a stream
//! of tagged binary messages; a consumer decodes the stream and mutates a
//! persistent tree of renderable nodes, optionally writing responses back
//! (text layout metrics, captured pixels, decoded images).
//!
//! # Quick Start
//!
//! ```rust
//! use sgp::protocol::{ChannelReader, ChannelWriter, MessageTag};
//!
//! // Producer side: encode a batch
//! let mut writer = ChannelWriter::new();
//! writer.write_tag(MessageTag::Eof);
//! let (buffer, assets) = writer.into_parts();
//!
//! // Consumer side: decode it
//! let mut reader = ChannelReader::new(buffer, assets);
//! assert_eq!(MessageTag::from_i32(reader.read_i32()?), Some(MessageTag::Eof));
//! # Ok::<(), sgp::Error>(())
//! ```
//!
//! # Features
//!
//! - **Compact wire format** - Fixed-point scaling and sparse variant
//!   encodings keep common messages small
//! - **Two-space references** - Tree nodes and standalone assets live in
//!   separate id tables, resolved through one typed reference
//! - **Differential updates** - Per-message bitmasks touch only the fields
//!   that changed; assets update in place so references stay live
//! - **Asynchronous responses** - Image decoding completes out-of-band in
//!   an independently framed batch matched by promise id

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod channel;
pub mod protocol;
pub mod scene;

pub use channel::{
    ChannelConfig, ChannelContext, ChannelDeserializer, ChannelSerializer, ChannelStats,
    RenderHost,
};
pub use protocol::{ChannelReader, ChannelWriter, Error, MessageTag, NodeRef, Result};
pub use scene::{Asset, SceneGraph};

/// SGP protocol version
pub const VERSION: &str = "1.0.0-draft";
