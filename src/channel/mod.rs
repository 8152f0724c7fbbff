//! Channel sessions
//!
//! One [`ChannelContext`] per established channel. Command batches are
//! applied by [`ChannelDeserializer`]; responses flow back through the
//! synchronous output writer or, for image decoding, through an
//! independently framed batch built with [`ChannelSerializer`].

mod context;
mod deserializer;
mod host;
mod serializer;
mod stats;

pub use context::{ChannelConfig, ChannelContext};
pub use deserializer::ChannelDeserializer;
pub use host::{BitmapContent, DecodeCallback, DecodedImage, DrawNodeParams, RenderHost};
pub use serializer::ChannelSerializer;
pub use stats::ChannelStats;
