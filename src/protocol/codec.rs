//! SGP primitive codec
//!
//! Ordered reads and writes over a byte cursor plus the out-of-band asset
//! side list. This layer has no knowledge of message semantics; the
//! geometry decoders and the channel dispatcher are built on top of it.

use bytes::Bytes;

use super::{Error, MessageTag, Result};

/// Ordered writer producing a batch buffer and its asset side list.
///
/// Integers and floats are little-endian. Asset blobs travel out-of-band:
/// [`ChannelWriter::write_asset`] appends the blob to the side list and
/// writes its index into the integer stream.
#[derive(Debug, Default)]
pub struct ChannelWriter {
    buffer: Vec<u8>,
    assets: Vec<Bytes>,
}

impl ChannelWriter {
    /// Create an empty writer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a signed 32-bit integer
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Write an IEEE single-precision float
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a boolean as one byte
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    /// Write a raw byte range with no length prefix
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Write a length-prefixed UTF-8 string
    pub fn write_string(&mut self, value: &str) {
        self.write_i32(value.len() as i32);
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Transfer a blob out-of-band and write its side-list index
    pub fn write_asset(&mut self, blob: Bytes) {
        self.write_i32(self.assets.len() as i32);
        self.assets.push(blob);
    }

    /// Write a message tag
    pub fn write_tag(&mut self, tag: MessageTag) {
        self.write_i32(tag.as_i32());
    }

    /// Bytes written to the integer stream so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check whether the integer stream is still empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of blobs transferred so far
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Finish, returning the batch buffer and its asset side list
    #[must_use]
    pub fn into_parts(self) -> (Bytes, Vec<Bytes>) {
        (Bytes::from(self.buffer), self.assets)
    }

    /// Finish and hand the produced batch straight to a reader
    #[must_use]
    pub fn into_reader(self) -> ChannelReader {
        let (buffer, assets) = self.into_parts();
        ChannelReader::new(buffer, assets)
    }
}

/// Ordered reader over a batch buffer and its asset side list.
///
/// Each transferred blob is read exactly once: [`ChannelReader::read_asset`]
/// consumes the side-list slot it indexes. Reads past the end of the buffer
/// fail with [`Error::Truncated`], which is fatal for the batch.
#[derive(Debug)]
pub struct ChannelReader {
    buffer: Bytes,
    position: usize,
    assets: Vec<Option<Bytes>>,
}

impl ChannelReader {
    /// Create a reader over a delivered batch
    #[must_use]
    pub fn new(buffer: Bytes, assets: Vec<Bytes>) -> Self {
        Self {
            buffer,
            position: 0,
            assets: assets.into_iter().map(Some).collect(),
        }
    }

    /// Bytes left in the cursor
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Check whether any bytes are left
    #[must_use]
    pub fn has_remaining(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// Advance the cursor, returning the start offset of the claimed range
    fn advance(&mut self, count: usize) -> Result<usize> {
        if self.remaining() < count {
            return Err(Error::Truncated {
                needed: count,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += count;
        Ok(start)
    }

    /// Read a signed 32-bit integer
    pub fn read_i32(&mut self) -> Result<i32> {
        let start = self.advance(4)?;
        Ok(i32::from_le_bytes(
            self.buffer[start..start + 4].try_into().unwrap(),
        ))
    }

    /// Read an IEEE single-precision float
    pub fn read_f32(&mut self) -> Result<f32> {
        let start = self.advance(4)?;
        Ok(f32::from_le_bytes(
            self.buffer[start..start + 4].try_into().unwrap(),
        ))
    }

    /// Read a boolean; any nonzero byte is `true`
    pub fn read_bool(&mut self) -> Result<bool> {
        let start = self.advance(1)?;
        Ok(self.buffer[start] != 0)
    }

    /// Read a raw byte range as a zero-copy slice of the batch buffer
    pub fn read_bytes(&mut self, count: usize) -> Result<Bytes> {
        let start = self.advance(count)?;
        Ok(self.buffer.slice(start..start + count))
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_i32()?;
        let Ok(length) = usize::try_from(length) else {
            return Err(Error::InvalidValue {
                what: "string length",
                value: length,
            });
        };
        let data = self.read_bytes(length)?;
        Ok(String::from_utf8(data.to_vec())?)
    }

    /// Read an asset token and consume the blob it indexes
    pub fn read_asset(&mut self) -> Result<Bytes> {
        let index = self.read_i32()?;
        let available = self.assets.len();
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| self.assets.get_mut(i))
            .ok_or(Error::BadAssetToken { index, available })?;
        slot.take().ok_or(Error::AssetConsumed { index })
    }
}
