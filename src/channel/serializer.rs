//! Producer-direction message encoding
//!
//! Encodes the messages that flow back to the producer: forwarded input
//! events and the asynchronous `DecodeImageResponse`. Each serializer owns
//! an independent buffer and asset side list, so a response batch never
//! interleaves with command decoding.

use bytes::Bytes;

use crate::protocol::{
    ChannelWriter, EventModifiers, FocusEventKind, ImageFormat, KeyboardEventKind, MessageTag,
    MouseEventKind,
};

/// Writer for consumer-to-producer messages.
#[derive(Debug, Default)]
pub struct ChannelSerializer {
    writer: ChannelWriter,
}

impl ChannelSerializer {
    /// Create a serializer with an empty buffer and asset list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a pointer event
    pub fn write_mouse_event(
        &mut self,
        kind: MouseEventKind,
        x: f32,
        y: f32,
        buttons: i32,
        modifiers: EventModifiers,
    ) {
        self.writer.write_tag(MessageTag::MouseEvent);
        self.writer.write_i32(kind.as_i32());
        self.writer.write_f32(x);
        self.writer.write_f32(y);
        self.writer.write_i32(buttons);
        self.writer.write_i32(modifiers.as_u32() as i32);
    }

    /// Forward a key event
    pub fn write_keyboard_event(
        &mut self,
        kind: KeyboardEventKind,
        key_code: i32,
        char_code: i32,
        location: i32,
        modifiers: EventModifiers,
    ) {
        self.writer.write_tag(MessageTag::KeyboardEvent);
        self.writer.write_i32(kind.as_i32());
        self.writer.write_i32(key_code);
        self.writer.write_i32(char_code);
        self.writer.write_i32(location);
        self.writer.write_i32(modifiers.as_u32() as i32);
    }

    /// Forward a focus/visibility event
    pub fn write_focus_event(&mut self, kind: FocusEventKind) {
        self.writer.write_tag(MessageTag::FocusEvent);
        self.writer.write_i32(kind.as_i32());
    }

    /// Complete an earlier `DecodeImage` request.
    ///
    /// A failed decode is reported with [`ImageFormat::None`], an empty
    /// pixel blob, and zero dimensions; the producer branches on the
    /// format marker.
    pub fn write_decode_image_response(
        &mut self,
        promise_id: i32,
        format: ImageFormat,
        pixels: Bytes,
        width: i32,
        height: i32,
    ) {
        self.writer.write_tag(MessageTag::DecodeImageResponse);
        self.writer.write_i32(promise_id);
        self.writer.write_i32(format.as_i32());
        self.writer.write_asset(pixels);
        self.writer.write_i32(width);
        self.writer.write_i32(height);
    }

    /// Finish, returning the response buffer and its asset side list
    #[must_use]
    pub fn finish(self) -> (Bytes, Vec<Bytes>) {
        self.writer.into_parts()
    }
}
