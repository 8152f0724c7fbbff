//! Per-channel message statistics

use crate::protocol::MessageTag;

/// Running counters for messages applied by a channel.
///
/// Updated by the dispatch loop; useful for frame profiling and for
/// asserting batch composition in tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct ChannelStats {
    pub update_graphics: u64,
    pub update_bitmap_data: u64,
    pub update_text_content: u64,
    pub update_frame: u64,
    pub update_stage: u64,
    pub update_net_stream: u64,
    pub register_font: u64,
    pub draw_to_bitmap: u64,
    pub request_bitmap_data: u64,
    pub decode_image: u64,
    /// Batches aborted by a fatal protocol error
    pub errors: u64,
}

impl ChannelStats {
    pub(crate) fn record(&mut self, tag: MessageTag) {
        match tag {
            MessageTag::UpdateGraphics => self.update_graphics += 1,
            MessageTag::UpdateBitmapData => self.update_bitmap_data += 1,
            MessageTag::UpdateTextContent => self.update_text_content += 1,
            MessageTag::UpdateFrame => self.update_frame += 1,
            MessageTag::UpdateStage => self.update_stage += 1,
            MessageTag::UpdateNetStream => self.update_net_stream += 1,
            MessageTag::RegisterFont => self.register_font += 1,
            MessageTag::DrawToBitmap => self.draw_to_bitmap += 1,
            MessageTag::RequestBitmapData => self.request_bitmap_data += 1,
            MessageTag::DecodeImage => self.decode_image += 1,
            _ => {}
        }
    }

    pub(crate) fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Total messages applied
    #[must_use]
    pub fn total(&self) -> u64 {
        self.update_graphics
            + self.update_bitmap_data
            + self.update_text_content
            + self.update_frame
            + self.update_stage
            + self.update_net_stream
            + self.register_font
            + self.draw_to_bitmap
            + self.request_bitmap_data
            + self.decode_image
    }
}
