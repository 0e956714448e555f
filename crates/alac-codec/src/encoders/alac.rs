//! ALAC 编码引擎 (escape 帧).
//!
//! 每帧以 escape (未压缩) 元素输出, 是任何 ALAC 解码器都能解码的合法码流.
//! 元素头格式:
//! - 元素类型 (3 bits) + 实例标识 (4 bits)
//! - 保留位 (12 bits) = 0
//! - partial (1 bit) + shift (2 bits) = 0 + escape (1 bit) = 1
//! - 若为短帧: 采样帧数 (32 bits)
//! - 按帧交错的原始采样, 每个采样 `bit_depth` 位
//!
//! 所有元素之后写 END 元素并按字节对齐.

use alac_core::bitwriter::BitWriter;
use alac_core::{AlacError, AlacResult, StreamParams};
use bytes::Bytes;
use log::{debug, trace, warn};

use crate::MAX_ESCAPE_HEADER_BYTES;
use crate::cookie::MagicCookie;
use crate::element::{
    ElementKind, ElementSlot, INSTANCE_BITS, TAG_BITS, UNUSED_HEADER_BITS, layout_for_channels,
};
use crate::engine::PacketEncoder;

/// 每个元素头最大位数 (含短帧采样数)
const ELEMENT_HEADER_MAX_BITS: usize =
    (TAG_BITS + INSTANCE_BITS + UNUSED_HEADER_BITS + 4 + 32) as usize;

/// ALAC 编码引擎
pub struct AlacEncoder {
    /// 流参数
    params: StreamParams,
    /// 元素布局
    layout: Vec<ElementSlot>,
    /// 当前配置 (随编码更新 max_frame_bytes)
    cookie: MagicCookie,
    /// 已编码的数据包数
    packets_encoded: u64,
}

impl AlacEncoder {
    /// 按流参数创建编码引擎
    pub fn new(params: &StreamParams) -> AlacResult<Self> {
        let layout = layout_for_channels(params.channels)?;
        let cookie = MagicCookie::from_params(params)?;
        debug!(
            "打开 ALAC 编码器: {} Hz, {} 声道, {}, 每包 {} 帧, {} 个元素",
            params.sample_rate,
            params.channels,
            params.bit_depth,
            params.frames_per_packet,
            layout.len(),
        );
        Ok(Self {
            params: *params,
            layout,
            cookie,
            packets_encoded: 0,
        })
    }

    /// 创建装箱的编码引擎实例
    pub fn create(params: &StreamParams) -> AlacResult<Box<dyn PacketEncoder>> {
        Ok(Box::new(Self::new(params)?))
    }

    /// 编码 `num_frames` 帧所需的输出字节数
    fn encoded_size(&self, num_frames: usize, partial: bool) -> usize {
        let header_bits = (TAG_BITS + INSTANCE_BITS + UNUSED_HEADER_BITS + 4) as usize
            + if partial { 32 } else { 0 };
        let sample_bits = num_frames
            * self.params.channels as usize
            * self.params.bit_depth.bits() as usize;
        let total_bits = self.layout.len() * header_bits + sample_bits + TAG_BITS as usize;
        total_bits.div_ceil(8)
    }

    fn write_element(
        &self,
        bw: &mut BitWriter<'_>,
        slot: &ElementSlot,
        frame: &[u8],
        num_frames: usize,
        partial: bool,
    ) -> AlacResult<()> {
        bw.write_bits(slot.kind.tag(), TAG_BITS)?;
        bw.write_bits(slot.instance, INSTANCE_BITS)?;
        bw.write_bits(0, UNUSED_HEADER_BITS)?;
        bw.write_bits((u32::from(partial) << 3) | 1, 4)?;
        if partial {
            bw.write_bits(num_frames as u32, 32)?;
        }

        let depth = self.params.bit_depth;
        let bits = depth.bits();
        let bps = self.params.bytes_per_sample();
        let bpf = self.params.bytes_per_frame();
        for i in 0..num_frames {
            for ch in 0..slot.kind.channels() {
                let off = i * bpf + (slot.first_channel + ch) as usize * bps;
                let sample = depth.read_sample(&frame[off..off + bps]);
                bw.write_bits_signed(sample, bits)?;
            }
        }
        Ok(())
    }
}

impl PacketEncoder for AlacEncoder {
    fn name(&self) -> &str {
        "alac"
    }

    fn max_escape_header_bytes(&self) -> usize {
        let bits = self.layout.len() * ELEMENT_HEADER_MAX_BITS + TAG_BITS as usize;
        bits.div_ceil(8).max(MAX_ESCAPE_HEADER_BYTES)
    }

    fn encode(&mut self, frame: &[u8], out: &mut [u8]) -> AlacResult<usize> {
        let bpf = self.params.bytes_per_frame();
        let frame_length = self.params.frames_per_packet as usize;
        let num_frames = frame.len() / bpf;
        let trailing = frame.len() % bpf;

        if num_frames > frame_length {
            return Err(AlacError::InvalidArgument(format!(
                "输入 {} 帧超过每包帧数 {frame_length}",
                num_frames,
            )));
        }
        if trailing != 0 {
            warn!("ALAC 编码: 丢弃 {trailing} 字节不完整的采样帧");
        }
        if num_frames == 0 {
            return Ok(0);
        }

        let partial = num_frames != frame_length;
        let needed = self.encoded_size(num_frames, partial);
        if out.len() < needed {
            return Err(AlacError::Codec(format!(
                "输出缓冲区不足: 需要 {needed} 字节, 实际 {} 字节",
                out.len(),
            )));
        }

        let mut bw = BitWriter::new(out);
        for slot in &self.layout {
            self.write_element(&mut bw, slot, frame, num_frames, partial)?;
        }
        bw.write_bits(ElementKind::End.tag(), TAG_BITS)?;
        let written = bw.finish();

        self.cookie.max_frame_bytes = self.cookie.max_frame_bytes.max(written as u32);
        self.packets_encoded += 1;
        trace!(
            "ALAC 编码: 数据包 #{}, {num_frames} 帧 -> {written} 字节",
            self.packets_encoded,
        );
        Ok(written)
    }

    fn magic_cookie(&self) -> Bytes {
        self.cookie.to_bytes()
    }
}
