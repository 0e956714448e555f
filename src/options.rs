//! 构造选项.
//!
//! 选项字段均为 `Option`, 缺失的必填项在构造时报错并指明参数名.

use alac_codec::{
    AlacDecoder, AlacEncoder, DEFAULT_FRAMES_PER_PACKET, DecodingDeframer, EncodingFramer,
    MagicCookie,
};
use alac_core::{AlacError, AlacResult, BitDepth, StreamParams};
use bytes::Bytes;
use log::debug;

/// 编码选项
#[derive(Debug, Clone, Default)]
pub struct EncoderOptions {
    /// 采样率 (必填)
    pub sample_rate: Option<u32>,
    /// 声道数 (必填)
    pub channels: Option<u32>,
    /// 位深 (必填)
    pub bit_depth: Option<u32>,
    /// 每包帧数, 默认 4096
    pub frames_per_packet: Option<u32>,
}

/// 解码选项
#[derive(Debug, Clone, Default)]
pub struct DecoderOptions {
    /// 编码端输出的 magic cookie (必填)
    pub cookie: Option<Bytes>,
    /// 声道数 (必填)
    pub channels: Option<u32>,
    /// 位深 (必填)
    pub bit_depth: Option<u32>,
    /// 每包帧数 (必填)
    pub frames_per_packet: Option<u32>,
    /// 预先已知的数据包长度表
    pub packets: Vec<u32>,
}

fn required<T>(value: Option<T>, name: &str) -> AlacResult<T> {
    value.ok_or_else(|| AlacError::InvalidArgument(format!("缺少参数: {name}")))
}

/// 创建编码分帧器
pub fn encoder(options: &EncoderOptions) -> AlacResult<EncodingFramer> {
    let sample_rate = required(options.sample_rate, "sample_rate")?;
    let channels = required(options.channels, "channels")?;
    let bit_depth = BitDepth::from_bits(required(options.bit_depth, "bit_depth")?)?;
    let frames_per_packet = options
        .frames_per_packet
        .unwrap_or(DEFAULT_FRAMES_PER_PACKET);

    let params = StreamParams::new(sample_rate, channels, bit_depth, frames_per_packet)?;
    Ok(EncodingFramer::new(params, AlacEncoder::create(&params)?))
}

/// 创建解码重组器
///
/// 采样率取自 cookie.
pub fn decoder(options: &DecoderOptions) -> AlacResult<DecodingDeframer> {
    let cookie = required(options.cookie.as_ref(), "cookie")?;
    let channels = required(options.channels, "channels")?;
    let bit_depth = BitDepth::from_bits(required(options.bit_depth, "bit_depth")?)?;
    let frames_per_packet = required(options.frames_per_packet, "frames_per_packet")?;

    let config = MagicCookie::parse(cookie)?;
    let params = StreamParams::new(config.sample_rate, channels, bit_depth, frames_per_packet)?;
    let engine = AlacDecoder::create(&params, cookie)?;
    debug!("解码器预置 {} 个数据包长度", options.packets.len());
    DecodingDeframer::with_packet_lengths(params, engine, options.packets.iter().copied())
}
