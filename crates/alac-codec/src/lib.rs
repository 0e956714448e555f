//! # alac-codec
//!
//! ALAC 流式编解码库: 把任意大小的字节块整理成编解码引擎需要的记录边界.
//!
//! - **编码方向**: [`EncodingFramer`] 把 PCM 字节块重组为定长帧, 每帧调用一次引擎,
//!   立即输出压缩数据包, 并记录数据包长度表.
//! - **解码方向**: [`DecodingDeframer`] 依据数据包长度表从任意切分的压缩字节流中
//!   重组完整数据包, 每个数据包调用一次引擎.
//!
//! 引擎通过 [`PacketEncoder`] / [`PacketDecoder`] trait 接入, 内置实现见
//! [`encoders::alac`] 与 [`decoders::alac`].
//!
//! ## 使用示例
//!
//! ```rust
//! use alac_codec::{AlacDecoder, AlacEncoder, DecodingDeframer, EncodingFramer};
//! use alac_core::{BitDepth, StreamParams};
//!
//! let params = StreamParams::new(44100, 2, BitDepth::S16, 16).unwrap();
//! let mut framer = EncodingFramer::new(params, AlacEncoder::create(&params).unwrap());
//!
//! let pcm: Vec<u8> = (0..200u8).collect();
//! let mut compressed = Vec::new();
//! for chunk in pcm.chunks(37) {
//!     for packet in framer.feed(chunk).unwrap() {
//!         compressed.extend_from_slice(&packet.data);
//!     }
//! }
//! if let Some(packet) = framer.finish().unwrap() {
//!     compressed.extend_from_slice(&packet.data);
//! }
//!
//! let cookie = framer.magic_cookie();
//! let mut deframer = DecodingDeframer::new(params, AlacDecoder::create(&params, &cookie).unwrap());
//! deframer.register_packet_lengths(framer.packet_table().iter()).unwrap();
//! let decoded: Vec<u8> = deframer.feed(&compressed).unwrap().concat();
//! deframer.finish().unwrap();
//! assert_eq!(decoded, pcm);
//! ```

use alac_core::{AlacError, AlacResult};

pub mod cookie;
pub mod decoders;
pub mod deframer;
pub mod element;
pub mod encoders;
pub mod engine;
pub mod framer;
pub mod io;
pub mod packet;
pub mod packet_table;

// 重导出常用类型
pub use cookie::MagicCookie;
pub use decoders::alac::AlacDecoder;
pub use deframer::DecodingDeframer;
pub use encoders::alac::AlacEncoder;
pub use engine::{PacketDecoder, PacketEncoder};
pub use framer::EncodingFramer;
pub use io::{DeframerWriter, FramerWriter};
pub use packet::Packet;
pub use packet_table::PacketLengthTable;

/// 默认每包帧数
pub const DEFAULT_FRAMES_PER_PACKET: u32 = 4096;

/// 单帧以 escape (未压缩) 方式存储时所需的最大额外头部字节数
pub const MAX_ESCAPE_HEADER_BYTES: usize = 8;

/// 流实例的生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// 接受输入
    Open,
    /// 已调用 `finish()`
    Finished,
    /// 引擎报错后中止, 不再产生任何输出
    Aborted,
}

impl StreamState {
    /// 仅在 `Open` 状态下允许继续调用
    pub(crate) fn ensure_open(self, what: &str) -> AlacResult<()> {
        match self {
            Self::Open => Ok(()),
            Self::Finished => Err(AlacError::StreamClosed(format!("{what}已结束"))),
            Self::Aborted => Err(AlacError::StreamClosed(format!("{what}已因错误中止"))),
        }
    }
}
