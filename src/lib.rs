//! # alac-stream
//!
//! 纯 Rust 实现的 ALAC 流式编解码分帧库.
//!
//! 以任意大小的字节块驱动编码/解码:
//! - **编码**: PCM 字节块 → 定长帧 → ALAC 数据包 + 数据包长度表
//! - **解码**: 任意切分的压缩字节 + 数据包长度表 → PCM 字节块
//!
//! # 快速开始
//!
//! ```rust
//! use alac_stream::{DecoderOptions, EncoderOptions};
//!
//! let mut framer = alac_stream::encoder(&EncoderOptions {
//!     sample_rate: Some(44100),
//!     channels: Some(2),
//!     bit_depth: Some(16),
//!     frames_per_packet: None,
//! })
//! .unwrap();
//!
//! let pcm = vec![0u8; 4096 * 4 + 400];
//! let mut compressed = Vec::new();
//! for packet in framer.feed(&pcm).unwrap() {
//!     compressed.extend_from_slice(&packet.data);
//! }
//! compressed.extend_from_slice(&framer.finish().unwrap().unwrap().data);
//!
//! let mut deframer = alac_stream::decoder(&DecoderOptions {
//!     cookie: Some(framer.magic_cookie()),
//!     channels: Some(2),
//!     bit_depth: Some(16),
//!     frames_per_packet: Some(4096),
//!     packets: framer.packet_table().to_vec(),
//! })
//! .unwrap();
//! let decoded = deframer.feed(&compressed).unwrap().concat();
//! deframer.finish().unwrap();
//! assert_eq!(decoded, pcm);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `alac-core` | 错误类型, 流参数, 位读写 |
//! | `alac-codec` | 分帧器, 重组器, ALAC 引擎 |

mod options;

/// 核心类型与工具
pub use alac_core as core;

/// 分帧/重组与编解码引擎
pub use alac_codec as codec;

pub use alac_codec::{DecodingDeframer, EncodingFramer, Packet, PacketLengthTable};
pub use alac_core::{AlacError, AlacResult};
pub use options::{DecoderOptions, EncoderOptions, decoder, encoder};

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
