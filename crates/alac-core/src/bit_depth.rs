//! PCM 位深定义.
//!
//! ALAC 支持 16/20/24/32 位采样. PCM 侧统一使用小端交错排列,
//! 20 位采样左对齐存放在 3 字节容器中 (低 4 位忽略).

use std::fmt;

use crate::{AlacError, AlacResult};

/// PCM 位深
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 16 位, 2 字节容器
    S16,
    /// 20 位, 3 字节容器 (左对齐)
    S20,
    /// 24 位, 3 字节容器
    S24,
    /// 32 位, 4 字节容器
    S32,
}

impl BitDepth {
    /// 从位数创建
    pub fn from_bits(bits: u32) -> AlacResult<Self> {
        match bits {
            16 => Ok(Self::S16),
            20 => Ok(Self::S20),
            24 => Ok(Self::S24),
            32 => Ok(Self::S32),
            other => Err(AlacError::InvalidArgument(format!(
                "不支持的位深: {other}, 仅支持 16/20/24/32",
            ))),
        }
    }

    /// 有效位数
    pub const fn bits(&self) -> u32 {
        match self {
            Self::S16 => 16,
            Self::S20 => 20,
            Self::S24 => 24,
            Self::S32 => 32,
        }
    }

    /// 每个采样点在 PCM 容器中占用的字节数
    pub const fn bytes_per_sample(&self) -> u32 {
        match self {
            Self::S16 => 2,
            Self::S20 | Self::S24 => 3,
            Self::S32 => 4,
        }
    }

    /// 从小端 PCM 容器中读取一个采样值 (已右对齐并符号扩展)
    ///
    /// `src` 长度必须等于 `bytes_per_sample()`.
    pub fn read_sample(&self, src: &[u8]) -> i32 {
        match self {
            Self::S16 => i32::from(i16::from_le_bytes([src[0], src[1]])),
            Self::S20 => read_i24_le(src) >> 4,
            Self::S24 => read_i24_le(src),
            Self::S32 => i32::from_le_bytes([src[0], src[1], src[2], src[3]]),
        }
    }

    /// 将一个采样值写入小端 PCM 容器
    pub fn write_sample(&self, value: i32, dst: &mut [u8]) {
        match self {
            Self::S16 => dst[..2].copy_from_slice(&(value as i16).to_le_bytes()),
            Self::S20 => dst[..3].copy_from_slice(&(value << 4).to_le_bytes()[..3]),
            Self::S24 => dst[..3].copy_from_slice(&value.to_le_bytes()[..3]),
            Self::S32 => dst[..4].copy_from_slice(&value.to_le_bytes()),
        }
    }
}

/// 读取 3 字节小端有符号整数
fn read_i24_le(src: &[u8]) -> i32 {
    (i32::from_le_bytes([0, src[0], src[1], src[2]])) >> 8
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bit", self.bits())
    }
}
