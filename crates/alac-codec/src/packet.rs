//! 压缩数据包 (Packet).
//!
//! 分帧器每次成功编码输出一个数据包, 携带其在压缩流中的字节偏移.

use bytes::Bytes;

/// 压缩数据包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// 压缩数据
    pub data: Bytes,
    /// 在压缩流中的起始字节偏移
    pub pos: u64,
}

impl Packet {
    /// 从数据和偏移创建数据包
    pub fn new(data: impl Into<Bytes>, pos: u64) -> Self {
        Self {
            data: data.into(),
            pos,
        }
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 紧随本包之后的流偏移
    pub fn end(&self) -> u64 {
        self.pos + self.data.len() as u64
    }
}
