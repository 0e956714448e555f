//! 数据包长度表.
//!
//! 按输出顺序记录每个压缩数据包的精确字节数. 编码端逐个追加,
//! 解码端从队首逐个取出, 用来在无分隔的压缩字节流中恢复数据包边界.

use std::collections::VecDeque;

/// 数据包长度表 (FIFO)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketLengthTable {
    /// 各数据包字节数
    lengths: VecDeque<u32>,
}

impl PacketLengthTable {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 在队尾追加一个长度
    pub fn push(&mut self, length: u32) {
        self.lengths.push_back(length);
    }

    /// 查看队首长度
    pub fn front(&self) -> Option<u32> {
        self.lengths.front().copied()
    }

    /// 取出队首长度
    pub fn pop_front(&mut self) -> Option<u32> {
        self.lengths.pop_front()
    }

    /// 表中条目数
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// 按顺序遍历所有长度
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.lengths.iter().copied()
    }

    /// 所有条目之和 (字节)
    pub fn total_bytes(&self) -> u64 {
        self.lengths.iter().map(|&l| u64::from(l)).sum()
    }

    /// 转换为 Vec, 便于持久化
    pub fn to_vec(&self) -> Vec<u32> {
        self.lengths.iter().copied().collect()
    }
}

impl Extend<u32> for PacketLengthTable {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.lengths.extend(iter);
    }
}

impl FromIterator<u32> for PacketLengthTable {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            lengths: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<u32>> for PacketLengthTable {
    fn from(lengths: Vec<u32>) -> Self {
        Self {
            lengths: lengths.into(),
        }
    }
}
