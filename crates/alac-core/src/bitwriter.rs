//! 比特流写入器.
//!
//! 直接向调用方提供的定长输出缓冲区按位写入, 编码引擎用它生成 ALAC 数据包.
//! 写满后返回错误而不是扩容, 调用方据此判断输出缓冲区是否足够.
//!
//! 按大端位序写入 (MSB first), 与 `BitReader` 对应.

use crate::{AlacError, AlacResult};

/// 比特流写入器
///
/// # 示例
/// ```
/// use alac_core::bitwriter::BitWriter;
///
/// let mut out = [0u8; 2];
/// let mut bw = BitWriter::new(&mut out);
/// bw.write_bits(0b1011, 4).unwrap();
/// bw.write_bits(0b0001, 4).unwrap();
/// bw.write_bits(0b01010101, 8).unwrap();
/// assert_eq!(bw.finish(), 2);
/// assert_eq!(out, [0b10110001, 0b01010101]);
/// ```
pub struct BitWriter<'a> {
    /// 输出缓冲区
    data: &'a mut [u8],
    /// 已写满的字节数
    byte_pos: usize,
    /// 当前字节 (正在填充)
    current_byte: u8,
    /// 当前字节中已填充的位数 (0-7)
    bit_count: u8,
}

impl<'a> BitWriter<'a> {
    /// 在输出缓冲区上创建写入器
    pub fn new(data: &'a mut [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// 获取已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.byte_pos * 8 + self.bit_count as usize
    }

    /// 输出缓冲区容量 (位)
    pub fn capacity_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// 写入 N 个位 (最多 32 位)
    ///
    /// 值的低 N 位被写入, 高位在前 (大端).
    pub fn write_bits(&mut self, value: u32, n: u32) -> AlacResult<()> {
        if n > 32 {
            return Err(AlacError::InvalidArgument(format!(
                "write_bits: n={n} 超过 32 位",
            )));
        }
        if self.bits_written() + n as usize > self.capacity_bits() {
            return Err(AlacError::Codec(format!(
                "输出缓冲区不足: 容量 {} 字节",
                self.data.len(),
            )));
        }

        let mut remaining = n;
        while remaining > 0 {
            let available = 8 - self.bit_count as u32;
            let to_write = remaining.min(available);

            let shift = remaining - to_write;
            let mask = (1u32 << to_write) - 1;
            let bits = ((value >> shift) & mask) as u8;

            self.current_byte = if to_write >= 8 {
                bits
            } else {
                (self.current_byte << to_write) | bits
            };
            self.bit_count += to_write as u8;

            if self.bit_count >= 8 {
                self.data[self.byte_pos] = self.current_byte;
                self.byte_pos += 1;
                self.current_byte = 0;
                self.bit_count = 0;
            }

            remaining -= to_write;
        }
        Ok(())
    }

    /// 写入有符号整数 (二进制补码, 取低 N 位)
    pub fn write_bits_signed(&mut self, value: i32, n: u32) -> AlacResult<()> {
        let mask = ((1u64 << n) - 1) as u32;
        self.write_bits((value as u32) & mask, n)
    }

    /// 对齐到字节边界 (用 0 填充)
    pub fn align_to_byte(&mut self) {
        if self.bit_count > 0 {
            let pad = 8 - self.bit_count;
            // 容量检查保证当前字节有位置
            self.data[self.byte_pos] = self.current_byte << pad;
            self.byte_pos += 1;
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// 完成写入, 返回写入的字节数
    ///
    /// 如果当前不在字节边界, 自动用 0 填充.
    pub fn finish(mut self) -> usize {
        self.align_to_byte();
        self.byte_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitreader::BitReader;

    #[test]
    fn test_write_bits_basic() {
        let mut out = [0u8; 1];
        let mut bw = BitWriter::new(&mut out);
        bw.write_bits(0b1011, 4).unwrap();
        bw.write_bits(0b0001, 4).unwrap();
        assert_eq!(bw.finish(), 1);
        assert_eq!(out, [0b10110001]);
    }

    #[test]
    fn test_write_bits_32_bit() {
        let mut out = [0u8; 4];
        let mut bw = BitWriter::new(&mut out);
        bw.write_bits(0xFF00FF00, 32).unwrap();
        assert_eq!(bw.finish(), 4);
        assert_eq!(out, [0xFF, 0x00, 0xFF, 0x00]);
    }

    #[test]
    fn test_align_to_byte() {
        let mut out = [0u8; 2];
        let mut bw = BitWriter::new(&mut out);
        bw.write_bits(0b101, 3).unwrap();
        bw.align_to_byte();
        bw.write_bits(0xFF, 8).unwrap();
        assert_eq!(bw.finish(), 2);
        assert_eq!(out, [0b10100000, 0xFF]);
    }

    #[test]
    fn test_write_past_capacity() {
        let mut out = [0u8; 1];
        let mut bw = BitWriter::new(&mut out);
        bw.write_bits(0b101, 3).unwrap();
        assert!(matches!(bw.write_bits(0x3F, 6), Err(AlacError::Codec(_))));
        // 失败的写入不改变已写位数
        assert_eq!(bw.bits_written(), 3);
    }

    #[test]
    fn test_read_write_roundtrip_signed() {
        let mut out = [0u8; 9];
        let mut bw = BitWriter::new(&mut out);
        bw.write_bits_signed(-1, 5).unwrap();
        bw.write_bits_signed(10, 5).unwrap();
        bw.write_bits_signed(-128, 8).unwrap();
        bw.write_bits_signed(-300_000, 20).unwrap();
        bw.write_bits_signed(i32::MIN, 32).unwrap();
        let len = bw.finish();

        let mut br = BitReader::new(&out[..len]);
        assert_eq!(br.read_bits_signed(5).unwrap(), -1);
        assert_eq!(br.read_bits_signed(5).unwrap(), 10);
        assert_eq!(br.read_bits_signed(8).unwrap(), -128);
        assert_eq!(br.read_bits_signed(20).unwrap(), -300_000);
        assert_eq!(br.read_bits_signed(32).unwrap(), i32::MIN);
    }
}
