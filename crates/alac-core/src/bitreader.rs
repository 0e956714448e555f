//! 比特流读取器.
//!
//! 从 ALAC 数据包中按位读取元素头与采样值.
//!
//! 按大端位序读取 (MSB first), 与 `BitWriter` 对应.

use crate::{AlacError, AlacResult};

/// 比特流读取器
///
/// # 示例
/// ```
/// use alac_core::bitreader::BitReader;
///
/// let data = [0b10110001, 0b01010101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(4).unwrap(), 0b0001);
/// assert_eq!(br.read_bits(8).unwrap(), 0b01010101);
/// ```
pub struct BitReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 当前字节索引
    byte_pos: usize,
    /// 当前字节中的位位置 (0-7, 0 表示最高位)
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// 获取已读取的总位数
    pub fn bits_read(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    /// 获取剩余可读位数
    pub fn bits_left(&self) -> usize {
        if self.byte_pos >= self.data.len() {
            return 0;
        }
        (self.data.len() - self.byte_pos) * 8 - self.bit_pos as usize
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// 按大端位序读取, 返回值的低 N 位有效.
    pub fn read_bits(&mut self, n: u32) -> AlacResult<u32> {
        if n == 0 {
            return Ok(0);
        }
        if n > 32 {
            return Err(AlacError::InvalidArgument(format!(
                "read_bits: n={n} 超过 32 位",
            )));
        }
        if (n as usize) > self.bits_left() {
            return Err(AlacError::Eof);
        }

        let mut result: u32 = 0;
        let mut remaining = n;

        while remaining > 0 {
            let available = 8 - self.bit_pos as u32;
            let to_read = remaining.min(available);

            let shift = available - to_read;
            let mask = ((1u32 << to_read) - 1) as u8;
            let bits = (self.data[self.byte_pos] >> shift) & mask;

            result = (result << to_read) | u32::from(bits);

            self.bit_pos += to_read as u8;
            if self.bit_pos >= 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
            remaining -= to_read;
        }

        Ok(result)
    }

    /// 读取有符号整数 (二进制补码)
    pub fn read_bits_signed(&mut self, n: u32) -> AlacResult<i32> {
        let val = self.read_bits(n)?;
        if n == 0 {
            return Ok(0);
        }
        if n >= 32 {
            return Ok(val as i32);
        }
        // 符号扩展
        let shift = 32 - n;
        Ok(((val << shift) as i32) >> shift)
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: usize) -> AlacResult<()> {
        if n > self.bits_left() {
            return Err(AlacError::Eof);
        }

        let total_bits = self.bit_pos as usize + n;
        self.byte_pos += total_bits / 8;
        self.bit_pos = (total_bits % 8) as u8;

        Ok(())
    }

    /// 对齐到下一个字节边界
    ///
    /// 如果当前已在字节边界, 则不做任何事.
    pub fn align_to_byte(&mut self) {
        if self.bit_pos > 0 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_basic() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data);

        assert_eq!(br.read_bits(1).unwrap(), 1);
        assert_eq!(br.read_bits(1).unwrap(), 0);
        assert_eq!(br.read_bits(2).unwrap(), 0b11);
        assert_eq!(br.read_bits(4).unwrap(), 0b0001);
        assert_eq!(br.read_bits(8).unwrap(), 0b01010101);

        assert_eq!(br.bits_left(), 0);
    }

    #[test]
    fn test_read_bits_32_bit() {
        let data = [0xFF, 0x00, 0xFF, 0x00];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_bits(32).unwrap(), 0xFF00FF00);
    }

    #[test]
    fn test_read_bits_unaligned_across_bytes() {
        // 3 位头 + 20 位值 + 1 位
        let data = [0b101_10010, 0b00110100, 0b01010111];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_bits(3).unwrap(), 0b101);
        assert_eq!(br.read_bits(20).unwrap(), 0b10010_00110100_0101011);
        assert_eq!(br.read_bits(1).unwrap(), 1);
    }

    #[test]
    fn test_read_bits_signed() {
        let data = [0b11111000]; // -1 in 5 bits = 0b11111
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_bits_signed(5).unwrap(), -1);

        let data2 = [0b01010000]; // 10 in 5 bits = 0b01010
        let mut br2 = BitReader::new(&data2);
        assert_eq!(br2.read_bits_signed(5).unwrap(), 10);

        let data3 = [0x80, 0x00, 0x00, 0x00];
        let mut br3 = BitReader::new(&data3);
        assert_eq!(br3.read_bits_signed(32).unwrap(), i32::MIN);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0xAB];
        let mut br = BitReader::new(&data);
        br.read_bits(4).unwrap();
        assert!(matches!(br.read_bits(5), Err(AlacError::Eof)));
    }

    #[test]
    fn test_skip_bits() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data);

        br.skip_bits(4).unwrap();
        assert_eq!(br.read_bits(4).unwrap(), 0b0001);
        br.skip_bits(4).unwrap();
        assert_eq!(br.read_bits(4).unwrap(), 0b0101);
        assert!(matches!(br.skip_bits(1), Err(AlacError::Eof)));
    }

    #[test]
    fn test_align_to_byte() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data);

        br.read_bits(3).unwrap();
        br.align_to_byte();
        assert_eq!(br.bits_read(), 8);
        assert_eq!(br.read_bits(8).unwrap(), 0b01010101);
    }

    #[test]
    fn test_bits_left() {
        let data = [0x00, 0x00];
        let mut br = BitReader::new(&data);

        assert_eq!(br.bits_left(), 16);
        br.read_bits(5).unwrap();
        assert_eq!(br.bits_left(), 11);
        assert_eq!(br.bits_read(), 5);
        br.read_bits(11).unwrap();
        assert_eq!(br.bits_left(), 0);
    }
}
