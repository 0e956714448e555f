//! ALAC magic cookie.
//!
//! 解码器初始化所需的配置 (ALACSpecificConfig), 24 字节大端布局:
//!
//! | 字段 | 类型 |
//! |------|------|
//! | frame_length | u32 |
//! | compatible_version | u8 |
//! | bit_depth | u8 |
//! | pb / mb / kb | u8 × 3 |
//! | num_channels | u8 |
//! | max_run | u16 |
//! | max_frame_bytes | u32 |
//! | avg_bit_rate | u32 |
//! | sample_rate | u32 |
//!
//! 多于 2 个声道时追加 24 字节的 `chan` 声道布局 atom.
//! 解析时容忍 MP4 中常见的 `frma` atom 与 `alac` atom 头前缀.

use std::io::Cursor;

use alac_core::{AlacError, AlacResult, BitDepth, StreamParams};
use byteorder::{BigEndian, ReadBytesExt};
use bytes::{BufMut, Bytes, BytesMut};

/// ALACSpecificConfig 字节数
pub const CONFIG_SIZE: usize = 24;
/// `chan` atom 字节数 (atom 头 12 字节 + 布局 12 字节)
pub const CHANNEL_ATOM_SIZE: usize = 24;

/// 兼容版本号
const COMPATIBLE_VERSION: u8 = 0;
/// 自适应 Golomb 默认参数
const DEFAULT_PB: u8 = 40;
const DEFAULT_MB: u8 = 10;
const DEFAULT_KB: u8 = 14;
const DEFAULT_MAX_RUN: u16 = 255;

/// 各声道数对应的 CoreAudio 声道布局标识
const CHANNEL_LAYOUT_TAGS: [u32; 8] = [
    (100 << 16) | 1, // Mono
    (101 << 16) | 2, // Stereo
    (113 << 16) | 3, // MPEG_3_0_B
    (116 << 16) | 4, // MPEG_4_0_B
    (120 << 16) | 5, // MPEG_5_0_D
    (124 << 16) | 6, // MPEG_5_1_D
    (142 << 16) | 7, // AAC_6_1
    (127 << 16) | 8, // MPEG_7_1_B
];

/// ALAC magic cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicCookie {
    /// 每包帧数
    pub frame_length: u32,
    /// 兼容版本
    pub compatible_version: u8,
    /// 位深
    pub bit_depth: u8,
    /// 自适应 Golomb 参数
    pub pb: u8,
    pub mb: u8,
    pub kb: u8,
    /// 声道数
    pub num_channels: u8,
    /// 最大游程
    pub max_run: u16,
    /// 已知最大数据包字节数 (0 表示未知)
    pub max_frame_bytes: u32,
    /// 平均码率 (0 表示未知)
    pub avg_bit_rate: u32,
    /// 采样率
    pub sample_rate: u32,
}

impl MagicCookie {
    /// 按流参数生成默认配置
    pub fn from_params(params: &StreamParams) -> AlacResult<Self> {
        let num_channels = u8::try_from(params.channels)
            .map_err(|_| AlacError::InvalidArgument(format!("声道数过大: {}", params.channels)))?;
        Ok(Self {
            frame_length: params.frames_per_packet,
            compatible_version: COMPATIBLE_VERSION,
            bit_depth: params.bit_depth.bits() as u8,
            pb: DEFAULT_PB,
            mb: DEFAULT_MB,
            kb: DEFAULT_KB,
            num_channels,
            max_run: DEFAULT_MAX_RUN,
            max_frame_bytes: 0,
            avg_bit_rate: 0,
            sample_rate: params.sample_rate,
        })
    }

    /// 序列化为 cookie 字节
    pub fn to_bytes(&self) -> Bytes {
        let with_layout = self.num_channels > 2;
        let size = CONFIG_SIZE + if with_layout { CHANNEL_ATOM_SIZE } else { 0 };
        let mut buf = BytesMut::with_capacity(size);

        self.put_config(&mut buf);
        if with_layout {
            let tag = CHANNEL_LAYOUT_TAGS
                .get(usize::from(self.num_channels) - 1)
                .copied()
                .unwrap_or(0);
            put_channel_atom(&mut buf, tag);
        }
        buf.freeze()
    }

    fn put_config(&self, buf: &mut BytesMut) {
        buf.put_u32(self.frame_length);
        buf.put_u8(self.compatible_version);
        buf.put_u8(self.bit_depth);
        buf.put_u8(self.pb);
        buf.put_u8(self.mb);
        buf.put_u8(self.kb);
        buf.put_u8(self.num_channels);
        buf.put_u16(self.max_run);
        buf.put_u32(self.max_frame_bytes);
        buf.put_u32(self.avg_bit_rate);
        buf.put_u32(self.sample_rate);
    }

    /// 解析 cookie 字节
    pub fn parse(data: &[u8]) -> AlacResult<Self> {
        let data = skip_atom(data, b"frma");
        let data = skip_atom_header(data, b"alac");

        if data.len() < CONFIG_SIZE {
            return Err(AlacError::InvalidData(format!(
                "magic cookie 过短: {} 字节, 至少需要 {CONFIG_SIZE} 字节",
                data.len(),
            )));
        }

        let mut rdr = Cursor::new(&data[..CONFIG_SIZE]);
        let cookie = Self::read_config(&mut rdr)
            .map_err(|e| AlacError::InvalidData(format!("magic cookie 解析失败: {e}")))?;

        if cookie.compatible_version > COMPATIBLE_VERSION {
            return Err(AlacError::Unsupported(format!(
                "不支持的 ALAC 兼容版本: {}",
                cookie.compatible_version,
            )));
        }
        Ok(cookie)
    }

    fn read_config(rdr: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self {
            frame_length: rdr.read_u32::<BigEndian>()?,
            compatible_version: rdr.read_u8()?,
            bit_depth: rdr.read_u8()?,
            pb: rdr.read_u8()?,
            mb: rdr.read_u8()?,
            kb: rdr.read_u8()?,
            num_channels: rdr.read_u8()?,
            max_run: rdr.read_u16::<BigEndian>()?,
            max_frame_bytes: rdr.read_u32::<BigEndian>()?,
            avg_bit_rate: rdr.read_u32::<BigEndian>()?,
            sample_rate: rdr.read_u32::<BigEndian>()?,
        })
    }

    /// 校验 cookie 与解码参数一致
    pub fn check_params(&self, params: &StreamParams) -> AlacResult<()> {
        let bit_depth = BitDepth::from_bits(u32::from(self.bit_depth))?;
        if u32::from(self.num_channels) != params.channels {
            return Err(AlacError::InvalidArgument(format!(
                "cookie 声道数 {} 与参数 {} 不一致",
                self.num_channels, params.channels,
            )));
        }
        if bit_depth != params.bit_depth {
            return Err(AlacError::InvalidArgument(format!(
                "cookie 位深 {} 与参数 {} 不一致",
                bit_depth, params.bit_depth,
            )));
        }
        if self.frame_length != params.frames_per_packet {
            return Err(AlacError::InvalidArgument(format!(
                "cookie 每包帧数 {} 与参数 {} 不一致",
                self.frame_length, params.frames_per_packet,
            )));
        }
        Ok(())
    }
}

fn put_channel_atom(buf: &mut BytesMut, layout_tag: u32) {
    buf.put_u32(CHANNEL_ATOM_SIZE as u32);
    buf.put_slice(b"chan");
    buf.put_u32(0); // version + flags
    buf.put_u32(layout_tag);
    buf.put_u32(0); // channel bitmap
    buf.put_u32(0); // number of channel descriptions
}

/// 若以指定类型的完整 atom 开头则跳过整个 atom
fn skip_atom<'a>(data: &'a [u8], kind: &[u8; 4]) -> &'a [u8] {
    if data.len() >= 8 && &data[4..8] == kind {
        let size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if size >= 8 && size <= data.len() {
            return &data[size..];
        }
    }
    data
}

/// 若以指定类型的 full atom 头 (size + type + version/flags) 开头则跳过头部
fn skip_atom_header<'a>(data: &'a [u8], kind: &[u8; 4]) -> &'a [u8] {
    if data.len() >= 12 && &data[4..8] == kind {
        return &data[12..];
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_params() -> StreamParams {
        StreamParams::new(44100, 2, BitDepth::S16, 4096).unwrap()
    }

    #[test]
    fn test_stereo_cookie_layout() {
        let cookie = MagicCookie::from_params(&stereo_params()).unwrap();
        let bytes = cookie.to_bytes();
        assert_eq!(bytes.len(), CONFIG_SIZE);
        assert_eq!(&bytes[0..4], &4096u32.to_be_bytes());
        assert_eq!(bytes[5], 16);
        assert_eq!(bytes[9], 2);
        assert_eq!(&bytes[20..24], &44100u32.to_be_bytes());
        assert_eq!(MagicCookie::parse(&bytes).unwrap(), cookie);
    }

    #[test]
    fn test_multichannel_appends_chan_atom() {
        let params = StreamParams::new(48000, 6, BitDepth::S24, 4096).unwrap();
        let bytes = MagicCookie::from_params(&params).unwrap().to_bytes();
        assert_eq!(bytes.len(), CONFIG_SIZE + CHANNEL_ATOM_SIZE);
        assert_eq!(&bytes[28..32], b"chan");
        assert_eq!(&bytes[36..40], &((124u32 << 16) | 6).to_be_bytes());
    }

    #[test]
    fn test_to_bytes_writes_every_field() {
        let params = StreamParams::new(96000, 3, BitDepth::S20, 1024).unwrap();
        let cookie = MagicCookie::from_params(&params).unwrap();
        let bytes = cookie.to_bytes();

        let mut expected = Vec::new();
        expected.extend_from_slice(&1024u32.to_be_bytes());
        expected.extend_from_slice(&[0, 20, 40, 10, 14, 3]);
        expected.extend_from_slice(&255u16.to_be_bytes());
        expected.extend_from_slice(&cookie.max_frame_bytes.to_be_bytes());
        expected.extend_from_slice(&cookie.avg_bit_rate.to_be_bytes());
        expected.extend_from_slice(&96000u32.to_be_bytes());
        // chan atom
        expected.extend_from_slice(&24u32.to_be_bytes());
        expected.extend_from_slice(b"chan");
        expected.extend_from_slice(&0u32.to_be_bytes());
        expected.extend_from_slice(&CHANNEL_LAYOUT_TAGS[2].to_be_bytes());
        expected.extend_from_slice(&[0u8; 8]);

        assert_eq!(&bytes[..], &expected[..]);
        assert_eq!(MagicCookie::parse(&bytes).unwrap(), cookie);
    }

    #[test]
    fn test_skips_frma_and_alac_prefix() {
        let cookie = MagicCookie::from_params(&stereo_params()).unwrap();
        let mut wrapped = Vec::new();
        wrapped.extend_from_slice(&12u32.to_be_bytes());
        wrapped.extend_from_slice(b"frma");
        wrapped.extend_from_slice(b"alac");
        wrapped.extend_from_slice(&36u32.to_be_bytes());
        wrapped.extend_from_slice(b"alac");
        wrapped.extend_from_slice(&0u32.to_be_bytes());
        wrapped.extend_from_slice(&cookie.to_bytes());
        assert_eq!(MagicCookie::parse(&wrapped).unwrap(), cookie);
    }

    #[test]
    fn test_cookie_too_short() {
        assert!(matches!(
            MagicCookie::parse(&[0u8; 10]),
            Err(AlacError::InvalidData(_))
        ));
    }

    #[test]
    fn test_params_mismatch() {
        let cookie = MagicCookie::from_params(&stereo_params()).unwrap();
        let mono = StreamParams::new(44100, 1, BitDepth::S16, 4096).unwrap();
        assert!(cookie.check_params(&mono).is_err());
        let short = StreamParams::new(44100, 2, BitDepth::S16, 1024).unwrap();
        assert!(cookie.check_params(&short).is_err());
        assert!(cookie.check_params(&stereo_params()).is_ok());
    }
}
