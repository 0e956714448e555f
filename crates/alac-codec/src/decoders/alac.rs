//! ALAC 解码引擎 (escape 帧).
//!
//! 逐个解析数据包中的元素直到 END:
//! - SCE / CPE / LFE: 读取 escape 采样并写入交错 PCM
//! - DSE / FIL: 跳过
//! - CCE / PCE 及压缩 (非 escape) 帧: 不支持

use alac_core::bitreader::BitReader;
use alac_core::{AlacError, AlacResult, StreamParams};
use log::{debug, trace};

use crate::cookie::MagicCookie;
use crate::element::{ElementKind, INSTANCE_BITS, TAG_BITS, UNUSED_HEADER_BITS};
use crate::engine::PacketDecoder;

/// ALAC 解码引擎
pub struct AlacDecoder {
    /// 流参数
    params: StreamParams,
    /// 解析后的 cookie
    cookie: MagicCookie,
    /// 已解码的数据包数
    packets_decoded: u64,
}

impl AlacDecoder {
    /// 按流参数与 magic cookie 创建解码引擎
    pub fn new(params: &StreamParams, cookie: &[u8]) -> AlacResult<Self> {
        let cookie = MagicCookie::parse(cookie)?;
        cookie.check_params(params)?;
        debug!(
            "打开 ALAC 解码器: {} Hz, {} 声道, {}, 每包 {} 帧",
            cookie.sample_rate, params.channels, params.bit_depth, cookie.frame_length,
        );
        Ok(Self {
            params: *params,
            cookie,
            packets_decoded: 0,
        })
    }

    /// 创建装箱的解码引擎实例
    pub fn create(params: &StreamParams, cookie: &[u8]) -> AlacResult<Box<dyn PacketDecoder>> {
        Ok(Box::new(Self::new(params, cookie)?))
    }

    fn decode_elements(&self, br: &mut BitReader<'_>, out: &mut [u8]) -> AlacResult<u32> {
        let mut channel_index = 0u32;
        let mut num_frames: Option<u32> = None;

        loop {
            let kind = ElementKind::from_tag(br.read_bits(TAG_BITS)?)?;
            match kind {
                ElementKind::Sce | ElementKind::Cpe | ElementKind::Lfe => {
                    let frames = self.decode_audio_element(br, kind, channel_index, out)?;
                    if let Some(prev) = num_frames {
                        if prev != frames {
                            return Err(AlacError::InvalidData(format!(
                                "元素采样帧数不一致: {prev} != {frames}",
                            )));
                        }
                    }
                    num_frames = Some(frames);
                    channel_index += kind.channels();
                }
                ElementKind::Dse => skip_data_stream_element(br)?,
                ElementKind::Fil => skip_fill_element(br)?,
                ElementKind::End => {
                    br.align_to_byte();
                    break;
                }
                ElementKind::Cce | ElementKind::Pce => {
                    return Err(AlacError::Unsupported(format!(
                        "不支持的 ALAC 元素: {kind:?}",
                    )));
                }
            }
        }

        let frames = num_frames.unwrap_or(0);
        if frames > 0 && channel_index != self.params.channels {
            return Err(AlacError::InvalidData(format!(
                "数据包包含 {channel_index} 个声道, 期望 {}",
                self.params.channels,
            )));
        }
        Ok(frames)
    }

    fn decode_audio_element(
        &self,
        br: &mut BitReader<'_>,
        kind: ElementKind,
        first_channel: u32,
        out: &mut [u8],
    ) -> AlacResult<u32> {
        let _instance = br.read_bits(INSTANCE_BITS)?;
        if br.read_bits(UNUSED_HEADER_BITS)? != 0 {
            return Err(AlacError::InvalidData("元素头保留位非零".into()));
        }

        let header = br.read_bits(4)?;
        let partial = (header >> 3) & 1 != 0;
        let escape = header & 1 != 0;

        let frames = if partial {
            br.read_bits(32)?
        } else {
            self.cookie.frame_length
        };
        if frames > self.cookie.frame_length {
            return Err(AlacError::InvalidData(format!(
                "采样帧数 {frames} 超过每包帧数 {}",
                self.cookie.frame_length,
            )));
        }
        if !escape {
            return Err(AlacError::Unsupported(
                "仅支持 escape (未压缩) 帧, 不支持压缩帧".into(),
            ));
        }

        let channels = kind.channels();
        if first_channel + channels > self.params.channels {
            return Err(AlacError::InvalidData(format!(
                "元素声道超出流声道数 {}",
                self.params.channels,
            )));
        }

        let depth = self.params.bit_depth;
        let bits = depth.bits();
        let bps = self.params.bytes_per_sample();
        let bpf = self.params.bytes_per_frame();
        if frames as usize * bpf > out.len() {
            return Err(AlacError::Codec(format!(
                "输出缓冲区不足: 需要 {} 字节, 实际 {} 字节",
                frames as usize * bpf,
                out.len(),
            )));
        }

        for i in 0..frames as usize {
            for ch in 0..channels {
                let sample = br.read_bits_signed(bits)?;
                let off = i * bpf + (first_channel + ch) as usize * bps;
                depth.write_sample(sample, &mut out[off..off + bps]);
            }
        }
        Ok(frames)
    }
}

/// 跳过 DSE 元素
fn skip_data_stream_element(br: &mut BitReader<'_>) -> AlacResult<()> {
    let _instance = br.read_bits(INSTANCE_BITS)?;
    let byte_align = br.read_bits(1)? != 0;
    let mut count = br.read_bits(8)?;
    if count == 255 {
        count += br.read_bits(8)?;
    }
    if byte_align {
        br.align_to_byte();
    }
    br.skip_bits(count as usize * 8)
}

/// 跳过 FIL 元素
fn skip_fill_element(br: &mut BitReader<'_>) -> AlacResult<()> {
    let mut count = br.read_bits(4)?;
    if count == 15 {
        count += br.read_bits(8)?;
        count -= 1;
    }
    br.skip_bits(count as usize * 8)
}

impl PacketDecoder for AlacDecoder {
    fn name(&self) -> &str {
        "alac"
    }

    fn decode(&mut self, packet: &[u8], out: &mut [u8]) -> AlacResult<u32> {
        let mut br = BitReader::new(packet);
        let frames = self.decode_elements(&mut br, out).map_err(|e| match e {
            AlacError::Eof => AlacError::InvalidData(format!(
                "数据包在第 {} 位处被截断",
                br.bits_read(),
            )),
            other => other,
        })?;
        self.packets_decoded += 1;
        trace!(
            "ALAC 解码: 数据包 #{}, {} 字节 -> {frames} 帧",
            self.packets_decoded,
            packet.len(),
        );
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::alac::AlacEncoder;
    use crate::engine::PacketEncoder;
    use alac_core::BitDepth;
    use alac_core::bitwriter::BitWriter;

    fn make_pair(params: &StreamParams) -> (AlacEncoder, AlacDecoder) {
        let enc = AlacEncoder::new(params).unwrap();
        let dec = AlacDecoder::new(params, &enc.magic_cookie()).unwrap();
        (enc, dec)
    }

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    fn encode_decode(params: &StreamParams, pcm: &[u8]) -> Vec<u8> {
        let (mut enc, mut dec) = make_pair(params);
        let mut packet = vec![0u8; pcm.len() + enc.max_escape_header_bytes()];
        let n = enc.encode(pcm, &mut packet).unwrap();
        let mut out = vec![0u8; params.bytes_per_packet()];
        let frames = dec.decode(&packet[..n], &mut out).unwrap();
        out.truncate(frames as usize * params.bytes_per_frame());
        out
    }

    #[test]
    fn test_roundtrip_depths_and_channels() {
        for channels in 1..=8 {
            for depth in [BitDepth::S16, BitDepth::S24, BitDepth::S32] {
                let params = StreamParams::new(44100, channels, depth, 32).unwrap();
                let pcm = ramp(params.bytes_per_packet());
                assert_eq!(encode_decode(&params, &pcm), pcm, "{channels} 声道 {depth}");
                let short = ramp(params.bytes_per_frame() * 5);
                assert_eq!(encode_decode(&params, &short), short);
            }
        }
    }

    #[test]
    fn test_s20_low_bits_cleared() {
        let params = StreamParams::new(44100, 2, BitDepth::S20, 8).unwrap();
        let pcm = ramp(params.bytes_per_packet());
        let decoded = encode_decode(&params, &pcm);
        let expected: Vec<u8> = pcm
            .chunks(3)
            .flat_map(|c| [c[0] & 0xF0, c[1], c[2]])
            .collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_skips_fil_and_dse() {
        let params = StreamParams::new(44100, 1, BitDepth::S16, 1).unwrap();
        let (_, mut dec) = make_pair(&params);

        let mut packet = [0u8; 16];
        let mut bw = BitWriter::new(&mut packet);
        // FIL: 2 字节填充
        bw.write_bits(ElementKind::Fil.tag(), 3).unwrap();
        bw.write_bits(2, 4).unwrap();
        bw.write_bits(0xFFFF, 16).unwrap();
        // DSE: 1 字节数据, 不对齐
        bw.write_bits(ElementKind::Dse.tag(), 3).unwrap();
        bw.write_bits(0, 4).unwrap();
        bw.write_bits(0, 1).unwrap();
        bw.write_bits(1, 8).unwrap();
        bw.write_bits(0xAA, 8).unwrap();
        // SCE escape, 完整帧
        bw.write_bits(ElementKind::Sce.tag(), 3).unwrap();
        bw.write_bits(0, 4).unwrap();
        bw.write_bits(0, 12).unwrap();
        bw.write_bits(0b0001, 4).unwrap();
        bw.write_bits_signed(-2, 16).unwrap();
        bw.write_bits(ElementKind::End.tag(), 3).unwrap();
        let n = bw.finish();

        let mut out = [0u8; 2];
        assert_eq!(dec.decode(&packet[..n], &mut out).unwrap(), 1);
        assert_eq!(out, (-2i16).to_le_bytes());
    }

    #[test]
    fn test_compressed_frame_unsupported() {
        let params = StreamParams::new(44100, 1, BitDepth::S16, 4).unwrap();
        let (_, mut dec) = make_pair(&params);
        let mut packet = [0u8; 4];
        let mut bw = BitWriter::new(&mut packet);
        bw.write_bits(ElementKind::Sce.tag(), 3).unwrap();
        bw.write_bits(0, 4).unwrap();
        bw.write_bits(0, 12).unwrap();
        bw.write_bits(0b0000, 4).unwrap();
        let n = bw.finish();

        let mut out = [0u8; 8];
        assert!(matches!(
            dec.decode(&packet[..n], &mut out),
            Err(AlacError::Unsupported(_))
        ));
    }

    #[test]
    fn test_truncated_packet() {
        let params = StreamParams::new(44100, 2, BitDepth::S16, 4).unwrap();
        let (mut enc, mut dec) = make_pair(&params);
        let pcm = ramp(params.bytes_per_packet());
        let mut packet = vec![0u8; pcm.len() + enc.max_escape_header_bytes()];
        let n = enc.encode(&pcm, &mut packet).unwrap();

        let mut out = vec![0u8; params.bytes_per_packet()];
        assert!(matches!(
            dec.decode(&packet[..n - 3], &mut out),
            Err(AlacError::InvalidData(_))
        ));
    }

    #[test]
    fn test_cookie_params_mismatch() {
        let params = StreamParams::new(44100, 2, BitDepth::S16, 4).unwrap();
        let enc = AlacEncoder::new(&params).unwrap();
        let other = StreamParams::new(44100, 2, BitDepth::S24, 4).unwrap();
        assert!(matches!(
            AlacDecoder::new(&other, &enc.magic_cookie()),
            Err(AlacError::InvalidArgument(_))
        ));
    }
}
