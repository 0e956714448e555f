//! 流参数.
//!
//! 每个编码/解码流实例在构造时确定的不可变参数, 以及由此派生的
//! 帧大小与数据包大小.

use log::debug;

use crate::{AlacError, AlacResult, BitDepth};

/// 流参数
///
/// 派生关系:
/// - `bytes_per_frame = channels × bytes_per_sample`
/// - `bytes_per_packet = bytes_per_frame × frames_per_packet`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道数
    pub channels: u32,
    /// 位深
    pub bit_depth: BitDepth,
    /// 每个数据包包含的采样帧数
    pub frames_per_packet: u32,
}

impl StreamParams {
    /// 创建并校验流参数
    pub fn new(
        sample_rate: u32,
        channels: u32,
        bit_depth: BitDepth,
        frames_per_packet: u32,
    ) -> AlacResult<Self> {
        let reject = |reason: &str| {
            debug!(
                "拒绝流参数: {reason} (采样率={sample_rate}, 声道={channels}, 位深={bit_depth}, 每包帧数={frames_per_packet})"
            );
            AlacError::InvalidArgument(reason.to_string())
        };
        if sample_rate == 0 {
            return Err(reject("采样率不能为 0"));
        }
        if channels == 0 {
            return Err(reject("声道数不能为 0"));
        }
        if frames_per_packet == 0 {
            return Err(reject("每包帧数不能为 0"));
        }
        let params = Self {
            sample_rate,
            channels,
            bit_depth,
            frames_per_packet,
        };
        (channels as usize)
            .checked_mul(params.bytes_per_sample())
            .and_then(|b| b.checked_mul(frames_per_packet as usize))
            .ok_or_else(|| reject("每包字节数溢出"))?;
        Ok(params)
    }

    /// 每个采样点占用的字节数
    pub fn bytes_per_sample(&self) -> usize {
        self.bit_depth.bytes_per_sample() as usize
    }

    /// 每个采样帧 (所有声道各一个采样) 的字节数
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.bytes_per_sample()
    }

    /// 每个完整数据包对应的 PCM 字节数
    pub fn bytes_per_packet(&self) -> usize {
        self.bytes_per_frame() * self.frames_per_packet as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_sizes_stereo_s16() {
        let params = StreamParams::new(44100, 2, BitDepth::S16, 4096).unwrap();
        assert_eq!(params.bytes_per_sample(), 2);
        assert_eq!(params.bytes_per_frame(), 4);
        assert_eq!(params.bytes_per_packet(), 4 * 4096);
    }

    #[test]
    fn test_derived_sizes_6ch_s24() {
        let params = StreamParams::new(48000, 6, BitDepth::S24, 1024).unwrap();
        assert_eq!(params.bytes_per_frame(), 18);
        assert_eq!(params.bytes_per_packet(), 18 * 1024);
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            StreamParams::new(0, 2, BitDepth::S16, 4096),
            Err(AlacError::InvalidArgument(_))
        ));
        assert!(matches!(
            StreamParams::new(44100, 0, BitDepth::S16, 4096),
            Err(AlacError::InvalidArgument(_))
        ));
        assert!(matches!(
            StreamParams::new(44100, 2, BitDepth::S16, 0),
            Err(AlacError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_packet_size_overflow_rejected() {
        match StreamParams::new(44100, u32::MAX, BitDepth::S32, u32::MAX) {
            Err(AlacError::InvalidArgument(msg)) => assert!(msg.contains("溢出")),
            other => panic!("期望 InvalidArgument, 实际 {other:?}"),
        }
    }
}
