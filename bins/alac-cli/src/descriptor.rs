//! 流描述文件 (JSON).
//!
//! 裸数据包文件本身没有边界信息, 解码需要编码时记录的参数、magic cookie
//! 与数据包长度表, 统一保存在一个 JSON 描述文件中.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use alac_stream::DecoderOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 编码流描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u32,
    /// 位深
    pub bit_depth: u32,
    /// 每包帧数
    pub frames_per_packet: u32,
    /// 编码的采样帧总数
    #[serde(default)]
    pub total_frames: u64,
    /// magic cookie 字节
    pub cookie: Vec<u8>,
    /// 数据包长度表
    pub packet_lengths: Vec<u32>,
}

impl StreamDescriptor {
    /// 从文件读取
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("打开描述文件失败, path={}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("解析描述文件失败, path={}", path.display()))
    }

    /// 写入文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("创建描述文件失败, path={}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).context("序列化描述文件失败")?;
        writer.flush()?;
        Ok(())
    }

    /// 压缩数据总字节数
    pub fn compressed_bytes(&self) -> u64 {
        self.packet_lengths.iter().map(|&len| u64::from(len)).sum()
    }

    /// 时长 (秒)
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_frames as f64 / f64::from(self.sample_rate)
    }

    /// 构造解码选项
    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions {
            cookie: Some(self.cookie.clone().into()),
            channels: Some(self.channels),
            bit_depth: Some(self.bit_depth),
            frames_per_packet: Some(self.frames_per_packet),
            packets: self.packet_lengths.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StreamDescriptor {
        StreamDescriptor {
            sample_rate: 48000,
            channels: 2,
            bit_depth: 24,
            frames_per_packet: 4096,
            total_frames: 96000,
            cookie: vec![0, 0, 16, 0],
            packet_lengths: vec![100, 200, 50],
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.json");
        let desc = sample();
        desc.save(&path).unwrap();
        assert_eq!(StreamDescriptor::load(&path).unwrap(), desc);
    }

    #[test]
    fn test_summary_stats() {
        let desc = sample();
        assert_eq!(desc.compressed_bytes(), 350);
        assert!((desc.duration_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StreamDescriptor::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_decoder_options() {
        let options = sample().decoder_options();
        assert_eq!(options.packets, vec![100, 200, 50]);
        assert_eq!(options.bit_depth, Some(24));
    }
}
