//! 子命令实现.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use alac_codec::DeframerWriter;
use alac_stream::EncoderOptions;
use anyhow::{Context, Result, bail};
use log::{debug, info};

use crate::descriptor::StreamDescriptor;

/// 默认读取块大小 (64 KB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// 编码参数
pub struct EncodeJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub descriptor: &'a Path,
    pub options: EncoderOptions,
    pub chunk_size: usize,
}

/// 解码参数
pub struct DecodeJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub descriptor: &'a Path,
    pub chunk_size: usize,
}

/// 输出文件已存在且未指定 -y 时拒绝覆盖
pub fn check_overwrite(path: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && path.exists() {
        bail!("输出文件已存在 '{}', 使用 -y 覆盖", path.display());
    }
    Ok(())
}

/// 按块读取文件, 每块交给 `sink`
fn stream_file(
    path: &Path,
    chunk_size: usize,
    mut sink: impl FnMut(&[u8]) -> Result<()>,
) -> Result<u64> {
    if chunk_size == 0 {
        bail!("chunk-size 必须大于 0");
    }
    let file = File::open(path)
        .with_context(|| format!("打开输入文件失败, path={}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sink(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

/// PCM 文件 → 数据包文件 + 描述文件
pub fn encode(job: &EncodeJob<'_>) -> Result<StreamDescriptor> {
    let mut framer = alac_stream::encoder(&job.options).context("创建编码器失败")?;
    let params = *framer.params();
    info!(
        "编码: {} Hz, {} 声道, {}, 每包 {} 帧",
        params.sample_rate, params.channels, params.bit_depth, params.frames_per_packet,
    );

    let out = File::create(job.output)
        .with_context(|| format!("创建输出文件失败, path={}", job.output.display()))?;
    let mut writer = BufWriter::new(out);

    let pcm_bytes = stream_file(job.input, job.chunk_size, |chunk| {
        for packet in framer.feed(chunk)? {
            writer.write_all(&packet.data)?;
        }
        Ok(())
    })?;
    if let Some(packet) = framer.finish()? {
        writer.write_all(&packet.data)?;
    }
    writer.flush()?;

    let descriptor = StreamDescriptor {
        sample_rate: params.sample_rate,
        channels: params.channels,
        bit_depth: params.bit_depth.bits(),
        frames_per_packet: params.frames_per_packet,
        total_frames: pcm_bytes / params.bytes_per_frame() as u64,
        cookie: framer.magic_cookie().to_vec(),
        packet_lengths: framer.packet_table().to_vec(),
    };
    descriptor.save(job.descriptor)?;

    info!(
        "编码完成: {pcm_bytes} 字节 PCM -> {} 个数据包, {} 字节",
        descriptor.packet_lengths.len(),
        framer.stream_position(),
    );
    Ok(descriptor)
}

/// 数据包文件 + 描述文件 → PCM 文件
pub fn decode(job: &DecodeJob<'_>) -> Result<u64> {
    let descriptor = StreamDescriptor::load(job.descriptor)?;
    let deframer =
        alac_stream::decoder(&descriptor.decoder_options()).context("创建解码器失败")?;
    info!(
        "解码: {} 个数据包, {} 字节",
        descriptor.packet_lengths.len(),
        descriptor.compressed_bytes(),
    );

    let out = File::create(job.output)
        .with_context(|| format!("创建输出文件失败, path={}", job.output.display()))?;
    let mut writer = DeframerWriter::new(deframer, BufWriter::new(out));

    let read = stream_file(job.input, job.chunk_size, |chunk| {
        writer.write_all(chunk)?;
        Ok(())
    })?;
    let decoded = writer.deframer().bytes_decoded();
    debug!("读取 {read} 字节压缩数据");
    writer
        .finish()
        .with_context(|| format!("解码失败, 输入可能被截断: {}", job.input.display()))?;

    info!("解码完成: 输出 {decoded} 字节 PCM");
    Ok(decoded)
}

/// 打印描述文件摘要
pub fn inspect(path: &Path) -> Result<String> {
    let d = StreamDescriptor::load(path)?;
    let largest = d.packet_lengths.iter().copied().max().unwrap_or(0);
    Ok(format!(
        "采样率: {} Hz\n声道数: {}\n位深: {}\n每包帧数: {}\n数据包: {}\n压缩大小: {} 字节\n最大数据包: {} 字节\n时长: {:.3} 秒",
        d.sample_rate,
        d.channels,
        d.bit_depth,
        d.frames_per_packet,
        d.packet_lengths.len(),
        d.compressed_bytes(),
        largest,
        d.duration_secs(),
    ))
}
