//! 解码重组器.
//!
//! 压缩字节可以按任意边界到达, 数据包长度表也可以晚于数据登记.
//! 每次 `feed()` 或登记长度后执行一次重组: 只要队首长度已被缓冲数据满足,
//! 就切出一个数据包交给解码引擎, 直到长度表为空或数据不足.
//!
//! 引擎中途出错时, 本次已解码的 PCM 块照常返回, 错误留到下一次调用返回.

use alac_core::{AlacError, AlacResult, StreamParams};
use bytes::{Bytes, BytesMut};
use log::{debug, trace, warn};

use crate::StreamState;
use crate::engine::PacketDecoder;
use crate::packet_table::PacketLengthTable;

/// 已到达但尚未被数据包消费的压缩字节
#[derive(Debug, Default)]
pub(crate) struct HeldBuffer {
    buf: BytesMut,
}

impl HeldBuffer {
    /// 追加到达的字节
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// 可用字节数
    pub(crate) fn available(&self) -> usize {
        self.buf.len()
    }

    /// 从头部切出 `len` 字节 (调用方保证 `len <= available()`)
    pub(crate) fn take(&mut self, len: usize) -> Bytes {
        self.buf.split_to(len).freeze()
    }
}

/// 解码重组器
pub struct DecodingDeframer {
    /// 流参数
    params: StreamParams,
    /// 解码引擎
    decoder: Box<dyn PacketDecoder>,
    /// 尚未处理的数据包长度
    table: PacketLengthTable,
    /// 缓冲的压缩字节
    held: HeldBuffer,
    /// 已解码的数据包数
    packets_decoded: u64,
    /// 已输出的 PCM 字节数
    bytes_decoded: u64,
    /// 生命周期状态
    state: StreamState,
    /// 已中止但尚未返回给调用方的错误
    deferred_error: Option<AlacError>,
}

impl DecodingDeframer {
    /// 创建重组器, 长度表为空
    pub fn new(params: StreamParams, decoder: Box<dyn PacketDecoder>) -> Self {
        debug!(
            "创建解码重组器: 引擎={}, 每包最多 {} 字节 PCM",
            decoder.name(),
            params.bytes_per_packet(),
        );
        Self {
            params,
            decoder,
            table: PacketLengthTable::new(),
            held: HeldBuffer::default(),
            packets_decoded: 0,
            bytes_decoded: 0,
            state: StreamState::Open,
            deferred_error: None,
        }
    }

    /// 创建重组器并预置已知的数据包长度
    pub fn with_packet_lengths(
        params: StreamParams,
        decoder: Box<dyn PacketDecoder>,
        lengths: impl IntoIterator<Item = u32>,
    ) -> AlacResult<Self> {
        let mut deframer = Self::new(params, decoder);
        deframer.table = validate_lengths(lengths)?;
        Ok(deframer)
    }

    /// 送入一块压缩数据, 返回本次解码出的 PCM 块
    pub fn feed(&mut self, chunk: &[u8]) -> AlacResult<Vec<Bytes>> {
        self.check_open()?;
        self.held.push(chunk);
        self.drain()
    }

    /// 追加数据包长度, 并立即尝试解码已缓冲的数据
    pub fn register_packet_lengths(
        &mut self,
        lengths: impl IntoIterator<Item = u32>,
    ) -> AlacResult<Vec<Bytes>> {
        self.check_open()?;
        let lengths = validate_lengths(lengths)?;
        trace!("登记 {} 个数据包长度", lengths.len());
        self.table.extend(lengths.iter());
        self.drain()
    }

    /// 结束解码流
    ///
    /// 仍有未到齐的数据包, 或存在没有长度对应的剩余字节时返回 `TruncatedStream`.
    pub fn finish(&mut self) -> AlacResult<()> {
        self.check_open()?;
        self.state = StreamState::Finished;

        if let Some(needed) = self.table.front() {
            return Err(AlacError::TruncatedStream(format!(
                "还有 {} 个数据包未到齐, 队首需要 {needed} 字节, 仅缓冲 {} 字节",
                self.table.len(),
                self.held.available(),
            )));
        }
        if self.held.available() > 0 {
            return Err(AlacError::TruncatedStream(format!(
                "{} 字节压缩数据没有对应的数据包长度",
                self.held.available(),
            )));
        }

        debug!(
            "解码流结束: {} 个数据包, 输出 {} 字节 PCM",
            self.packets_decoded, self.bytes_decoded,
        );
        Ok(())
    }

    /// 先交出延迟的错误, 再检查状态
    fn check_open(&mut self) -> AlacResult<()> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err);
        }
        self.state.ensure_open("解码流")
    }

    /// 重组并收集输出; 出错前已解码的块不丢弃
    fn drain(&mut self) -> AlacResult<Vec<Bytes>> {
        let mut frames = Vec::new();
        if let Err(err) = self.reassemble(&mut frames) {
            let err = self.abort(err);
            if frames.is_empty() {
                return Err(err);
            }
            self.deferred_error = Some(err);
        }
        Ok(frames)
    }

    /// 重组: 依次解码所有长度已满足的数据包
    fn reassemble(&mut self, frames: &mut Vec<Bytes>) -> AlacResult<()> {
        let bpp = self.params.bytes_per_packet();
        let bpf = self.params.bytes_per_frame();

        while let Some(needed) = self.table.front() {
            let needed = needed as usize;
            if self.held.available() < needed {
                trace!(
                    "等待数据: 队首数据包需要 {needed} 字节, 已缓冲 {} 字节",
                    self.held.available(),
                );
                break;
            }
            self.table.pop_front();
            let packet = self.held.take(needed);

            let mut out = BytesMut::zeroed(bpp);
            let decoded = self.decoder.decode(&packet, &mut out)?;
            let len = decoded as usize * bpf;
            if len > bpp {
                return Err(AlacError::Codec(format!(
                    "解码引擎报告 {decoded} 帧, 超过每包帧数 {}",
                    self.params.frames_per_packet,
                )));
            }
            self.packets_decoded += 1;
            if len == 0 {
                debug!("数据包 #{} 未解码出采样, 跳过", self.packets_decoded);
                continue;
            }
            out.truncate(len);
            self.bytes_decoded += len as u64;
            frames.push(out.freeze());
        }
        Ok(())
    }

    fn abort(&mut self, err: AlacError) -> AlacError {
        warn!("解码流中止: {err}");
        self.state = StreamState::Aborted;
        err
    }

    /// 流参数
    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    /// 尚未处理的数据包数
    pub fn pending_packets(&self) -> usize {
        self.table.len()
    }

    /// 已缓冲但尚未消费的压缩字节数
    pub fn available(&self) -> usize {
        self.held.available()
    }

    /// 已解码的数据包数
    pub fn packets_decoded(&self) -> u64 {
        self.packets_decoded
    }

    /// 已输出的 PCM 字节数
    pub fn bytes_decoded(&self) -> u64 {
        self.bytes_decoded
    }

    /// 当前状态
    pub fn state(&self) -> StreamState {
        self.state
    }
}

/// 长度表中不允许出现 0
fn validate_lengths(lengths: impl IntoIterator<Item = u32>) -> AlacResult<PacketLengthTable> {
    let table: PacketLengthTable = lengths.into_iter().collect();
    if let Some(index) = table.iter().position(|len| len == 0) {
        return Err(AlacError::InvalidArgument(format!(
            "数据包长度表第 {index} 项为 0",
        )));
    }
    Ok(table)
}
