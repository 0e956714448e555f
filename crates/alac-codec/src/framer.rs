//! 编码分帧器.
//!
//! 把任意大小的 PCM 字节块重组为 `bytes_per_packet` 定长帧, 每帧调用一次编码引擎.
//! 不足一帧的尾部保留到下一次 `feed()`, 流结束时作为短帧编码.
//!
//! 每个输出的数据包在长度表中对应一个条目, 顺序一致.
//!
//! 引擎在一次 `feed()` 中途出错时, 本次已产生的数据包照常返回 (它们已登记在长度表中),
//! 错误留到下一次调用返回, 与 `io::Write::write` 部分写入的约定一致.

use alac_core::{AlacError, AlacResult, StreamParams};
use bytes::{Bytes, BytesMut};
use log::{debug, trace, warn};

use crate::StreamState;
use crate::engine::PacketEncoder;
use crate::packet::Packet;
use crate::packet_table::PacketLengthTable;

/// 编码分帧器
pub struct EncodingFramer {
    /// 流参数
    params: StreamParams,
    /// 编码引擎
    encoder: Box<dyn PacketEncoder>,
    /// 未凑满一帧的输入 (长度始终小于 bytes_per_packet)
    pending: Vec<u8>,
    /// 已输出数据包的长度表
    table: PacketLengthTable,
    /// 已输出的压缩字节数
    stream_pos: u64,
    /// 引擎返回 0 字节而被跳过的帧数
    skipped_frames: u64,
    /// 生命周期状态
    state: StreamState,
    /// 已中止但尚未返回给调用方的错误
    deferred_error: Option<AlacError>,
}

impl EncodingFramer {
    /// 创建分帧器
    pub fn new(params: StreamParams, encoder: Box<dyn PacketEncoder>) -> Self {
        debug!(
            "创建编码分帧器: 引擎={}, 每帧 {} 字节",
            encoder.name(),
            params.bytes_per_packet(),
        );
        Self {
            params,
            encoder,
            pending: Vec::with_capacity(params.bytes_per_packet()),
            table: PacketLengthTable::new(),
            stream_pos: 0,
            skipped_frames: 0,
            state: StreamState::Open,
            deferred_error: None,
        }
    }

    /// 送入一块 PCM 数据, 返回本次产生的数据包 (按帧顺序)
    ///
    /// 引擎中途出错时流立即中止. 若本次已产生数据包, 先返回 `Ok`,
    /// 错误由下一次 `feed()` 或 `finish()` 返回.
    pub fn feed(&mut self, chunk: &[u8]) -> AlacResult<Vec<Packet>> {
        self.check_open()?;

        let mut packets = Vec::new();
        if let Err(err) = self.feed_frames(chunk, &mut packets) {
            let err = self.abort(err);
            if packets.is_empty() {
                return Err(err);
            }
            self.deferred_error = Some(err);
            return Ok(packets);
        }

        trace!(
            "编码分帧: 输入 {} 字节, 输出 {} 个数据包, 遗留 {} 字节",
            chunk.len(),
            packets.len(),
            self.pending.len(),
        );
        Ok(packets)
    }

    /// 结束编码流
    ///
    /// 遗留的不完整帧作为最后一个短帧编码. 之后不再接受任何调用.
    pub fn finish(&mut self) -> AlacResult<Option<Packet>> {
        self.check_open()?;

        let mut packets = Vec::with_capacity(1);
        if !self.pending.is_empty() {
            let frame = std::mem::take(&mut self.pending);
            if let Err(err) = self.encode_frame(&frame, &mut packets) {
                return Err(self.abort(err));
            }
        }
        self.state = StreamState::Finished;

        debug!(
            "编码流结束: {} 个数据包, {} 字节, 跳过 {} 帧",
            self.table.len(),
            self.stream_pos,
            self.skipped_frames,
        );
        Ok(packets.pop())
    }

    /// 先交出延迟的错误, 再检查状态
    fn check_open(&mut self) -> AlacResult<()> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err);
        }
        self.state.ensure_open("编码流")
    }

    fn feed_frames(&mut self, chunk: &[u8], packets: &mut Vec<Packet>) -> AlacResult<()> {
        let bpp = self.params.bytes_per_packet();
        let mut rest = chunk;

        // 先用新数据补齐上次遗留的不完整帧
        if !self.pending.is_empty() {
            let take = (bpp - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() < bpp {
                return Ok(());
            }
            let frame = std::mem::take(&mut self.pending);
            let result = self.encode_frame(&frame, packets);
            self.pending = frame;
            self.pending.clear();
            result?;
        }

        let mut frames = rest.chunks_exact(bpp);
        for frame in &mut frames {
            self.encode_frame(frame, packets)?;
        }
        self.pending.extend_from_slice(frames.remainder());
        Ok(())
    }

    /// 编码一帧, 产生数据包时同时登记长度并推进流位置
    fn encode_frame(&mut self, frame: &[u8], packets: &mut Vec<Packet>) -> AlacResult<()> {
        let out_size = frame.len() + self.encoder.max_escape_header_bytes();
        let mut out = BytesMut::zeroed(out_size);

        let written = self.encoder.encode(frame, &mut out)?;
        if written == 0 {
            self.skipped_frames += 1;
            debug!("编码引擎未输出数据, 跳过 {} 字节输入", frame.len());
            return Ok(());
        }
        if written > out_size {
            return Err(AlacError::Codec(format!(
                "编码引擎报告写入 {written} 字节, 超过输出缓冲区 {out_size} 字节",
            )));
        }
        let length = u32::try_from(written)
            .map_err(|_| AlacError::Codec(format!("数据包长度 {written} 超出长度表范围")))?;

        out.truncate(written);
        let packet = Packet::new(out.freeze(), self.stream_pos);
        self.table.push(length);
        self.stream_pos += written as u64;
        packets.push(packet);
        Ok(())
    }

    fn abort(&mut self, err: AlacError) -> AlacError {
        warn!("编码流中止: {err}");
        self.state = StreamState::Aborted;
        err
    }

    /// 流参数
    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    /// 已输出数据包的长度表
    pub fn packet_table(&self) -> &PacketLengthTable {
        &self.table
    }

    /// 取出长度表
    pub fn into_packet_table(self) -> PacketLengthTable {
        self.table
    }

    /// 已输出的压缩字节数
    pub fn stream_position(&self) -> u64 {
        self.stream_pos
    }

    /// 遗留的不完整帧字节数
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 被跳过的帧数
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    /// 当前状态
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// 解码端初始化所需的 magic cookie
    pub fn magic_cookie(&self) -> Bytes {
        self.encoder.magic_cookie()
    }
}
