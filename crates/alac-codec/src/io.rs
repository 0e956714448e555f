//! `std::io::Write` 适配层.
//!
//! 把分帧器/重组器包装成可写端: 写入的数据经过编码或解码后转写到下游 `W`.
//! 写入失败时错误转换为 `io::Error`, 流随之中止.

use std::io::{self, Write};

use alac_core::AlacResult;
use bytes::Bytes;

use crate::deframer::DecodingDeframer;
use crate::framer::EncodingFramer;
use crate::packet_table::PacketLengthTable;

/// 编码写入端: PCM 进, 压缩数据包出
pub struct FramerWriter<W: Write> {
    framer: EncodingFramer,
    inner: W,
}

impl<W: Write> FramerWriter<W> {
    /// 包装分帧器与下游
    pub fn new(framer: EncodingFramer, inner: W) -> Self {
        Self { framer, inner }
    }

    /// 内部分帧器
    pub fn framer(&self) -> &EncodingFramer {
        &self.framer
    }

    /// 下游写入端
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// 结束编码, 写出最后一个短帧并返回下游与长度表
    pub fn finish(self) -> AlacResult<(W, PacketLengthTable)> {
        let Self {
            mut framer,
            mut inner,
        } = self;
        if let Some(packet) = framer.finish()? {
            inner.write_all(&packet.data)?;
        }
        inner.flush()?;
        Ok((inner, framer.into_packet_table()))
    }
}

impl<W: Write> Write for FramerWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for packet in self.framer.feed(buf)? {
            self.inner.write_all(&packet.data)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// 解码写入端: 压缩字节进, PCM 出
pub struct DeframerWriter<W: Write> {
    deframer: DecodingDeframer,
    inner: W,
}

impl<W: Write> DeframerWriter<W> {
    /// 包装重组器与下游
    pub fn new(deframer: DecodingDeframer, inner: W) -> Self {
        Self { deframer, inner }
    }

    /// 内部重组器
    pub fn deframer(&self) -> &DecodingDeframer {
        &self.deframer
    }

    /// 下游写入端
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// 追加数据包长度, 已满足的数据包立即解码写出
    pub fn register_packet_lengths(
        &mut self,
        lengths: impl IntoIterator<Item = u32>,
    ) -> AlacResult<()> {
        let frames = self.deframer.register_packet_lengths(lengths)?;
        write_frames(&mut self.inner, &frames)?;
        Ok(())
    }

    /// 结束解码, 校验没有残留数据并返回下游
    pub fn finish(self) -> AlacResult<W> {
        let Self {
            mut deframer,
            mut inner,
        } = self;
        deframer.finish()?;
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for DeframerWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let frames = self.deframer.feed(buf)?;
        write_frames(&mut self.inner, &frames)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn write_frames<W: Write>(inner: &mut W, frames: &[Bytes]) -> io::Result<()> {
    for frame in frames {
        inner.write_all(frame)?;
    }
    Ok(())
}
