//! 编解码引擎 trait 定义.
//!
//! 分帧器与重组器只负责字节记账, 实际的压缩/解压由引擎完成.
//! 每个流持有一个引擎实例, 引擎有状态且不可重入.

use alac_core::AlacResult;
use bytes::Bytes;

/// 编码引擎
///
/// 编码流程:
/// 1. 分帧器按 `bytes_per_packet` 切出一帧 PCM 数据
/// 2. 分配 `帧长度 + max_escape_header_bytes()` 的输出缓冲区
/// 3. 调用 `encode()`, 返回实际写入的字节数
pub trait PacketEncoder: Send {
    /// 获取引擎名称
    fn name(&self) -> &str;

    /// 单帧无法压缩时所需的最大额外字节数
    fn max_escape_header_bytes(&self) -> usize;

    /// 编码一帧 PCM 数据
    ///
    /// # 参数
    /// - `frame`: 完整帧或流末尾的短帧
    /// - `out`: 输出缓冲区, 容量至少为 `frame.len() + max_escape_header_bytes()`
    ///
    /// # 返回
    /// - `Ok(0)`: 本帧不产生数据包 (不是错误)
    /// - `Ok(n)`: 写入了 `n` 字节
    fn encode(&mut self, frame: &[u8], out: &mut [u8]) -> AlacResult<usize>;

    /// 解码器初始化所需的 magic cookie
    fn magic_cookie(&self) -> Bytes;
}

/// 解码引擎
pub trait PacketDecoder: Send {
    /// 获取引擎名称
    fn name(&self) -> &str;

    /// 解码一个完整的压缩数据包
    ///
    /// # 参数
    /// - `packet`: 恰好一个数据包的字节
    /// - `out`: 输出缓冲区, 容量为 `bytes_per_packet`
    ///
    /// # 返回
    /// 写入的采样帧数, 由调用方乘以 `bytes_per_frame` 换算为字节数.
    fn decode(&mut self, packet: &[u8], out: &mut [u8]) -> AlacResult<u32>;
}
