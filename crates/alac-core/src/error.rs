//! 统一错误类型定义.
//!
//! 所有 alac crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// 统一错误类型
#[derive(Debug, Error)]
pub enum AlacError {
    /// 无效参数 (缺失或非法的流参数)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的码流特性
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 编解码引擎错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 比特流读取越界
    #[error("已到达数据末尾")]
    Eof,

    /// 无效数据 (损坏的数据包等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 流已结束或已中止, 不再接受输入
    #[error("流已关闭: {0}")]
    StreamClosed(String),

    /// 输入结束时仍有未满足的数据包长度或多余字节
    #[error("流被截断: {0}")]
    TruncatedStream(String),
}

/// 统一 Result 类型
pub type AlacResult<T> = Result<T, AlacError>;

impl From<AlacError> for std::io::Error {
    fn from(err: AlacError) -> Self {
        match err {
            AlacError::Io(e) => e,
            other => std::io::Error::other(other),
        }
    }
}
