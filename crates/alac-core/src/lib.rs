//! # alac-core
//!
//! ALAC 流式编解码核心库, 提供基础类型定义、错误处理和比特流工具.
//!
//! 上层的 `alac-codec` 在此之上实现分帧器 (framer) 与重组器 (deframer).

pub mod bit_depth;
pub mod bitreader;
pub mod bitwriter;
pub mod error;
pub mod stream_params;

// 重导出常用类型
pub use bit_depth::BitDepth;
pub use error::{AlacError, AlacResult};
pub use stream_params::StreamParams;
