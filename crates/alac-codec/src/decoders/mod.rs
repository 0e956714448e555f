//! 解码引擎实现模块.

pub mod alac;
