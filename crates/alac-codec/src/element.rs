//! ALAC 码流元素.
//!
//! 每个数据包由若干元素组成, 以 END 元素结束. 音频元素携带一个 (SCE/LFE)
//! 或两个 (CPE) 声道, 多声道流按固定布局依次排列元素.

use alac_core::{AlacError, AlacResult};

/// 元素类型标识位数
pub const TAG_BITS: u32 = 3;
/// 元素实例标识位数
pub const INSTANCE_BITS: u32 = 4;
/// 元素头中保留 (未使用) 位数
pub const UNUSED_HEADER_BITS: u32 = 12;

/// 元素类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// 单声道元素
    Sce,
    /// 声道对元素
    Cpe,
    /// 耦合声道元素 (不支持)
    Cce,
    /// 低频效果元素
    Lfe,
    /// 数据流元素
    Dse,
    /// 节目配置元素 (不支持)
    Pce,
    /// 填充元素
    Fil,
    /// 数据包结束
    End,
}

impl ElementKind {
    /// 从 3 位标识解析
    pub fn from_tag(tag: u32) -> AlacResult<Self> {
        Ok(match tag {
            0 => Self::Sce,
            1 => Self::Cpe,
            2 => Self::Cce,
            3 => Self::Lfe,
            4 => Self::Dse,
            5 => Self::Pce,
            6 => Self::Fil,
            7 => Self::End,
            other => {
                return Err(AlacError::InvalidData(format!("无效的元素标识: {other}")));
            }
        })
    }

    /// 3 位标识
    pub const fn tag(&self) -> u32 {
        match self {
            Self::Sce => 0,
            Self::Cpe => 1,
            Self::Cce => 2,
            Self::Lfe => 3,
            Self::Dse => 4,
            Self::Pce => 5,
            Self::Fil => 6,
            Self::End => 7,
        }
    }

    /// 音频元素携带的声道数 (非音频元素为 0)
    pub const fn channels(&self) -> u32 {
        match self {
            Self::Sce | Self::Lfe => 1,
            Self::Cpe => 2,
            _ => 0,
        }
    }
}

/// 布局中的一个音频元素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSlot {
    /// 元素类型
    pub kind: ElementKind,
    /// 实例标识 (同类型元素内递增)
    pub instance: u32,
    /// 该元素第一个声道在交错 PCM 中的索引
    pub first_channel: u32,
}

/// 按声道数生成元素布局 (1-8 声道)
pub fn layout_for_channels(channels: u32) -> AlacResult<Vec<ElementSlot>> {
    use ElementKind::{Cpe, Lfe, Sce};

    let kinds: &[ElementKind] = match channels {
        1 => &[Sce],
        2 => &[Cpe],
        3 => &[Sce, Cpe],
        4 => &[Sce, Cpe, Sce],
        5 => &[Sce, Cpe, Cpe],
        6 => &[Sce, Cpe, Cpe, Lfe],
        7 => &[Sce, Cpe, Cpe, Sce, Lfe],
        8 => &[Sce, Cpe, Cpe, Cpe, Lfe],
        other => {
            return Err(AlacError::InvalidArgument(format!(
                "ALAC 不支持 {other} 声道, 仅支持 1-8 声道",
            )));
        }
    };

    let (mut sce, mut cpe, mut lfe) = (0u32, 0u32, 0u32);
    let mut first_channel = 0;
    let mut slots = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let counter = match kind {
            Sce => &mut sce,
            Cpe => &mut cpe,
            _ => &mut lfe,
        };
        slots.push(ElementSlot {
            kind,
            instance: *counter,
            first_channel,
        });
        *counter += 1;
        first_channel += kind.channels();
    }
    Ok(slots)
}
