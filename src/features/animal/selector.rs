//! 摘要 → 配件/颜色 的版本化映射。
//!
//! 映射版本 1（字节偏移，均为 4 字节大端 u32）：
//!
//! | 字节     | 用途              |
//! |----------|-------------------|
//! | 0..4     | glasses           |
//! | 4..8     | hat               |
//! | 8..12    | misc              |
//! | 12..16   | mouth             |
//! | 16..20   | shirt_pants       |
//! | 20..24   | shoes             |
//! | 24..28   | tail_accessory    |
//! | 28..32   | 保留              |
//! | 32..36   | 颜色 background   |
//! | 36..40   | 颜色 fur          |
//! | 40..44   | 颜色 shirt        |
//! | 44..48   | 颜色 pants        |
//! | 48..52   | 颜色 accent       |
//! | 52..64   | 保留              |
//!
//! 配件：`m = n + 1`（允许无素材）或 `m = n`，`r = value % m`；允许无素材时 `r == 0` 即无素材，
//! 否则取 `assets[r - 1]`。颜色见 [`ColorRule::derive`]。
//!
//! 修改这里的任何常量都会改变线上地址对应的形象，必须提升 [`MAPPING_VERSION`] 并制定迁移方案。

use super::catalog::{Asset, AssetCatalog, Category};
use super::color::{Color, ColorCategory, ColorSet};
use super::digest::HashDigest;
use super::vanity::VanityAsset;

/// 当前映射版本，必须与素材清单中的 `mapping_version` 一致
pub const MAPPING_VERSION: u32 = 1;

/// 每个字节段的宽度
pub const RANGE_WIDTH: usize = 4;

/// 配件分类在摘要中的起始偏移
pub const ACCESSORY_OFFSETS: [(Category, usize); Category::COUNT] = [
    (Category::Glasses, 0),
    (Category::Hat, 4),
    (Category::Misc, 8),
    (Category::Mouth, 12),
    (Category::ShirtPants, 16),
    (Category::Shoes, 20),
    (Category::TailAccessory, 24),
];

/// 颜色分类的字节段与调色范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRule {
    pub category: ColorCategory,
    pub offset: usize,
    pub saturation: (u8, u8),
    pub value: (u8, u8),
}

pub const COLOR_RULES: [ColorRule; ColorCategory::COUNT] = [
    ColorRule {
        category: ColorCategory::Background,
        offset: 32,
        saturation: (25, 90),
        value: (215, 250),
    },
    ColorRule {
        category: ColorCategory::Fur,
        offset: 36,
        saturation: (60, 200),
        value: (150, 235),
    },
    ColorRule {
        category: ColorCategory::Shirt,
        offset: 40,
        saturation: (120, 230),
        value: (120, 230),
    },
    ColorRule {
        category: ColorCategory::Pants,
        offset: 44,
        saturation: (80, 200),
        value: (70, 180),
    },
    ColorRule {
        category: ColorCategory::Accent,
        offset: 48,
        saturation: (170, 255),
        value: (180, 255),
    },
];

fn scale(min: u8, max: u8, byte: u8) -> u8 {
    let (min, max) = (u32::from(min), u32::from(max));
    (min + (u32::from(byte) * (max - min) + 127) / 255) as u8
}

impl ColorRule {
    /// `[b0, b1, b2, b3]` → 色相取 `b0b1`（映射到 0..1536），饱和度取 `b2`，明度取 `b3`
    pub fn derive(&self, quad: [u8; 4]) -> Color {
        let raw_hue = u32::from(u16::from_be_bytes([quad[0], quad[1]]));
        let hue = ((raw_hue * 1536) >> 16) as u16;
        let s = scale(self.saturation.0, self.saturation.1, quad[2]);
        let v = scale(self.value.0, self.value.1, quad[3]);
        Color::from_hsv(hue, s, v)
    }
}

/// 把 32 位取值归约为分类内的下标；`None` 表示“无素材”
pub fn reduce_index(value: u32, count: usize, allow_none: bool) -> Option<usize> {
    let m = count as u64 + u64::from(allow_none);
    let r = (u64::from(value) % m) as usize;
    if allow_none {
        r.checked_sub(1)
    } else {
        Some(r)
    }
}

/// 一次请求的配件选择结果，构造后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorySet<'a> {
    assets: [Option<&'a Asset>; Category::COUNT],
    colors: ColorSet,
    with_background: bool,
}

impl<'a> AccessorySet<'a> {
    pub fn new(
        assets: [Option<&'a Asset>; Category::COUNT],
        colors: ColorSet,
        with_background: bool,
    ) -> Self {
        Self {
            assets,
            colors,
            with_background,
        }
    }

    pub fn asset(&self, category: Category) -> Option<&'a Asset> {
        self.assets[category.index()]
    }

    pub fn colors(&self) -> &ColorSet {
        &self.colors
    }

    pub fn color(&self, category: ColorCategory) -> Color {
        self.colors.get(category)
    }

    pub fn with_background(&self) -> bool {
        self.with_background
    }
}

/// 选择结果：摘要驱动，或 vanity 固定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    DigestDriven(AccessorySet<'a>),
    VanityFixed {
        vanity: &'a VanityAsset,
        with_background: bool,
    },
}

/// 纯函数：同一摘要永远得到同一选择结果。
///
/// `with_background` 只影响渲染决策，背景色仍然照常计算。
pub fn select<'a>(
    catalog: &'a AssetCatalog,
    digest: &HashDigest,
    with_background: bool,
) -> AccessorySet<'a> {
    let mut assets = [None; Category::COUNT];
    for (category, offset) in ACCESSORY_OFFSETS {
        let candidates = catalog.list_category(category);
        let value = digest.word(offset);
        assets[category.index()] = reduce_index(value, candidates.len(), catalog.allows_none(category))
            .and_then(|i| candidates.get(i));
    }

    let colors = ColorSet::new(COLOR_RULES.map(|rule| rule.derive(digest.quad(rule.offset))));

    AccessorySet::new(assets, colors, with_background)
}
