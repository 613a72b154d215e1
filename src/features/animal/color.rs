use std::fmt;

/// 颜色分类（每个分类对应摘要中的一段字节，以及图层中的一组占位色）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorCategory {
    Background,
    Fur,
    Shirt,
    Pants,
    Accent,
}

impl ColorCategory {
    pub const COUNT: usize = 5;

    /// 与映射表顺序一致
    pub const ALL: [ColorCategory; Self::COUNT] = [
        ColorCategory::Background,
        ColorCategory::Fur,
        ColorCategory::Shirt,
        ColorCategory::Pants,
        ColorCategory::Accent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorCategory::Background => "background",
            ColorCategory::Fur => "fur",
            ColorCategory::Shirt => "shirt",
            ColorCategory::Pants => "pants",
            ColorCategory::Accent => "accent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// 统计输出中的键名，例如 `color_background`
    pub fn stats_key(self) -> String {
        format!("color_{}", self.name())
    }
}

/// RGBA 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// 解析 `#rrggbb` / `#rrggbbaa`（大小写不敏感）
    pub fn from_hex(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }

    /// HTML 十六进制表示：不透明时为 `#rrggbb`，否则附带 alpha
    pub fn to_html(&self) -> String {
        if self.a == 0xFF {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// 整数 HSV → RGB。
    ///
    /// `hue` 取值 0..1536（6 个扇区 × 256），`saturation`/`value` 取值 0..=255。
    /// 全程整数运算，保证跨实现逐位一致。
    pub fn from_hsv(hue: u16, saturation: u8, value: u8) -> Self {
        let v = u32::from(value);
        let s = u32::from(saturation);
        if s == 0 {
            return Self::rgb(value, value, value);
        }

        let hue = u32::from(hue) % 1536;
        let region = hue >> 8;
        let f = hue & 0xFF;

        let p = (v * (255 - s) + 127) / 255;
        let q = (v * (255 - (s * f + 127) / 255) + 127) / 255;
        let t = (v * (255 - (s * (255 - f) + 127) / 255) + 127) / 255;

        let (r, g, b) = match region {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::rgb(r as u8, g as u8, b as u8)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// 按颜色分类索引的一组颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorSet([Color; ColorCategory::COUNT]);

impl ColorSet {
    pub fn new(colors: [Color; ColorCategory::COUNT]) -> Self {
        Self(colors)
    }

    pub fn get(&self, category: ColorCategory) -> Color {
        self.0[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColorCategory, Color)> + '_ {
        ColorCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, ColorCategory};

    #[test]
    fn parses_and_formats_html_hex() {
        let c = Color::from_hex("#A0522D").expect("valid hex");
        assert_eq!(c, Color::rgb(0xa0, 0x52, 0x2d));
        assert_eq!(c.to_html(), "#a0522d");

        let translucent = Color::from_hex("#11223380").expect("valid hex");
        assert_eq!(translucent.a, 0x80);
        assert_eq!(translucent.to_html(), "#11223380");
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::from_hex("a0522d").is_none());
        assert!(Color::from_hex("#a0522").is_none());
        assert!(Color::from_hex("#zz522d").is_none());
        assert!(Color::from_hex("#ééé").is_none());
    }

    #[test]
    fn hsv_primary_sectors() {
        assert_eq!(Color::from_hsv(0, 255, 255), Color::rgb(255, 0, 0));
        assert_eq!(Color::from_hsv(512, 255, 255), Color::rgb(0, 255, 0));
        assert_eq!(Color::from_hsv(1024, 255, 255), Color::rgb(0, 0, 255));
        assert_eq!(Color::from_hsv(700, 0, 90), Color::rgb(90, 90, 90));
    }

    #[test]
    fn color_category_names_round_trip() {
        for c in ColorCategory::ALL {
            assert_eq!(ColorCategory::from_name(c.name()), Some(c));
        }
        assert_eq!(ColorCategory::Fur.stats_key(), "color_fur");
        assert!(ColorCategory::from_name("eyes").is_none());
    }
}
