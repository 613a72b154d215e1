use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::raster::RasterFormat;
use crate::error::AppError;

/// 栅格输出边长，构造时已保证落在 `[MIN, MAX]` 内
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterSize(u32);

impl RasterSize {
    pub const MIN: u32 = 100;
    pub const MAX: u32 = 1000;
    pub const DEFAULT: RasterSize = RasterSize(128);

    pub fn new(size: u32) -> Result<Self, AppError> {
        if (Self::MIN..=Self::MAX).contains(&size) {
            Ok(Self(size))
        } else {
            Err(Self::out_of_range())
        }
    }

    /// 查询参数解析：空值取默认值，其余必须是范围内的整数（不去除空白）
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw {
            None | Some("") => Ok(Self::DEFAULT),
            Some(s) => s
                .parse::<u32>()
                .map_err(|_| Self::out_of_range())
                .and_then(Self::new),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn out_of_range() -> AppError {
        AppError::Validation(format!(
            "size must be an integer between {} and {}",
            Self::MIN,
            Self::MAX
        ))
    }
}

impl Default for RasterSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 最终输出格式；矢量输出不携带尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Svg,
    Raster(RasterFormat, RasterSize),
}

impl OutputFormat {
    pub const SVG_CONTENT_TYPE: &'static str = "image/svg+xml; charset=utf-8";

    /// `format` 为空或 `svg` 时输出矢量图，此时忽略 `size`
    pub fn parse(format: Option<&str>, size: Option<&str>) -> Result<Self, AppError> {
        let format = format.unwrap_or("").to_ascii_lowercase();
        let raster = match format.as_str() {
            "" | "svg" => return Ok(Self::Svg),
            "png" => RasterFormat::Png,
            "webp" => RasterFormat::Webp,
            _ => {
                return Err(AppError::Validation(
                    "Valid formats are 'svg', 'png', or 'webp'".to_string(),
                ));
            }
        };
        Ok(Self::Raster(raster, RasterSize::parse(size)?))
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => Self::SVG_CONTENT_TYPE,
            Self::Raster(f, _) => f.content_type(),
        }
    }

    pub fn is_raster(self) -> bool {
        matches!(self, Self::Raster(..))
    }
}

/// 一次渲染请求的选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub with_background: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Svg,
            with_background: false,
        }
    }
}

impl RenderOptions {
    pub fn from_query(query: &AnimalQuery) -> Result<Self, AppError> {
        let format = OutputFormat::parse(query.format.as_deref(), query.size.as_deref())?;
        let with_background = query
            .background
            .as_deref()
            .is_some_and(|b| b.eq_ignore_ascii_case("true"));
        Ok(Self {
            format,
            with_background,
        })
    }
}

/// 渲染接口的查询参数（保持字符串形式，以便返回原有的错误文案）
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnimalQuery {
    /// 输出格式：svg（默认）| png | webp
    pub format: Option<String>,
    /// 栅格边长，100..=1000，默认 128；svg 时忽略
    pub size: Option<String>,
    /// 为 `true`（大小写不敏感）时绘制背景
    pub background: Option<String>,
}

/// 批量统计请求体
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StatsRequest {
    #[schema(example = json!(["paw_1..."]))]
    pub addresses: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{AnimalQuery, OutputFormat, RasterSize, RenderOptions};
    use crate::error::AppError;
    use crate::features::animal::raster::RasterFormat;

    fn query(format: Option<&str>, size: Option<&str>, background: Option<&str>) -> AnimalQuery {
        AnimalQuery {
            format: format.map(str::to_string),
            size: size.map(str::to_string),
            background: background.map(str::to_string),
        }
    }

    #[test]
    fn svg_ignores_size() {
        let opts = RenderOptions::from_query(&query(None, Some("abc"), None)).expect("svg");
        assert_eq!(opts.format, OutputFormat::Svg);
        let opts = RenderOptions::from_query(&query(Some("SVG"), Some("5"), None)).expect("svg");
        assert_eq!(opts.format, OutputFormat::Svg);
    }

    #[test]
    fn raster_size_defaults_and_bounds() {
        let opts = RenderOptions::from_query(&query(Some("png"), None, None)).expect("png");
        assert_eq!(
            opts.format,
            OutputFormat::Raster(RasterFormat::Png, RasterSize::DEFAULT)
        );
        assert_eq!(RasterSize::DEFAULT.get(), 128);
        assert!(RasterSize::parse(Some("100")).is_ok());
        assert!(RasterSize::parse(Some("1000")).is_ok());
        for bad in ["99", "1001", "12.5", "-5", "big"] {
            match RasterSize::parse(Some(bad)) {
                Err(AppError::Validation(msg)) => {
                    assert_eq!(msg, "size must be an integer between 100 and 1000");
                }
                other => panic!("expected validation error for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        match RenderOptions::from_query(&query(Some("gif"), None, None)) {
            Err(AppError::Validation(msg)) => {
                assert_eq!(msg, "Valid formats are 'svg', 'png', or 'webp'");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn background_flag_is_case_insensitive() {
        for (raw, expected) in [(Some("TRUE"), true), (Some("true"), true), (Some("1"), false), (None, false)] {
            let opts = RenderOptions::from_query(&query(None, None, raw)).expect("opts");
            assert_eq!(opts.with_background, expected);
        }
    }

    #[test]
    fn surrounding_whitespace_is_not_stripped() {
        assert!(RasterSize::parse(Some(" 150")).is_err());
        assert!(RasterSize::parse(Some("150\n")).is_err());
        assert!(RenderOptions::from_query(&query(Some(" png"), None, None)).is_err());
        assert!(RenderOptions::from_query(&query(Some("webp "), Some("150"), None)).is_err());
        let opts = RenderOptions::from_query(&query(None, None, Some(" true"))).expect("opts");
        assert!(!opts.with_background);
    }

    #[test]
    fn content_types() {
        assert_eq!(OutputFormat::Svg.content_type(), "image/svg+xml; charset=utf-8");
        assert_eq!(
            OutputFormat::Raster(RasterFormat::Webp, RasterSize::DEFAULT).content_type(),
            "image/webp"
        );
    }
}
