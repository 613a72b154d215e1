use std::time::Instant;

use image::ExtendedColorType;
use image::codecs::webp::WebPEncoder;
use resvg::usvg::{self, Options as UsvgOptions};
use tiny_skia::{Pixmap, Transform};

use super::catalog::Canvas;
use crate::config::ImageRenderConfig;
use crate::error::RenderError;

/// 栅格输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    Png,
    Webp,
}

impl RasterFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }
}

/// 栅格化参数（来自 `[image]` 配置段）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub optimize_speed: bool,
    pub webp_lossless: bool,
    pub webp_quality: u8,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            optimize_speed: true,
            webp_lossless: true,
            webp_quality: 80,
        }
    }
}

impl From<&ImageRenderConfig> for RasterOptions {
    fn from(cfg: &ImageRenderConfig) -> Self {
        Self {
            optimize_speed: cfg.optimize_speed,
            webp_lossless: cfg.webp_lossless,
            webp_quality: cfg.webp_quality.clamp(1, 100),
        }
    }
}

fn usvg_options(speed: bool) -> UsvgOptions<'static> {
    UsvgOptions {
        shape_rendering: if speed {
            usvg::ShapeRendering::OptimizeSpeed
        } else {
            usvg::ShapeRendering::GeometricPrecision
        },
        image_rendering: if speed {
            usvg::ImageRendering::OptimizeSpeed
        } else {
            usvg::ImageRendering::OptimizeQuality
        },
        ..Default::default()
    }
}

/// 加载期校验：把片段放进画布文档里解析一次，保证请求期不会出现解析失败
pub fn validate_fragment(canvas: Canvas, fragment: &str) -> Result<(), String> {
    let doc = format!("{}{fragment}</svg>", canvas.open_tag());
    usvg::Tree::from_data(doc.as_bytes(), &usvg_options(true))
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// 将 SVG 文档栅格化为 `size`×`size` 的图片。
///
/// 画布按比例缩放并居中；透明区域保持透明。
pub fn rasterize(
    svg: &str,
    format: RasterFormat,
    size: u32,
    opts: &RasterOptions,
) -> Result<Vec<u8>, RenderError> {
    let started = Instant::now();

    let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg_options(opts.optimize_speed))
        .map_err(|e| RenderError::Parse(e.to_string()))?;

    let mut pixmap = Pixmap::new(size, size).ok_or(RenderError::Allocation {
        width: size,
        height: size,
    })?;

    let src = tree.size();
    let scale = (size as f32 / src.width()).min(size as f32 / src.height());
    let dx = (size as f32 - src.width() * scale) / 2.0;
    let dy = (size as f32 - src.height() * scale) / 2.0;
    resvg::render(
        &tree,
        Transform::from_row(scale, 0.0, 0.0, scale, dx, dy),
        &mut pixmap.as_mut(),
    );

    // tiny-skia 内部为预乘 alpha，编码器需要直通 RGBA
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let out = match format {
        RasterFormat::Png => encode_png(&rgba, size, opts.optimize_speed)?,
        RasterFormat::Webp => encode_webp(&rgba, size, opts)?,
    };

    tracing::debug!(
        format = format.name(),
        size,
        bytes = out.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "栅格化完成"
    );
    Ok(out)
}

fn encode_error(format: RasterFormat, e: impl std::fmt::Display) -> RenderError {
    RenderError::Encode {
        format: format.name().to_string(),
        message: e.to_string(),
    }
}

fn encode_png(rgba: &[u8], size: u32, speed: bool) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::with_capacity(rgba.len() / 4);
    {
        let mut encoder = png::Encoder::new(&mut out, size, size);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if speed {
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_compression(png::Compression::Default);
            encoder.set_filter(png::FilterType::Paeth);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| encode_error(RasterFormat::Png, e))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| encode_error(RasterFormat::Png, e))?;
        writer
            .finish()
            .map_err(|e| encode_error(RasterFormat::Png, e))?;
    }
    Ok(out)
}

fn encode_webp(rgba: &[u8], size: u32, opts: &RasterOptions) -> Result<Vec<u8>, RenderError> {
    if opts.webp_lossless {
        let mut out = Vec::new();
        WebPEncoder::new_lossless(&mut out)
            .encode(rgba, size, size, ExtendedColorType::Rgba8)
            .map_err(|e| encode_error(RasterFormat::Webp, e))?;
        return Ok(out);
    }
    let mem = webp::Encoder::from_rgba(rgba, size, size)
        .encode_simple(false, f32::from(opts.webp_quality))
        .map_err(|e| encode_error(RasterFormat::Webp, format!("{e:?}")))?;
    Ok(mem.to_vec())
}

#[cfg(test)]
mod tests {
    use super::{RasterFormat, RasterOptions, rasterize, validate_fragment};
    use crate::features::animal::catalog::Canvas;

    const SQUARE: &str = concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200">"#,
        r##"<rect width="200" height="200" fill="#ff0000"/></svg>"##
    );

    #[test]
    fn png_has_requested_dimensions() {
        let bytes = rasterize(SQUARE, RasterFormat::Png, 128, &RasterOptions::default())
            .expect("png");
        let img = image::load_from_memory(&bytes).expect("decode").to_rgba8();
        assert_eq!(img.dimensions(), (128, 128));
        assert_eq!(img.get_pixel(64, 64).0, [255, 0, 0, 255]);
    }

    #[test]
    fn webp_lossless_decodes() {
        let bytes = rasterize(SQUARE, RasterFormat::Webp, 100, &RasterOptions::default())
            .expect("webp");
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
        let img = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((img.width(), img.height()), (100, 100));
    }

    #[test]
    fn webp_lossy_is_still_webp() {
        let opts = RasterOptions {
            webp_lossless: false,
            ..RasterOptions::default()
        };
        let bytes = rasterize(SQUARE, RasterFormat::Webp, 100, &opts).expect("webp");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn non_square_canvas_is_centered_with_transparent_margin() {
        let wide = concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 200 100">"#,
            r##"<rect width="200" height="100" fill="#0000ff"/></svg>"##
        );
        let bytes = rasterize(wide, RasterFormat::Png, 200, &RasterOptions::default()).expect("png");
        let img = image::load_from_memory(&bytes).expect("decode").to_rgba8();
        assert_eq!(img.get_pixel(100, 10).0[3], 0);
        assert_eq!(img.get_pixel(100, 100).0, [0, 0, 255, 255]);
    }

    #[test]
    fn broken_svg_is_a_parse_error() {
        let err = rasterize("<svg", RasterFormat::Png, 128, &RasterOptions::default());
        assert!(matches!(err, Err(crate::error::RenderError::Parse(_))));
    }

    #[test]
    fn fragment_validation() {
        let canvas = Canvas {
            width: 200,
            height: 200,
        };
        assert!(validate_fragment(canvas, r#"<circle r="4"/>"#).is_ok());
        assert!(validate_fragment(canvas, r#"<circle r="4">"#).is_err());
    }
}
