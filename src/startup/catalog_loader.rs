use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogError;
use crate::features::animal::address;
use crate::features::animal::catalog::{
    Asset, AssetCatalog, Canvas, Category, CategoryAssets, Template, TemplateSet,
};
use crate::features::animal::color::{Color, ColorCategory, ColorSet};
use crate::features::animal::raster::validate_fragment;
use crate::features::animal::selector::MAPPING_VERSION;
use crate::features::animal::vanity::{VanityAsset, VanityContent};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    mapping_version: u32,
    canvas: CanvasDef,
    body: AssetDef,
    categories: BTreeMap<String, CategoryDef>,
    #[serde(default)]
    vanity: Vec<VanityDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CanvasDef {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssetDef {
    id: String,
    svg: Option<String>,
    file: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryDef {
    #[serde(default)]
    allow_none: bool,
    #[serde(default)]
    assets: Vec<AssetDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VanityDef {
    address: String,
    name: String,
    #[serde(default)]
    background: bool,
    svg: Option<String>,
    file: Option<String>,
    /// 分类名 → 素材 ID 或 "none"
    accessories: Option<BTreeMap<String, String>>,
    colors: BTreeMap<String, String>,
}

/// 从清单文件加载素材目录；清单中的相对路径以清单所在目录为基准。
///
/// `address_prefix` 用于校验 vanity 地址，必须与服务对外校验地址时使用的前缀一致。
pub fn load_catalog(path: &Path, address_prefix: &str) -> Result<AssetCatalog, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    load_catalog_from_str(&text, base_dir, address_prefix)
}

/// 从清单文本加载素材目录
pub fn load_catalog_from_str(
    text: &str,
    base_dir: &Path,
    address_prefix: &str,
) -> Result<AssetCatalog, CatalogError> {
    let manifest: Manifest = toml::from_str(text)?;

    if manifest.mapping_version != MAPPING_VERSION {
        return Err(CatalogError::UnsupportedVersion {
            found: manifest.mapping_version,
            expected: MAPPING_VERSION,
        });
    }

    let canvas = Canvas {
        width: manifest.canvas.width,
        height: manifest.canvas.height,
    };
    if canvas.width == 0 || canvas.height == 0 {
        return Err(CatalogError::Manifest("画布尺寸必须大于 0".to_string()));
    }

    let mut loader = FragmentLoader {
        canvas,
        base_dir,
        templates: TemplateSet::new(),
    };
    let body = loader.asset(&manifest.body, None)?;

    let mut categories = Vec::with_capacity(manifest.categories.len());
    for (name, def) in &manifest.categories {
        let category =
            Category::from_name(name).ok_or_else(|| CatalogError::UnknownName(name.clone()))?;
        let assets = def
            .assets
            .iter()
            .map(|a| loader.asset(a, Some(category)))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(category = name.as_str(), count = assets.len(), "已加载分类素材");
        categories.push((
            category,
            CategoryAssets {
                allow_none: def.allow_none,
                assets,
            },
        ));
    }

    let vanity = manifest
        .vanity
        .iter()
        .map(|v| build_vanity(v, &mut loader, address_prefix))
        .collect::<Result<Vec<_>, _>>()?;

    AssetCatalog::new(canvas, loader.templates, body, categories, vanity)
}

/// 读取 `svg` 或 `file`（二者必须恰好给出一个）
fn read_source(
    id: &str,
    svg: Option<&str>,
    file: Option<&str>,
    base_dir: &Path,
) -> Result<String, CatalogError> {
    match (svg, file) {
        (Some(s), None) => Ok(s.to_string()),
        (None, Some(f)) => {
            let path = base_dir.join(f);
            std::fs::read_to_string(&path).map_err(|e| CatalogError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
        _ => Err(CatalogError::MalformedAsset {
            id: id.to_string(),
            reason: "svg 与 file 必须且只能提供一个".to_string(),
        }),
    }
}

/// 完整 SVG 文档只保留根元素内部内容；XML 声明一并去除
fn strip_outer_svg(source: &str) -> &str {
    let mut s = source.trim();
    if s.starts_with("<?xml")
        && let Some(end) = s.find("?>")
    {
        s = s[end + 2..].trim_start();
    }
    if s.starts_with("<svg")
        && let Some(open_end) = s.find('>')
        && let Some(close) = s.rfind("</svg>")
        && close > open_end
    {
        return s[open_end + 1..close].trim();
    }
    s
}

/// 片段读取与编译；所有模板登记到同一个 `TemplateSet`
struct FragmentLoader<'a> {
    canvas: Canvas,
    base_dir: &'a Path,
    templates: TemplateSet,
}

impl FragmentLoader<'_> {
    /// 编译片段，并用一组样例颜色试渲染，确认变量合法且结果能作为 SVG 解析
    fn template(
        &mut self,
        id: &str,
        name: &str,
        svg: Option<&str>,
        file: Option<&str>,
    ) -> Result<Template, CatalogError> {
        let malformed = |reason: String| CatalogError::MalformedAsset {
            id: id.to_string(),
            reason,
        };

        let source = read_source(id, svg, file, self.base_dir)?;
        let template = self
            .templates
            .add(name, strip_outer_svg(&source))
            .map_err(malformed)?;

        let sample = ColorSet::new([Color::rgb(0, 0, 0); ColorCategory::COUNT]);
        let rendered = self
            .templates
            .render(&template, &sample)
            .map_err(|e| malformed(format!("模板渲染失败: {e}")))?;
        validate_fragment(self.canvas, &rendered)
            .map_err(|reason| malformed(format!("SVG 解析失败: {reason}")))?;
        Ok(template)
    }

    fn asset(&mut self, def: &AssetDef, category: Option<Category>) -> Result<Asset, CatalogError> {
        let name = match category {
            Some(c) => format!("{}/{}", c.name(), def.id),
            None => "body".to_string(),
        };
        let template = self.template(&def.id, &name, def.svg.as_deref(), def.file.as_deref())?;
        Ok(Asset {
            id: def.id.clone(),
            category,
            template,
        })
    }
}

fn build_vanity(
    def: &VanityDef,
    loader: &mut FragmentLoader<'_>,
    address_prefix: &str,
) -> Result<VanityAsset, CatalogError> {
    let invalid = |reason: String| CatalogError::Vanity {
        address: def.address.clone(),
        reason,
    };

    // 形状不合法的地址永远无法通过接口校验，这样的条目只会静默失效
    if !address::is_valid_shape(&def.address, address_prefix) {
        return Err(invalid("地址格式非法".to_string()));
    }

    let mut colors = [None; ColorCategory::COUNT];
    for (name, hex) in &def.colors {
        let category =
            ColorCategory::from_name(name).ok_or_else(|| CatalogError::UnknownName(name.clone()))?;
        let color = Color::from_hex(hex).ok_or_else(|| invalid(format!("颜色 {name} 非法: {hex}")))?;
        colors[category.index()] = Some(color);
    }
    let mut resolved = [Color::rgb(0, 0, 0); ColorCategory::COUNT];
    for category in ColorCategory::ALL {
        resolved[category.index()] = colors[category.index()]
            .ok_or_else(|| invalid(format!("缺少颜色 {}", category.name())))?;
    }

    let content = match (&def.accessories, def.svg.is_some() || def.file.is_some()) {
        (Some(table), false) => {
            let mut ids: [Option<String>; Category::COUNT] = Default::default();
            let mut seen = [false; Category::COUNT];
            for (name, id) in table {
                let category =
                    Category::from_name(name).ok_or_else(|| CatalogError::UnknownName(name.clone()))?;
                seen[category.index()] = true;
                if id != "none" {
                    ids[category.index()] = Some(id.clone());
                }
            }
            if let Some(missing) = Category::ALL.into_iter().find(|c| !seen[c.index()]) {
                return Err(invalid(format!("accessories 缺少分类 {}", missing.name())));
            }
            VanityContent::Accessories(ids)
        }
        (None, true) => VanityContent::Artwork(loader.template(
            &def.name,
            &format!("vanity/{}", def.address),
            def.svg.as_deref(),
            def.file.as_deref(),
        )?),
        _ => {
            return Err(invalid(
                "必须且只能提供 svg/file 或 accessories 之一".to_string(),
            ));
        }
    };

    Ok(VanityAsset {
        address: def.address.clone(),
        name: def.name.clone(),
        background: def.background,
        colors: ColorSet::new(resolved),
        content,
    })
}
