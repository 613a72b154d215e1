use std::collections::{HashMap, HashSet};

use crate::error::{CatalogError, RenderError};

use super::color::ColorSet;
pub use super::template::{Template, TemplateSet};
use super::vanity::{VanityAsset, VanityContent};

/// 配件分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Glasses,
    Hat,
    Misc,
    Mouth,
    ShirtPants,
    Shoes,
    TailAccessory,
}

impl Category {
    pub const COUNT: usize = 7;

    /// 与摘要映射表中的字节段顺序一致
    pub const ALL: [Category; Self::COUNT] = [
        Category::Glasses,
        Category::Hat,
        Category::Misc,
        Category::Mouth,
        Category::ShirtPants,
        Category::Shoes,
        Category::TailAccessory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Glasses => "glasses",
            Category::Hat => "hat",
            Category::Misc => "misc",
            Category::Mouth => "mouth",
            Category::ShirtPants => "shirt_pants",
            Category::Shoes => "shoes",
            Category::TailAccessory => "tail_accessory",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// 画布尺寸（SVG 的 width/height/viewBox）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// 文档根元素开标签
    pub fn open_tag(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        )
    }
}

/// 单个素材
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// 素材标识（统计输出中使用）
    pub id: String,
    /// 所属分类；`None` 表示固定的身体图层
    pub category: Option<Category>,
    pub template: Template,
}

/// 某一分类下的候选素材（顺序即清单中的声明顺序，属于版本化契约的一部分）
#[derive(Debug, Clone, Default)]
pub struct CategoryAssets {
    pub allow_none: bool,
    pub assets: Vec<Asset>,
}

/// 进程级只读素材目录：启动时加载一次，之后通过 `Arc` 共享，不再修改
#[derive(Debug)]
pub struct AssetCatalog {
    canvas: Canvas,
    templates: TemplateSet,
    body: Asset,
    categories: Vec<CategoryAssets>,
    vanity: HashMap<String, VanityAsset>,
}

impl AssetCatalog {
    /// 组装并校验目录。任何缺失/为空的分类、重复 ID、非法 vanity 定义都会返回错误。
    pub fn new(
        canvas: Canvas,
        templates: TemplateSet,
        body: Asset,
        categories: Vec<(Category, CategoryAssets)>,
        vanity: Vec<VanityAsset>,
    ) -> Result<Self, CatalogError> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(CatalogError::Manifest("画布尺寸必须大于 0".to_string()));
        }

        let mut slots: Vec<Option<CategoryAssets>> = vec![None; Category::COUNT];
        for (category, assets) in categories {
            if slots[category.index()].is_some() {
                return Err(CatalogError::Manifest(format!(
                    "分类 {} 重复定义",
                    category.name()
                )));
            }
            let mut ids = HashSet::new();
            for asset in &assets.assets {
                if !ids.insert(asset.id.as_str()) {
                    return Err(CatalogError::DuplicateAsset {
                        category: category.name().to_string(),
                        id: asset.id.clone(),
                    });
                }
            }
            slots[category.index()] = Some(assets);
        }

        let mut resolved = Vec::with_capacity(Category::COUNT);
        for (category, slot) in Category::ALL.into_iter().zip(slots) {
            match slot {
                Some(assets) if !assets.assets.is_empty() => resolved.push(assets),
                _ => return Err(CatalogError::EmptyCategory(category.name().to_string())),
            }
        }

        let mut catalog = Self {
            canvas,
            templates,
            body,
            categories: resolved,
            vanity: HashMap::with_capacity(vanity.len()),
        };

        for entry in vanity {
            catalog.check_vanity(&entry)?;
            let address = entry.address.clone();
            if catalog.vanity.insert(address.clone(), entry).is_some() {
                return Err(CatalogError::Vanity {
                    address,
                    reason: "地址重复".to_string(),
                });
            }
        }

        Ok(catalog)
    }

    fn check_vanity(&self, entry: &VanityAsset) -> Result<(), CatalogError> {
        let address = entry.address.as_str();
        if address.is_empty() || address.chars().any(char::is_whitespace) {
            return Err(CatalogError::Vanity {
                address: address.to_string(),
                reason: "地址为空或包含空白字符".to_string(),
            });
        }
        if let VanityContent::Accessories(ids) = &entry.content {
            for category in Category::ALL {
                if let Some(id) = &ids[category.index()]
                    && self.find_asset(category, id).is_none()
                {
                    return Err(CatalogError::Vanity {
                        address: address.to_string(),
                        reason: format!("分类 {} 中不存在素材 {id}", category.name()),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// 以给定配色渲染片段
    pub fn render_template(
        &self,
        template: &Template,
        colors: &ColorSet,
    ) -> Result<String, RenderError> {
        self.templates
            .render(template, colors)
            .map_err(|e| RenderError::Template(format!("{}: {e}", template.name())))
    }

    pub fn body(&self) -> &Asset {
        &self.body
    }

    /// 某分类下的全部候选素材（有序）
    pub fn list_category(&self, category: Category) -> &[Asset] {
        &self.categories[category.index()].assets
    }

    /// 该分类是否允许“无素材”结果
    pub fn allows_none(&self, category: Category) -> bool {
        self.categories[category.index()].allow_none
    }

    pub fn find_asset(&self, category: Category, id: &str) -> Option<&Asset> {
        self.list_category(category).iter().find(|a| a.id == id)
    }

    /// O(1) 查找 vanity 覆盖
    pub fn lookup_vanity(&self, address: &str) -> Option<&VanityAsset> {
        self.vanity.get(address)
    }

    pub fn vanity_count(&self) -> usize {
        self.vanity.len()
    }

    pub fn asset_count(&self) -> usize {
        self.categories.iter().map(|c| c.assets.len()).sum()
    }
}
