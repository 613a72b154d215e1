use super::catalog::{AssetCatalog, Category, Template};
use super::color::ColorSet;

/// vanity 覆盖的内容：固定图稿，或固定的配件组合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VanityContent {
    /// 预先设计好的完整图稿（不含背景）
    Artwork(Template),
    /// 每个分类固定的素材 ID（`None` 表示该分类无素材），加载时已校验存在
    Accessories([Option<String>; Category::COUNT]),
}

/// 按地址固定的特殊形象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VanityAsset {
    pub address: String,
    pub name: String,
    /// 是否允许绘制背景（仅在请求要求背景时生效）
    pub background: bool,
    /// 固定配色；图稿类型只用到背景色，但统计输出需要完整配色
    pub colors: ColorSet,
    pub content: VanityContent,
}

impl VanityAsset {
    /// 某分类的固定素材 ID；图稿类型一律为 `None`
    pub fn accessory_id(&self, category: Category) -> Option<&str> {
        match &self.content {
            VanityContent::Artwork(_) => None,
            VanityContent::Accessories(ids) => ids[category.index()].as_deref(),
        }
    }
}

/// 对已规范化的地址做 O(1) 查找；命中时调用方跳过摘要选择逻辑
pub fn resolve_vanity<'a>(catalog: &'a AssetCatalog, address: &str) -> Option<&'a VanityAsset> {
    let hit = catalog.lookup_vanity(address);
    if let Some(v) = hit {
        tracing::debug!(address, vanity = %v.name, "命中 vanity 覆盖");
    }
    hit
}
