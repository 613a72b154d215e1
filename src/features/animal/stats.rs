use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::catalog::{AssetCatalog, Category};
use super::color::ColorCategory;
use super::digest::DigestSource;
use super::selector::select;
use super::vanity::{VanityAsset, resolve_vanity};

/// 分类无素材时的统计值
pub const NONE_VALUE: &str = "none";

/// 单个地址的统计结果；`stats` 恰好包含 7 个分类键与 5 个 `color_*` 键
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AnimalStatsEntry {
    pub address: String,
    #[schema(example = json!({"glasses": "none", "color_background": "#dcd5bf"}))]
    pub stats: BTreeMap<String, String>,
}

/// 批量只读统计；背景始终视为启用
pub struct StatsAggregator<'a> {
    catalog: &'a AssetCatalog,
    digests: &'a dyn DigestSource,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(catalog: &'a AssetCatalog, digests: &'a dyn DigestSource) -> Self {
        Self { catalog, digests }
    }

    /// 输入必须已校验、已规范化；输出条目数与顺序和输入一致（重复地址保留）
    pub fn aggregate<S: AsRef<str>>(&self, addresses: &[S]) -> Vec<AnimalStatsEntry> {
        addresses
            .iter()
            .map(|a| self.entry(a.as_ref()))
            .collect()
    }

    fn entry(&self, address: &str) -> AnimalStatsEntry {
        let stats = match resolve_vanity(self.catalog, address) {
            Some(vanity) => vanity_stats(vanity),
            None => {
                let digest = self.digests.digest_for(address);
                let set = select(self.catalog, &digest, true);
                let mut stats = BTreeMap::new();
                for category in Category::ALL {
                    let value = set.asset(category).map_or(NONE_VALUE, |a| a.id.as_str());
                    stats.insert(category.name().to_string(), value.to_string());
                }
                for category in ColorCategory::ALL {
                    stats.insert(category.stats_key(), set.color(category).to_html());
                }
                stats
            }
        };
        AnimalStatsEntry {
            address: address.to_string(),
            stats,
        }
    }
}

fn vanity_stats(vanity: &VanityAsset) -> BTreeMap<String, String> {
    let mut stats = BTreeMap::new();
    for category in Category::ALL {
        let value = vanity.accessory_id(category).unwrap_or(NONE_VALUE);
        stats.insert(category.name().to_string(), value.to_string());
    }
    for category in ColorCategory::ALL {
        stats.insert(category.stats_key(), vanity.colors.get(category).to_html());
    }
    stats
}
