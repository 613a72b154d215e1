use std::sync::Arc;

use super::catalog::AssetCatalog;
use super::composer::compose;
use super::digest::{DigestSource, HashDigest};
use super::raster::{RasterOptions, rasterize};
use super::selector::{Selection, select};
use super::stats::{AnimalStatsEntry, StatsAggregator};
use super::types::{OutputFormat, RenderOptions};
use super::vanity::resolve_vanity;
use crate::error::AppError;

/// 渲染结果：字节 + 输出格式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAnimal {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

impl RenderedAnimal {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// 请求管线：Resolving → Selecting/Overridden → Composing → [Rasterizing] → Done。
///
/// 所有方法均为同步 CPU 计算，不做任何 I/O；栅格化较重，HTTP 层应放到阻塞线程池执行。
#[derive(Clone)]
pub struct AnimalService {
    catalog: Arc<AssetCatalog>,
    digests: Arc<dyn DigestSource>,
    raster: RasterOptions,
}

impl AnimalService {
    pub fn new(
        catalog: Arc<AssetCatalog>,
        digests: Arc<dyn DigestSource>,
        raster: RasterOptions,
    ) -> Self {
        Self {
            catalog,
            digests,
            raster,
        }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// 上游已算好摘要：vanity 命中时忽略摘要
    pub fn render(
        &self,
        address: &str,
        digest: &HashDigest,
        options: RenderOptions,
    ) -> Result<RenderedAnimal, AppError> {
        let selection = match resolve_vanity(&self.catalog, address) {
            Some(vanity) => Selection::VanityFixed {
                vanity,
                with_background: options.with_background,
            },
            None => Selection::DigestDriven(select(&self.catalog, digest, options.with_background)),
        };
        self.finish(&selection, options)
    }

    /// 只给地址：vanity 未命中时才通过 `DigestSource` 派生摘要
    pub fn render_address(
        &self,
        address: &str,
        options: RenderOptions,
    ) -> Result<RenderedAnimal, AppError> {
        let selection = match resolve_vanity(&self.catalog, address) {
            Some(vanity) => Selection::VanityFixed {
                vanity,
                with_background: options.with_background,
            },
            None => {
                let digest = self.digests.digest_for(address);
                Selection::DigestDriven(select(&self.catalog, &digest, options.with_background))
            }
        };
        self.finish(&selection, options)
    }

    /// 仅由摘要驱动（随机测试接口）
    pub fn render_digest(
        &self,
        digest: &HashDigest,
        options: RenderOptions,
    ) -> Result<RenderedAnimal, AppError> {
        let selection =
            Selection::DigestDriven(select(&self.catalog, digest, options.with_background));
        self.finish(&selection, options)
    }

    /// 批量统计；调用方需先完成整批校验
    pub fn stats<S: AsRef<str>>(&self, addresses: &[S]) -> Vec<AnimalStatsEntry> {
        StatsAggregator::new(&self.catalog, self.digests.as_ref()).aggregate(addresses)
    }

    fn finish(
        &self,
        selection: &Selection<'_>,
        options: RenderOptions,
    ) -> Result<RenderedAnimal, AppError> {
        let svg = compose(&self.catalog, selection)?;
        let bytes = match options.format {
            OutputFormat::Svg => svg.into_bytes(),
            OutputFormat::Raster(format, size) => {
                rasterize(&svg, format, size.get(), &self.raster)?
            }
        };
        Ok(RenderedAnimal {
            bytes,
            format: options.format,
        })
    }
}
