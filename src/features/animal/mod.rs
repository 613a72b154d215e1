//! 头像生成：摘要 → 配件选择 → SVG 合成 → 可选栅格化

pub mod address;
pub mod catalog;
pub mod color;
pub mod composer;
pub mod digest;
pub mod handler;
pub mod raster;
pub mod selector;
pub mod service;
pub mod stats;
pub mod template;
pub mod types;
pub mod vanity;

pub use catalog::{Asset, AssetCatalog, Canvas, Category, CategoryAssets, Template, TemplateSet};
pub use color::{Color, ColorCategory, ColorSet};
pub use digest::{DIGEST_LEN, DigestSource, HashDigest, SeededDigest};
pub use handler::create_animal_router;
pub use raster::{RasterFormat, RasterOptions};
pub use selector::{AccessorySet, MAPPING_VERSION, Selection, select};
pub use service::{AnimalService, RenderedAnimal};
pub use stats::{AnimalStatsEntry, NONE_VALUE};
pub use types::{AnimalQuery, OutputFormat, RasterSize, RenderOptions, StatsRequest};
pub use vanity::{VanityAsset, VanityContent};
