/// 素材清单加载器（catalog.toml）
pub mod catalog_loader;
/// 启动检查工具模块
pub mod checks;

pub use catalog_loader::{load_catalog, load_catalog_from_str};
pub use checks::{build_animal_service, run_startup_checks};
