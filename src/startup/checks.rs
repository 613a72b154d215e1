use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::animal::{AnimalService, MAPPING_VERSION, RasterOptions, SeededDigest};
use crate::startup::catalog_loader::load_catalog;

/// 执行启动检查
///
/// 1. 摘要密钥必须已配置
/// 2. 素材清单必须存在
pub fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    if config.animal.seed.trim().is_empty() {
        return Err(AppError::Validation(
            "animal.seed 未配置（可通过 APP__ANIMAL__SEED 设置）".to_string(),
        ));
    }

    let manifest = config.catalog_manifest_path();
    if !manifest.is_file() {
        return Err(AppError::Internal(format!(
            "未找到素材清单: {:?}",
            manifest
        )));
    }
    tracing::info!("✅ 素材清单: {:?}", manifest);

    if config.animal.random_enabled {
        tracing::warn!("⚠️ 随机头像测试接口已开放（animal.random_enabled = true）");
    }

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

/// 加载素材目录并组装渲染管线。
///
/// 目录状态：Uninitialized → Loaded；任何目录错误都会阻止服务启动。
pub fn build_animal_service(config: &AppConfig) -> Result<AnimalService, AppError> {
    let manifest = config.catalog_manifest_path();
    tracing::info!(state = "Uninitialized", "正在加载素材目录: {:?}", manifest);

    let t_load = std::time::Instant::now();
    let catalog = load_catalog(&manifest, &config.animal.address_prefix)?;
    tracing::info!(
        state = "Loaded",
        mapping_version = MAPPING_VERSION,
        assets = catalog.asset_count(),
        vanity = catalog.vanity_count(),
        "素材目录加载完成: {}ms",
        t_load.elapsed().as_millis()
    );

    let digests = SeededDigest::new(&config.animal.seed)?;
    Ok(AnimalService::new(
        Arc::new(catalog),
        Arc::new(digests),
        RasterOptions::from(&config.image),
    ))
}
