use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use crate::features::animal::MAPPING_VERSION;
use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    #[schema(example = "healthy")]
    pub status: String,
    /// 服务名称
    #[schema(example = "animal-backend")]
    pub service: String,
    /// 当前版本（Cargo package version）
    #[schema(example = "0.1.0")]
    pub version: String,
    /// 摘要映射版本
    #[schema(example = 1)]
    pub mapping_version: u32,
    /// 已加载的可选素材数量
    pub assets: usize,
    /// 已加载的 vanity 数量
    pub vanity: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "用于探活的健康检查端点，返回服务状态、版本与素材目录概况。",
    responses((status = 200, description = "服务健康", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = state.animal_service.catalog();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            mapping_version: MAPPING_VERSION,
            assets: catalog.asset_count(),
            vanity: catalog.vanity_count(),
        }),
    )
}
