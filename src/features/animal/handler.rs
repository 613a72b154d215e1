use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::task::spawn_blocking;

use super::address;
use super::digest::HashDigest;
use super::service::{AnimalService, RenderedAnimal};
use super::stats::AnimalStatsEntry;
use super::types::{AnimalQuery, RenderOptions, StatsRequest};
use crate::error::AppError;
use crate::state::AppState;

/// 同一地址的头像永不变化，允许客户端与 CDN 长期缓存
const IMMUTABLE_CACHE: &str = "public, max-age=604800, immutable";
const NO_STORE: &str = "no-store";

/// 执行渲染：矢量输出直接在当前任务完成，栅格输出受信号量限制并放入阻塞线程池
async fn run_render<F>(
    state: &AppState,
    options: RenderOptions,
    job: F,
) -> Result<RenderedAnimal, AppError>
where
    F: FnOnce(&AnimalService) -> Result<RenderedAnimal, AppError> + Send + 'static,
{
    if !options.format.is_raster() {
        return job(&state.animal_service);
    }

    let t_wait = Instant::now();
    let _permit = state
        .render_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
    let wait_ms = t_wait.elapsed().as_millis() as u64;

    let service = state.animal_service.clone();
    let t_render = Instant::now();
    let rendered = spawn_blocking(move || job(&service))
        .await
        .map_err(|e| AppError::Internal(format!("阻塞渲染任务执行失败: {e}")))??;
    tracing::debug!(
        wait_ms,
        render_ms = t_render.elapsed().as_millis() as u64,
        bytes = rendered.bytes.len(),
        "栅格渲染完成"
    );
    Ok(rendered)
}

fn image_response(rendered: RenderedAnimal, cache_control: &'static str) -> Response {
    let content_type = rendered.content_type();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CACHE_CONTROL, HeaderValue::from_static(cache_control)),
        ],
        rendered.bytes,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/animal/{address}",
    summary = "按地址生成头像",
    description = "同一地址永远得到同一形象。vanity 地址返回预设形象。svg 输出忽略 size。",
    params(
        ("address" = String, Path, description = "账户地址，例如 paw_1..."),
        AnimalQuery
    ),
    responses(
        (status = 200, description = "SVG/PNG/WebP 图片字节"),
        (status = 400, description = "地址、格式或尺寸非法", body = AppError),
        (status = 500, description = "渲染失败", body = AppError)
    ),
    tag = "Animal"
)]
pub async fn get_animal(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(query): Query<AnimalQuery>,
) -> Result<Response, AppError> {
    let address = address::parse(&raw, &state.animal.address_prefix)
        .ok_or_else(|| AppError::Validation("Invalid address".to_string()))?
        .to_string();
    let options = RenderOptions::from_query(&query)?;

    let rendered = run_render(&state, options, move |svc| {
        svc.render_address(&address, options)
    })
    .await?;
    Ok(image_response(rendered, IMMUTABLE_CACHE))
}

#[utoipa::path(
    get,
    path = "/animal/random",
    summary = "随机头像（测试接口）",
    description = "使用随机摘要生成头像，仅在 animal.random_enabled = true 时开放。",
    params(AnimalQuery),
    responses(
        (status = 200, description = "SVG/PNG/WebP 图片字节"),
        (status = 400, description = "格式或尺寸非法", body = AppError),
        (status = 404, description = "测试接口未开放", body = AppError)
    ),
    tag = "Animal"
)]
pub async fn get_random_animal(
    State(state): State<AppState>,
    Query(query): Query<AnimalQuery>,
) -> Result<Response, AppError> {
    if !state.animal.random_enabled {
        return Err(AppError::NotFound("random animal API is disabled".to_string()));
    }
    let options = RenderOptions::from_query(&query)?;
    let digest = HashDigest::random();
    tracing::debug!(digest = %digest.to_hex(), "随机头像");

    let rendered = run_render(&state, options, move |svc| {
        svc.render_digest(&digest, options)
    })
    .await?;
    Ok(image_response(rendered, NO_STORE))
}

#[utoipa::path(
    post,
    path = "/animal/stats",
    summary = "批量查询头像构成",
    description = "返回每个地址选中的配件与配色。任一地址非法则整批失败；结果顺序与输入一致。",
    request_body = StatsRequest,
    responses(
        (status = 200, description = "统计结果", body = [AnimalStatsEntry]),
        (status = 400, description = "地址非法或超过批量上限", body = AppError)
    ),
    tag = "Animal"
)]
pub async fn post_animal_stats(
    State(state): State<AppState>,
    body: Result<Json<StatsRequest>, JsonRejection>,
) -> Result<Json<Vec<AnimalStatsEntry>>, AppError> {
    let Json(req) = body.map_err(|e| AppError::Json(e.body_text()))?;

    let limit = state.animal.max_stats_batch;
    if req.addresses.len() > limit {
        return Err(AppError::Validation(format!(
            "too many addresses: {} (max {limit})",
            req.addresses.len()
        )));
    }

    let prefix = state.animal.address_prefix.as_str();
    let addresses = req
        .addresses
        .iter()
        .map(|raw| {
            address::parse(raw, prefix).ok_or_else(|| {
                AppError::Validation(format!("Invalid address in address list {raw}"))
            })
        })
        .collect::<Result<Vec<&str>, AppError>>()?;

    Ok(Json(state.animal_service.stats(&addresses)))
}

pub fn create_animal_router() -> Router<AppState> {
    Router::new()
        .route("/animal/random", get(get_random_animal))
        .route("/animal/stats", post(post_animal_stats))
        .route("/animal/:address", get(get_animal))
}
