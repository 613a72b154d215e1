use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, OpenApi};

/// Swagger UI 的 Servers：业务接口挂载在 `config.api.prefix` 下，`/health` 不带前缀
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api/v1）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api/v1")
                    .description(Some(
                        "业务接口前缀：对应 config.api.prefix（可通过 APP__API__PREFIX 覆盖）",
                    )),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（/health）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::animal::handler::get_animal,
        crate::features::animal::handler::get_random_animal,
        crate::features::animal::handler::post_animal_stats,
    ),
    components(schemas(
        crate::error::AppError,
        crate::error::ProblemDetails,
        crate::features::animal::StatsRequest,
        crate::features::animal::AnimalStatsEntry,
        crate::features::health::HealthResponse,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "Animal",
            description = "头像生成：按地址确定性生成 svg/png/webp 头像，以及批量查询头像构成。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Animal Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "确定性头像生成服务（Axum + utoipa）。除 /health 外，业务接口实际挂载在 `config.api.prefix`（默认 /api/v1）下，OpenAPI 的 paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;
