use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 参数校验错误（摘要长度、输出格式、尺寸、地址、批量上限）
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// JSON 解析错误
    #[error("JSON 解析错误: {0}")]
    Json(String),

    /// 资源不存在（例如未启用的测试接口）
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 图像渲染错误（输入已通过校验，属于内部故障）
    #[error("图像渲染错误: {0}")]
    Render(#[from] RenderError),

    /// 素材目录错误（仅在启动期出现）
    #[error("素材目录错误: {0}")]
    Catalog(#[from] CatalogError),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 渲染与栅格化错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub enum RenderError {
    /// 素材片段模板渲染失败
    #[error("模板渲染失败: {0}")]
    Template(String),

    /// SVG 文档解析失败
    #[error("SVG 解析失败: {0}")]
    Parse(String),

    /// 像素缓冲区无法分配
    #[error("无法分配 {width}x{height} 像素缓冲区")]
    Allocation { width: u32, height: u32 },

    /// 编码失败
    #[error("{format} 编码失败: {message}")]
    Encode { format: String, message: String },
}

/// 素材目录错误类型：任一出现都必须阻止服务启动
#[derive(Error, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub enum CatalogError {
    /// 读取清单或素材文件失败
    #[error("I/O 错误 {path}: {message}")]
    Io { path: String, message: String },

    /// 清单解析失败
    #[error("清单解析失败: {0}")]
    Manifest(String),

    /// 映射版本与引擎不一致
    #[error("不支持的映射版本 {found}（引擎版本 {expected}）")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// 分类缺失或为空
    #[error("分类 {0} 缺失或为空")]
    EmptyCategory(String),

    /// 未知的分类/颜色分类名
    #[error("未知名称: {0}")]
    UnknownName(String),

    /// 素材定义非法
    #[error("素材 {id} 定义非法: {reason}")]
    MalformedAsset { id: String, reason: String },

    /// 同一分类下重复的素材 ID
    #[error("分类 {category} 中素材 ID 重复: {id}")]
    DuplicateAsset { category: String, id: String },

    /// vanity 表定义非法
    #[error("vanity 定义非法 {address}: {reason}")]
    Vanity { address: String, reason: String },
}

/// RFC7807 风格的错误响应（Problem Details）。
///
/// - 让所有 API 错误返回结构化 JSON，便于调用方稳定处理
/// - 与 OpenAPI 一致（content-type = application/problem+json）
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Bad Request")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 400)]
    pub status: u16,

    /// 人类可读的详细信息（尽量稳定，不建议依赖解析）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "VALIDATION_FAILED")]
    pub code: String,

    /// 可选：请求追踪 ID。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn stable_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Json(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Render(_) => "IMAGE_RENDER_FAILED",
            AppError::Catalog(_) => "CATALOG_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }

    /// 对外展示的详细信息：校验错误直接返回原始提示，内部错误不暴露细节。
    fn public_detail(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Json(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Render(_) | AppError::Catalog(_) | AppError::Internal(_) => {
                "Error occured".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.stable_code(), "请求处理失败: {}", self);
        }

        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.public_detail()),
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(err: toml::de::Error) -> Self {
        CatalogError::Manifest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, CatalogError, RenderError};
    use axum::http::StatusCode;

    #[test]
    fn render_errors_are_never_reported_as_validation() {
        let err: AppError = RenderError::Allocation {
            width: 0,
            height: 0,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.stable_code(), "IMAGE_RENDER_FAILED");
    }

    #[test]
    fn catalog_errors_map_to_internal_failure() {
        let err: AppError = CatalogError::EmptyCategory("hat".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.stable_code(), "CATALOG_UNAVAILABLE");
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let err = AppError::Validation("Invalid address".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_detail(), "Invalid address");
    }
}
