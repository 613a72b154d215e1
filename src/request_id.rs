use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// 请求 ID 所使用的请求/响应头
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_LEN: usize = 128;

/// 当前请求的 ID，写入 request extensions 供 handler 读取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// 透传客户端提供的合法 ID，否则生成 `req_<uuid>`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let client = headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| is_acceptable(v));
        match client {
            Some(v) => Self(v.to_string()),
            None => Self(format!("req_{}", Uuid::new_v4().simple())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

tokio::task_local! {
    /// 当前任务绑定的请求 ID（错误响应体中的 requestId 来自这里）
    static CURRENT: String;
}

/// 当前任务上下文中的请求 ID；不在请求上下文中时为 `None`
pub fn current_request_id() -> Option<String> {
    CURRENT.try_with(Clone::clone).ok()
}

fn is_acceptable(v: &str) -> bool {
    !v.is_empty()
        && v.len() <= MAX_LEN
        && v.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// 请求 ID 中间件：注入任务上下文，并回写到响应头
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    let mut res = CURRENT.scope(id.0.clone(), next.run(req)).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
