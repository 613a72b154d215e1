/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 启动检查与素材加载模块
pub mod startup;

/// 功能聚合模块
pub mod features;

/// 应用状态聚合模块
pub mod state;

/// 路由组装
pub mod app;

/// CORS 中间件
pub mod cors;

/// OpenAPI 文档
pub mod openapi;

/// 请求 ID 中间件
pub mod request_id;

/// 优雅退出
pub mod shutdown;

// 导出常用类型供外部使用
pub use config::AppConfig;
pub use error::AppError;
pub use shutdown::ShutdownReason;
