//! 优雅退出：等待 Ctrl+C / SIGTERM，并为在途请求设置超时上限

use std::future::Future;
use std::time::Duration;

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
}

/// 等待任一退出信号
pub async fn wait_for_signal() -> ShutdownReason {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("监听 Ctrl+C 失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("监听 SIGTERM 失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => ShutdownReason::Interrupt,
        () = terminate => ShutdownReason::Terminate,
    }
}

/// 运行服务 future，直到其自然结束或在退出信号后超过 `timeout`。
///
/// `serve` 应当已挂载 [`wait_for_signal`] 作为 graceful shutdown 触发器；
/// 这里只负责在超时后放弃等待在途请求。
pub async fn run_with_deadline<F, E>(
    serve: F,
    timeout: Duration,
    signal: impl Future<Output = ()>,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
{
    tokio::pin!(serve);
    tokio::select! {
        res = &mut serve => res,
        () = signal => {
            match tokio::time::timeout(timeout, &mut serve).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!("优雅退出超时（{}秒），强制退出", timeout.as_secs());
                    Ok(())
                }
            }
        }
    }
}
