use std::future::IntoFuture;

use animal_backend::app::build_router;
use animal_backend::config::AppConfig;
use animal_backend::shutdown::{run_with_deadline, wait_for_signal};
use animal_backend::startup::{build_animal_service, run_startup_checks};
use animal_backend::state::AppState;

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "animal_backend={lvl},tower_http={lvl}",
            lvl = config.logging.level
        )
        .into()
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format.eq_ignore_ascii_case("compact") {
        builder.compact().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    // 日志初始化依赖配置，配置加载失败时先用默认日志输出错误
    if let Err(e) = AppConfig::init_global() {
        tracing_subscriber::fmt().init();
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();
    init_tracing(config);

    if let Err(e) = run_startup_checks(config) {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    let animal_service = match build_animal_service(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("素材目录加载失败，拒绝启动: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(animal_service, config);
    tracing::info!(
        "栅格渲染并发上限: {}",
        config.image.effective_parallelism()
    );
    let app = build_router(app_state, config);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!(state = "Serving", "Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Animal API: http://{}{}/animal/{{address}}", addr, config.api.prefix);

    let (tx, mut rx) = tokio::sync::watch::channel(false);
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = wait_for_signal().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅退出...", reason);
        let _ = tx.send(true);
    });
    let signalled = async move {
        let _ = rx.changed().await;
    };

    if let Err(e) = run_with_deadline(
        serve.into_future(),
        config.shutdown.timeout_duration(),
        signalled,
    )
    .await
    {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
