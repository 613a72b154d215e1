use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::{AnimalConfig, AppConfig};
use crate::features::animal::AnimalService;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 头像渲染管线（内部持有只读素材目录）
    pub animal_service: AnimalService,
    /// 头像接口相关配置
    pub animal: Arc<AnimalConfig>,
    /// 控制并发栅格化的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(animal_service: AnimalService, config: &AppConfig) -> Self {
        Self {
            animal_service,
            animal: Arc::new(config.animal.clone()),
            render_semaphore: Arc::new(Semaphore::new(config.image.effective_parallelism())),
        }
    }
}
