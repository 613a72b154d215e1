/// 头像生成
pub mod animal;
/// 健康检查
pub mod health;
