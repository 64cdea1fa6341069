use thiserror::Error;

/// 存储端口的读写错误。
///
/// 只在存储适配器内部使用，记分板边界会把它降级为默认值或一条警告日志。
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("读写存储失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("存储内容不是合法的 JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("读取配置文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("解析配置文件失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("环境变量 {name} 的值无效: {value:?}")]
    InvalidVar { name: &'static str, value: String },
}
