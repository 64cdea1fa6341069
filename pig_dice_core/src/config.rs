//! 引擎与服务端配置。
//!
//! 先读可选的 JSON 配置文件，再用 `PIG_*` 环境变量覆盖。
//! 所有字段都有默认值，不提供任何配置也能直接运行。

use crate::error::ConfigError;
use crate::state::WINNING_SCORE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// 游戏规则与电脑托管参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 获胜分数
    #[serde(default = "default_winning_score")]
    pub winning_score: u32,
    /// 电脑本回合累计达到这个值就存分
    #[serde(default = "default_hold_threshold")]
    pub hold_threshold: u32,
    /// 电脑每一步之间的停顿 (毫秒)，只影响观感
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
}

fn default_winning_score() -> u32 {
    WINNING_SCORE
}

fn default_hold_threshold() -> u32 {
    20
}

fn default_pace_ms() -> u64 {
    500
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            winning_score: default_winning_score(),
            hold_threshold: default_hold_threshold(),
            pace_ms: default_pace_ms(),
        }
    }
}

impl EngineConfig {
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }
}

/// 服务端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// 记分板和玩家名字的存放目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// 骰子种子，设置后整局可复现
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_port() -> u16 {
    25917
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./pig_data")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
            seed: None,
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// `PIG_CONFIG` 指定的文件 (如果有)，再叠加环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("PIG_CONFIG") {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    /// 用 `lookup` 取到的值覆盖对应字段，便于测试时不碰真实环境变量
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = parse_var(&lookup, "PIG_PORT")? { self.port = v; }
        if let Some(v) = lookup("PIG_DATA_DIR") { self.data_dir = PathBuf::from(v); }
        if let Some(v) = parse_var(&lookup, "PIG_SEED")? { self.seed = Some(v); }
        if let Some(v) = parse_var(&lookup, "PIG_HOLD_THRESHOLD")? { self.engine.hold_threshold = v; }
        if let Some(v) = parse_var(&lookup, "PIG_PACE_MS")? { self.engine.pace_ms = v; }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 25917);
        assert_eq!(cfg.engine.winning_score, 100);
        assert_eq!(cfg.engine.hold_threshold, 20);
        assert_eq!(cfg.engine.pace(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: ServerConfig = serde_json::from_str(r#"{"engine":{"hold_threshold":25}}"#).unwrap();
        assert_eq!(cfg.engine.hold_threshold, 25);
        assert_eq!(cfg.engine.pace_ms, 500);
        assert_eq!(cfg.port, 25917);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pig.json");
        std::fs::write(&path, r#"{"port":4000,"seed":9}"#).unwrap();
        let cfg = ServerConfig::load(&path).unwrap();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.seed, Some(9));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [("PIG_PORT", "8080"), ("PIG_PACE_MS", "0"), ("PIG_DATA_DIR", "/tmp/pig")].into();
        let mut cfg = ServerConfig::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.engine.pace_ms, 0);
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/pig"));
    }

    #[test]
    fn test_invalid_env_value_is_error() {
        let mut cfg = ServerConfig::default();
        let err = cfg.apply_overrides(|k| (k == "PIG_HOLD_THRESHOLD").then(|| "lots".to_string()));
        assert!(matches!(err, Err(ConfigError::InvalidVar { name: "PIG_HOLD_THRESHOLD", .. })));
    }
}
