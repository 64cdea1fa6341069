use crate::error::StoreError;
use crate::state::Side;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const SCOREBOARD_KEY: &str = "scoreboard";

/// 双方的胜负记录。跨进程保存，只有玩家主动清零时才会重置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardRecord {
    pub wins_first: u32,
    pub losses_first: u32,
    pub wins_second: u32,
    pub losses_second: u32,
}

impl ScoreboardRecord {
    /// 记录一局结果：赢家胜场 +1，对手负场 +1
    pub fn record_win(&mut self, winner: Side) {
        match winner {
            Side::First => {
                self.wins_first += 1;
                self.losses_second += 1;
            }
            Side::Second => {
                self.wins_second += 1;
                self.losses_first += 1;
            }
        }
    }

    pub fn wins(&self, side: Side) -> u32 {
        match side {
            Side::First => self.wins_first,
            Side::Second => self.wins_second,
        }
    }

    pub fn losses(&self, side: Side) -> u32 {
        match side {
            Side::First => self.losses_first,
            Side::Second => self.losses_second,
        }
    }

    pub fn total_wins(&self) -> u32 {
        self.wins_first + self.wins_second
    }

    pub fn total_losses(&self) -> u32 {
        self.losses_first + self.losses_second
    }
}

// --- 存储端口 ---

/// 键值存储端口。引擎只依赖这个接口，不关心具体存在哪里。
pub trait Storage: Send {
    /// 键不存在时返回 `Ok(None)`
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// 纯内存存储，进程退出即丢失
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 每个键一个文件: `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // 先写临时文件再改名，避免写到一半留下损坏的文件
        std::fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }
}

// --- 记分板存取 ---

/// 记分板与玩家名字的持久化入口。
///
/// 这里是错误的边界：读失败或内容损坏一律退回默认值，写失败只记警告，
/// 内存中的数据始终以调用方为准。
pub struct ScoreboardStore {
    storage: Box<dyn Storage>,
}

impl ScoreboardStore {
    pub fn new(storage: impl Storage + 'static) -> Self {
        ScoreboardStore { storage: Box::new(storage) }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// 读取记分板。没有数据、数据为空或格式错误时返回全 0 记录。
    pub fn load(&self) -> ScoreboardRecord {
        match self.read_json(SCOREBOARD_KEY) {
            Ok(Some(record)) => record,
            Ok(None) => ScoreboardRecord::default(),
            Err(e) => {
                warn!("记分板数据无法读取，使用全 0 记录: {}", e);
                ScoreboardRecord::default()
            }
        }
    }

    /// 尽力保存，失败时不会影响内存中的记录
    pub fn save(&mut self, record: &ScoreboardRecord) {
        if let Err(e) = self.write_json(SCOREBOARD_KEY, record) {
            warn!("保存记分板失败: {}", e);
        }
    }

    /// 清零全部计数并保存
    pub fn reset_all(&mut self) -> ScoreboardRecord {
        let record = ScoreboardRecord::default();
        self.save(&record);
        record
    }

    /// 读取某一方保存的名字，可能是空字符串
    pub fn load_name(&self, side: Side) -> String {
        match self.read_json::<String>(name_key(side)) {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                warn!("{} 的名字无法读取: {}", side, e);
                String::new()
            }
        }
    }

    pub fn save_name(&mut self, side: Side, name: &str) {
        if let Err(e) = self.write_json(name_key(side), &name) {
            warn!("保存 {} 的名字失败: {}", side, e);
        }
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.storage.read(key)? {
            None => Ok(None),
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string(value)?;
        self.storage.write(key, &text)
    }
}

fn name_key(side: Side) -> &'static str {
    match side {
        Side::First => "name_first",
        Side::Second => "name_second",
    }
}
