use crate::autoplay::AutoplayPhase;
use crate::scoreboard::ScoreboardRecord;
use crate::state::{MatchState, Mode, Side};
use serde::{Deserialize, Serialize};

// --- 客户端 -> 服务器 的消息 ---
// 展示层可以调用的全部操作。不合时宜的操作 (比如电脑行动时掷骰) 会被静默忽略。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// 切换对局模式，同时重置对局
    SetMode(Mode),
    /// 以当前模式再来一局
    Replay,
    /// 当前玩家掷骰
    Roll,
    /// 当前玩家存分
    Hold,
    /// 如果轮到电脑，让它开始行动
    StartOpponentTurn,
    /// 清空记分板
    ResetScoreboard,
    /// 设置某一方的名字，空字符串表示使用默认名
    SetName { side: Side, name: String },
    /// 获取完整状态快照
    GetSnapshot,
}

// --- 服务器 -> 客户端 的消息 ---
// 状态变化后广播给所有观察者的事件。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// 完整状态快照。
    /// 新连接加入、或每个会改变状态的操作之后发送。
    Snapshot(Snapshot),

    /// 新的一局开始
    MatchStarted { mode: Mode },

    /// 掷出 2..=6，计入本回合累计
    Rolled { side: Side, value: u8, turn_total: u32 },

    /// 掷出 1，本回合累计作废
    PiggedOut { side: Side },

    /// 存分成功
    Held { side: Side, banked: u32, total: u32 },

    /// 行动权交给另一方
    TurnPassed { to: Side },

    /// 游戏结束
    GameOver { winner: Side },

    /// 记分板变化 (一局结束或被清空)
    ScoreboardUpdated(ScoreboardRecord),

    /// 电脑开始托管回合
    OpponentStarted,

    /// 电脑的回合结束 (存分、掷出 1 或被中止)
    OpponentFinished,

    /// 某一方的名字更新了，`name` 是解析后的显示名
    NameUpdated { side: Side, name: String },

    Info { message: String },
    Error { message: String },
}

/// 展示层需要的全部只读状态
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub mode: Mode,
    pub state: MatchState,
    pub scoreboard: ScoreboardRecord,
    /// 解析后的显示名，下标 0 是 First
    pub names: [String; 2],
    pub autoplay: AutoplayPhase,
}

impl ServerMessage {
    /// 是否会改变展示层看到的状态 (需要随后推送快照)
    pub fn changes_state(&self) -> bool {
        !matches!(self, ServerMessage::Snapshot(_) | ServerMessage::Info { .. } | ServerMessage::Error { .. })
    }
}
