use serde::{Deserialize, Serialize};
use std::fmt;

/// 获胜所需的累计分数
pub const WINNING_SCORE: u32 = 100;

/// 玩家座位。只标识位置，不代表具体的人。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    First,
    Second,
}

/// 对局模式，开局前选择。切换模式会重置对局。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// 单人：First 是玩家，Second 由电脑托管
    #[default]
    Solo,
    /// 双人：两边都是玩家
    Duel,
}

/// 一局游戏的全部可变状态。只存在于内存中，不做持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub score_first: u32,
    pub score_second: u32,
    pub turn_accumulator: u32,  // 本回合尚未存入的点数
    pub current_side: Side,
    pub last_roll: Option<u8>,  // 最近一次掷出的点数 (1..=6)
    pub is_over: bool,
    pub winner: Option<Side>,
    // 电脑正在行动时为 true，此时拒绝一切手动操作
    pub opponent_acting: bool,
}

// --- Side / Mode 的实现方法 ---

impl Side {
    pub const ALL: [Side; 2] = [Side::First, Side::Second];

    /// 对手座位
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// 名字为空时使用的默认显示名
    pub fn default_label(self) -> &'static str {
        match self {
            Side::First => "Player 1",
            Side::Second => "Player 2",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.default_label())
    }
}

impl Mode {
    /// 该模式下由电脑托管的座位 (如果存在)
    pub fn scripted_side(self) -> Option<Side> {
        match self {
            Mode::Solo => Some(Side::Second),
            Mode::Duel => None,
        }
    }

    pub fn is_scripted(self, side: Side) -> bool {
        self.scripted_side() == Some(side)
    }
}

// --- MatchState 的实现方法 ---

impl Default for MatchState {
    fn default() -> Self {
        MatchState {
            score_first: 0,
            score_second: 0,
            turn_accumulator: 0,
            current_side: Side::First,
            last_roll: None,
            is_over: false,
            winner: None,
            opponent_acting: false,
        }
    }
}

impl MatchState {
    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::First => self.score_first,
            Side::Second => self.score_second,
        }
    }

    pub fn score_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::First => &mut self.score_first,
            Side::Second => &mut self.score_second,
        }
    }

    /// 当前行动方存入本回合点数后的分数
    pub fn projected_score(&self) -> u32 {
        self.score(self.current_side) + self.turn_accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_other_flips() {
        assert_eq!(Side::First.other(), Side::Second);
        assert_eq!(Side::Second.other(), Side::First);
    }

    #[test]
    fn test_scripted_side_only_in_solo() {
        assert!(Mode::Solo.is_scripted(Side::Second));
        assert!(!Mode::Solo.is_scripted(Side::First));
        assert_eq!(Mode::Duel.scripted_side(), None);
    }

    #[test]
    fn test_projected_score() {
        let state = MatchState { score_second: 85, turn_accumulator: 15, current_side: Side::Second, ..Default::default() };
        assert_eq!(state.projected_score(), 100);
        assert_eq!(state.score(Side::First), 0);
    }
}
