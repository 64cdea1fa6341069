//! # 电脑托管
//!
//! 单人模式下，Second 由电脑操作。电脑的一个回合被拆成若干步，
//! 每步之间停顿一个固定间隔，让玩家看得清过程。
//!
//! 控制器本身不计时，也不碰对局状态，只维护一个小状态机：
//!
//! ```text
//! Idle --begin--> AwaitingPace --redeem--> Thinking --+--> AwaitingPace (掷出 2..=6)
//!                                                     +--> Idle (存分 / 掷出 1 / 中止)
//! ```
//!
//! 每次进入 `AwaitingPace` 都会得到一张 [`PaceTicket`]，由外部计时器在间隔结束后交回。
//! 对局被重置时序号自增，还没交回的旧票据随之作废。

use crate::state::MatchState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutoplayPhase {
    /// 没有托管回合在进行
    #[default]
    Idle,
    /// 正在决定并执行下一步
    Thinking,
    /// 等待计时器交回票据
    AwaitingPace,
}

/// 电脑每一步的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Roll,
    Hold,
}

/// 等待计时结束的凭据。`delay` 之后交给 engine 的 `on_pace_elapsed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaceTicket {
    pub sequence: u64,
    pub delay: Duration,
}

/// 存分策略
///
/// 存分后能达到目标分数，或本回合累计已达到阈值，就存分；否则继续掷。
pub fn decide(score: u32, accumulator: u32, winning_score: u32, hold_threshold: u32) -> Decision {
    if score + accumulator >= winning_score || accumulator >= hold_threshold {
        Decision::Hold
    } else {
        Decision::Roll
    }
}

#[derive(Debug, Clone)]
pub struct AutoplayController {
    phase: AutoplayPhase,
    sequence: u64,
    hold_threshold: u32,
    pace: Duration,
}

impl AutoplayController {
    pub fn new(hold_threshold: u32, pace: Duration) -> Self {
        AutoplayController {
            phase: AutoplayPhase::Idle,
            sequence: 0,
            hold_threshold,
            pace,
        }
    }

    pub fn phase(&self) -> AutoplayPhase {
        self.phase
    }

    /// 托管回合进行中 (包括等待计时)
    pub fn is_active(&self) -> bool {
        self.phase != AutoplayPhase::Idle
    }

    pub fn hold_threshold(&self) -> u32 {
        self.hold_threshold
    }

    /// 开始一个托管回合。已有回合在进行时忽略请求。
    pub fn begin(&mut self) -> Option<PaceTicket> {
        if self.is_active() { return None; }
        self.sequence += 1;
        Some(self.await_pace())
    }

    /// 交回票据。只有当前回合、正在等待的票据有效，其余一律视为过期。
    pub fn redeem(&mut self, ticket: PaceTicket) -> bool {
        if self.phase != AutoplayPhase::AwaitingPace || ticket.sequence != self.sequence {
            return false;
        }
        self.phase = AutoplayPhase::Thinking;
        true
    }

    /// 掷出 2..=6 后继续，等待下一次计时
    pub fn continue_turn(&mut self) -> PaceTicket {
        debug_assert_eq!(self.phase, AutoplayPhase::Thinking);
        self.await_pace()
    }

    /// 回合正常结束 (存分、掷出 1 或中止)
    pub fn finish(&mut self) {
        self.phase = AutoplayPhase::Idle;
    }

    /// 对局被外部重置：回到 Idle，并让所有未交回的票据过期
    pub fn cancel(&mut self) {
        self.phase = AutoplayPhase::Idle;
        self.sequence += 1;
    }

    /// 针对当前行动方做决定。累计为 0 时存分没有意义，至少先掷一次。
    pub fn decide(&self, state: &MatchState, winning_score: u32) -> Decision {
        if state.turn_accumulator == 0 {
            return Decision::Roll;
        }
        decide(state.score(state.current_side), state.turn_accumulator, winning_score, self.hold_threshold)
    }

    fn await_pace(&mut self) -> PaceTicket {
        self.phase = AutoplayPhase::AwaitingPace;
        PaceTicket { sequence: self.sequence, delay: self.pace }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Side, WINNING_SCORE};

    fn controller() -> AutoplayController {
        AutoplayController::new(20, Duration::from_millis(500))
    }

    #[test]
    fn test_policy_rolls_below_threshold() {
        assert_eq!(decide(0, 0, WINNING_SCORE, 20), Decision::Roll);
        assert_eq!(decide(50, 19, WINNING_SCORE, 20), Decision::Roll);
    }

    #[test]
    fn test_policy_holds_at_threshold() {
        assert_eq!(decide(0, 20, WINNING_SCORE, 20), Decision::Hold);
        assert_eq!(decide(10, 26, WINNING_SCORE, 20), Decision::Hold);
    }

    #[test]
    fn test_policy_holds_when_hold_would_win() {
        // 85 + 15 = 100，阈值还没到也要存分
        assert_eq!(decide(85, 15, WINNING_SCORE, 20), Decision::Hold);
        assert_eq!(decide(84, 15, WINNING_SCORE, 20), Decision::Roll);

        let state = MatchState { score_second: 85, turn_accumulator: 15, current_side: Side::Second, ..Default::default() };
        assert_eq!(controller().decide(&state, WINNING_SCORE), Decision::Hold);
    }

    #[test]
    fn test_zero_threshold_always_holds() {
        assert_eq!(decide(0, 0, WINNING_SCORE, 0), Decision::Hold);
    }

    #[test]
    fn test_controller_rolls_on_empty_accumulator() {
        let ctl = AutoplayController::new(0, Duration::ZERO);
        let state = MatchState { current_side: Side::Second, ..Default::default() };
        assert_eq!(ctl.decide(&state, WINNING_SCORE), Decision::Roll);
    }

    #[test]
    fn test_policy_terminates_for_any_threshold() {
        // 每次继续都至少 +2，所以在阈值或目标分数之前必然停下
        for threshold in [0, 1, 20, 99, 1000] {
            for start in [0, 40, 98] {
                let mut acc = 0;
                let mut steps = 0;
                while decide(start, acc, WINNING_SCORE, threshold) == Decision::Roll {
                    acc += 2;
                    steps += 1;
                    assert!(steps <= WINNING_SCORE, "阈值 {threshold} 起始 {start} 没有停下");
                }
            }
        }
    }

    #[test]
    fn test_begin_is_ignored_while_active() {
        let mut ctl = controller();
        let ticket = ctl.begin().unwrap();
        assert_eq!(ctl.phase(), AutoplayPhase::AwaitingPace);
        assert_eq!(ticket.delay, Duration::from_millis(500));
        assert!(ctl.begin().is_none());
    }

    #[test]
    fn test_ticket_lifecycle() {
        let mut ctl = controller();
        let first = ctl.begin().unwrap();
        assert!(ctl.redeem(first));
        assert_eq!(ctl.phase(), AutoplayPhase::Thinking);
        // 同一张票不能用两次
        assert!(!ctl.redeem(first));

        let next = ctl.continue_turn();
        assert_eq!(next.sequence, first.sequence);
        assert!(ctl.redeem(next));
        ctl.finish();
        assert!(!ctl.is_active());
    }

    #[test]
    fn test_cancel_expires_outstanding_ticket() {
        let mut ctl = controller();
        let stale = ctl.begin().unwrap();
        ctl.cancel();
        assert!(!ctl.is_active());

        let fresh = ctl.begin().unwrap();
        assert_ne!(stale.sequence, fresh.sequence);
        assert!(!ctl.redeem(stale));
        assert!(ctl.redeem(fresh));
    }
}
