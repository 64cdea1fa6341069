use crate::state::*;

// --- 核心回合流程函数 ---
//
// 这里只做纯粹的状态转换：不掷骰子、不持久化、不关心谁在操作。
// 点数由调用方传入，前置条件 (电脑是否在行动) 由 engine 检查。

/// 一次掷骰的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutcome {
    /// 点数计入本回合累计
    Added { value: u8, turn_total: u32 },
    /// 掷出 1，本回合累计清零，行动权已交给对手
    PigOut,
}

/// 一次存分的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOutcome {
    /// 存分后未获胜，行动权已交给对手
    Passed { side: Side, banked: u32, total: u32 },
    /// 存分后达到目标分数，游戏结束 (不换边)
    Won { side: Side, banked: u32, total: u32 },
}

/// 开始新的一局
///
/// 双方分数、回合累计清零，First 先手。记分板不受影响。
pub fn reset(state: &mut MatchState) {
    *state = MatchState::default();
}

/// 处理一次掷骰
///
/// - 掷出 1：本回合累计清零并换边。
/// - 其他点数：计入本回合累计，不换边。
///
/// 游戏已结束时返回 `None`，状态不变。
pub fn apply_roll(state: &mut MatchState, value: u8) -> Option<RollOutcome> {
    if state.is_over { return None; }
    debug_assert!((1..=6).contains(&value));

    state.last_roll = Some(value);
    if value == 1 {
        state.turn_accumulator = 0;
        switch_turn(state);
        return Some(RollOutcome::PigOut);
    }

    state.turn_accumulator += value as u32;
    Some(RollOutcome::Added { value, turn_total: state.turn_accumulator })
}

/// 处理一次存分
///
/// 把本回合累计加到当前行动方的总分上，然后判断胜负。
/// 未获胜则换边；获胜则记录赢家，行动方保持不变。
///
/// 游戏已结束或本回合累计为 0 时返回 `None`，状态不变。
pub fn apply_hold(state: &mut MatchState, winning_score: u32) -> Option<HoldOutcome> {
    if state.is_over || state.turn_accumulator == 0 { return None; }

    let side = state.current_side;
    let banked = state.turn_accumulator;
    *state.score_mut(side) += banked;
    state.turn_accumulator = 0;
    let total = state.score(side);

    if let Some(winner) = check_winner(state, winning_score) {
        state.is_over = true;
        state.winner = Some(winner);
        return Some(HoldOutcome::Won { side: winner, banked, total });
    }

    switch_turn(state);
    Some(HoldOutcome::Passed { side, banked, total })
}

/// 返回达到目标分数的一方
///
/// 只有刚存分的一方可能越过目标，所以不会出现平局。
pub fn check_winner(state: &MatchState, winning_score: u32) -> Option<Side> {
    Side::ALL.into_iter().find(|&side| state.score(side) >= winning_score)
}

// --- 辅助逻辑函数 ---

/// 将行动权交给对手，新回合从 0 开始累计
fn switch_turn(state: &mut MatchState) {
    state.current_side = state.current_side.other();
    state.turn_accumulator = 0;
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(score_first: u32, acc: u32, side: Side) -> MatchState {
        MatchState {
            score_first,
            turn_accumulator: acc,
            current_side: side,
            ..Default::default()
        }
    }

    #[test]
    fn test_pig_out_forfeits_turn() {
        let mut state = state_with(40, 15, Side::First);
        let outcome = apply_roll(&mut state, 1);

        assert_eq!(outcome, Some(RollOutcome::PigOut));
        assert_eq!(state.turn_accumulator, 0);
        assert_eq!(state.current_side, Side::Second);
        assert_eq!(state.score_first, 40);
        assert_eq!(state.last_roll, Some(1));
    }

    #[test]
    fn test_roll_accumulates_without_switch() {
        let mut state = MatchState::default();
        apply_roll(&mut state, 4);
        apply_roll(&mut state, 6);

        assert_eq!(state.turn_accumulator, 10);
        assert_eq!(state.current_side, Side::First);
        assert_eq!(state.last_roll, Some(6));
    }

    #[test]
    fn test_hold_banks_and_switches() {
        let mut state = state_with(30, 12, Side::First);
        let outcome = apply_hold(&mut state, WINNING_SCORE);

        assert_eq!(outcome, Some(HoldOutcome::Passed { side: Side::First, banked: 12, total: 42 }));
        assert_eq!(state.turn_accumulator, 0);
        assert_eq!(state.current_side, Side::Second);
        assert!(!state.is_over);
    }

    #[test]
    fn test_winning_hold_keeps_side() {
        let mut state = state_with(92, 10, Side::First);
        let outcome = apply_hold(&mut state, WINNING_SCORE);

        assert_eq!(outcome, Some(HoldOutcome::Won { side: Side::First, banked: 10, total: 102 }));
        assert_eq!(state.score_first, 102);
        assert!(state.is_over);
        assert_eq!(state.winner, Some(Side::First));
        assert_eq!(state.current_side, Side::First);
    }

    #[test]
    fn test_hold_with_empty_accumulator_is_noop() {
        let mut state = state_with(10, 0, Side::First);
        let before = state.clone();
        assert_eq!(apply_hold(&mut state, WINNING_SCORE), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_no_changes_after_game_over() {
        let mut state = state_with(95, 5, Side::First);
        apply_hold(&mut state, WINNING_SCORE);
        let finished = state.clone();

        assert_eq!(apply_roll(&mut state, 5), None);
        assert_eq!(apply_hold(&mut state, WINNING_SCORE), None);
        assert_eq!(state, finished);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut state = state_with(70, 8, Side::Second);
        state.is_over = true;
        state.winner = Some(Side::First);
        state.last_roll = Some(3);
        reset(&mut state);
        assert_eq!(state, MatchState::default());
    }

    #[test]
    fn test_win_invariant_over_random_play() {
        // 交替掷骰/存分，检查 is_over 与分数阈值始终一致
        let faces = [3, 5, 1, 6, 2, 4, 6, 6, 1, 5, 2, 3];
        let mut state = MatchState::default();
        for step in 0..500 {
            let value = faces[step % faces.len()];
            apply_roll(&mut state, value);
            if step % 3 == 2 {
                apply_hold(&mut state, WINNING_SCORE);
            }
            let crossed = state.score_first >= WINNING_SCORE || state.score_second >= WINNING_SCORE;
            assert_eq!(state.is_over, crossed);
            if let Some(w) = state.winner {
                assert!(state.score(w) >= WINNING_SCORE);
            }
        }
        assert!(state.is_over);
    }
}
