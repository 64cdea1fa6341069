use crate::autoplay::{AutoplayController, AutoplayPhase, Decision, PaceTicket};
use crate::config::EngineConfig;
use crate::dice::Die;
use crate::logic::{self, HoldOutcome, RollOutcome};
use crate::message::{ClientMessage, ServerMessage, Snapshot};
use crate::scoreboard::{ScoreboardRecord, ScoreboardStore};
use crate::state::{MatchState, Mode, Side};
use tracing::{debug, info};

/// 单人模式下电脑的显示名
pub const COMPUTER_LABEL: &str = "Computer";

/// 一张游戏桌：对局状态、记分板、电脑托管都归它所有。
///
/// 所有修改都在同一个所有者上顺序发生，不需要加锁。每个操作返回它产生的事件，
/// 什么都没改变的操作返回空列表。
///
/// 电脑托管需要计时：操作完成后调用 [`PigEngine::take_pace_request`]，
/// 如果拿到票据，就在 `delay` 之后把它交回 [`PigEngine::on_pace_elapsed`]。
pub struct PigEngine {
    state: MatchState,
    mode: Mode,
    config: EngineConfig,
    scoreboard: ScoreboardRecord,
    store: ScoreboardStore,
    names: [String; 2],  // 保存的原始名字，可能为空
    die: Box<dyn Die>,
    autoplay: AutoplayController,
    pending_pace: Option<PaceTicket>,
}

impl PigEngine {
    /// 创建引擎并从存储中读取记分板和名字
    pub fn new(config: EngineConfig, store: ScoreboardStore, die: impl Die + 'static) -> Self {
        let scoreboard = store.load();
        let names = [store.load_name(Side::First), store.load_name(Side::Second)];
        let autoplay = AutoplayController::new(config.hold_threshold, config.pace());
        info!(
            "引擎就绪，记分板 {}:{} / {}:{}",
            scoreboard.wins_first, scoreboard.losses_first, scoreboard.wins_second, scoreboard.losses_second
        );
        PigEngine {
            state: MatchState::default(),
            mode: Mode::default(),
            config,
            scoreboard,
            store,
            names,
            die: Box::new(die),
            autoplay,
            pending_pace: None,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scoreboard(&self) -> &ScoreboardRecord {
        &self.scoreboard
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn autoplay_phase(&self) -> AutoplayPhase {
        self.autoplay.phase()
    }

    /// 分发一条客户端消息
    pub fn handle_client_message(&mut self, msg: ClientMessage) -> Vec<ServerMessage> {
        match msg {
            ClientMessage::SetMode(mode) => self.set_mode(mode),
            ClientMessage::Replay => self.replay(),
            ClientMessage::Roll => self.roll(),
            ClientMessage::Hold => self.hold(),
            ClientMessage::StartOpponentTurn => self.start_opponent_turn_if_needed(),
            ClientMessage::ResetScoreboard => self.reset_scoreboard(),
            ClientMessage::SetName { side, name } => self.set_name(side, &name),
            ClientMessage::GetSnapshot => vec![ServerMessage::Snapshot(self.snapshot())],
        }
    }

    // --- 对局控制 ---

    /// 切换模式并重置对局
    pub fn set_mode(&mut self, mode: Mode) -> Vec<ServerMessage> {
        self.reset(mode)
    }

    /// 以当前模式再来一局
    pub fn replay(&mut self) -> Vec<ServerMessage> {
        self.reset(self.mode)
    }

    /// 重置对局状态，记分板保持不变。进行中的托管回合随之作废。
    pub fn reset(&mut self, mode: Mode) -> Vec<ServerMessage> {
        let mut events = Vec::new();
        if self.autoplay.is_active() {
            events.push(ServerMessage::OpponentFinished);
        }
        self.autoplay.cancel();
        self.pending_pace = None;
        self.mode = mode;
        logic::reset(&mut self.state);
        info!("新的一局开始，模式 {:?}", mode);
        events.push(ServerMessage::MatchStarted { mode });
        events
    }

    /// 手动掷骰。游戏结束、电脑正在行动、或当前是电脑的回合时忽略。
    pub fn roll(&mut self) -> Vec<ServerMessage> {
        if !self.accepts_manual_input() { return vec![]; }
        self.roll_for_current()
    }

    /// 手动存分。前置条件同 [`PigEngine::roll`]，本回合累计为 0 时也忽略。
    pub fn hold(&mut self) -> Vec<ServerMessage> {
        if !self.accepts_manual_input() { return vec![]; }
        self.hold_for_current()
    }

    /// 轮到电脑、游戏未结束、且没有托管回合在进行时，开始电脑的回合
    pub fn start_opponent_turn_if_needed(&mut self) -> Vec<ServerMessage> {
        if self.state.is_over || !self.mode.is_scripted(self.state.current_side) {
            return vec![];
        }
        match self.autoplay.begin() {
            None => vec![],
            Some(ticket) => {
                debug!("电脑开始行动，序号 {}", ticket.sequence);
                self.state.opponent_acting = true;
                self.pending_pace = Some(ticket);
                vec![ServerMessage::OpponentStarted]
            }
        }
    }

    /// 取走待安排的计时请求
    pub fn take_pace_request(&mut self) -> Option<PaceTicket> {
        self.pending_pace.take()
    }

    /// 计时结束：电脑走一步
    ///
    /// 过期票据直接丢弃。如果已经不是电脑的回合或游戏已结束，结束托管。
    /// 否则按策略掷骰或存分；掷出 2..=6 时会再次请求计时。
    pub fn on_pace_elapsed(&mut self, ticket: PaceTicket) -> Vec<ServerMessage> {
        if !self.autoplay.redeem(ticket) {
            debug!("丢弃过期的计时票据，序号 {}", ticket.sequence);
            return vec![];
        }

        if self.state.is_over || !self.mode.is_scripted(self.state.current_side) {
            return self.finish_autoplay(vec![]);
        }

        match self.autoplay.decide(&self.state, self.config.winning_score) {
            Decision::Hold => {
                let events = self.hold_for_current();
                self.finish_autoplay(events)
            }
            Decision::Roll => {
                let events = self.roll_for_current();
                // 掷出 1 时已经换边
                if self.mode.is_scripted(self.state.current_side) {
                    self.pending_pace = Some(self.autoplay.continue_turn());
                    events
                } else {
                    self.finish_autoplay(events)
                }
            }
        }
    }

    // --- 记分板与名字 ---

    /// 清空记分板并保存
    pub fn reset_scoreboard(&mut self) -> Vec<ServerMessage> {
        self.scoreboard = self.store.reset_all();
        info!("记分板已清空");
        vec![ServerMessage::ScoreboardUpdated(self.scoreboard)]
    }

    pub fn set_name(&mut self, side: Side, name: &str) -> Vec<ServerMessage> {
        let name = name.trim();
        self.store.save_name(side, name);
        self.names[side_index(side)] = name.to_string();
        vec![ServerMessage::NameUpdated { side, name: self.name_for_side(side) }]
    }

    /// 显示名：电脑固定叫 Computer，其余为保存的名字，为空时使用默认名
    pub fn name_for_side(&self, side: Side) -> String {
        if self.mode.is_scripted(side) {
            return COMPUTER_LABEL.to_string();
        }
        let stored = &self.names[side_index(side)];
        if stored.is_empty() {
            side.default_label().to_string()
        } else {
            stored.clone()
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            state: self.state.clone(),
            scoreboard: self.scoreboard,
            names: [self.name_for_side(Side::First), self.name_for_side(Side::Second)],
            autoplay: self.autoplay.phase(),
        }
    }

    // --- 辅助逻辑函数 ---

    /// 手动操作的唯一前置检查
    fn accepts_manual_input(&self) -> bool {
        !self.state.is_over && !self.autoplay.is_active() && !self.mode.is_scripted(self.state.current_side)
    }

    fn roll_for_current(&mut self) -> Vec<ServerMessage> {
        let side = self.state.current_side;
        let value = self.die.roll();
        let mut events = Vec::new();
        match logic::apply_roll(&mut self.state, value) {
            None => {}
            Some(RollOutcome::Added { value, turn_total }) => {
                debug!("{} 掷出 {}，本回合累计 {}", side, value, turn_total);
                events.push(ServerMessage::Rolled { side, value, turn_total });
            }
            Some(RollOutcome::PigOut) => {
                debug!("{} 掷出 1，本回合作废", side);
                events.push(ServerMessage::PiggedOut { side });
                self.on_turn_passed(&mut events);
            }
        }
        events
    }

    fn hold_for_current(&mut self) -> Vec<ServerMessage> {
        let mut events = Vec::new();
        match logic::apply_hold(&mut self.state, self.config.winning_score) {
            None => {}
            Some(HoldOutcome::Passed { side, banked, total }) => {
                debug!("{} 存入 {}，总分 {}", side, banked, total);
                events.push(ServerMessage::Held { side, banked, total });
                self.on_turn_passed(&mut events);
            }
            Some(HoldOutcome::Won { side, banked, total }) => {
                events.push(ServerMessage::Held { side, banked, total });
                self.scoreboard.record_win(side);
                self.store.save(&self.scoreboard);
                info!("{} 以 {} 分获胜", side, total);
                events.push(ServerMessage::GameOver { winner: side });
                events.push(ServerMessage::ScoreboardUpdated(self.scoreboard));
            }
        }
        events
    }

    /// 换边之后检查是否轮到电脑
    fn on_turn_passed(&mut self, events: &mut Vec<ServerMessage>) {
        events.push(ServerMessage::TurnPassed { to: self.state.current_side });
        events.extend(self.start_opponent_turn_if_needed());
    }

    fn finish_autoplay(&mut self, mut events: Vec<ServerMessage>) -> Vec<ServerMessage> {
        self.autoplay.finish();
        self.state.opponent_acting = false;
        events.push(ServerMessage::OpponentFinished);
        events
    }
}

fn side_index(side: Side) -> usize {
    match side {
        Side::First => 0,
        Side::Second => 1,
    }
}

// --- 单元测试 ---
