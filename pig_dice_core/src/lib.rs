//! # Pig 骰子游戏核心逻辑库
//!
//! 这个 `core` crate 包含了双人 Pig 骰子游戏的全部核心：
//! 对局状态、回合规则、电脑托管的决策与节奏状态机、记分板持久化，
//! 以及展示层与引擎之间的消息定义。
//! 它不依赖任何异步运行时或界面，计时与网络由上层应用负责。

mod autoplay;
mod config;
mod dice;
mod engine;
mod error;
mod logic;
mod message;
mod scoreboard;
mod state;

pub use autoplay::{decide, AutoplayController, AutoplayPhase, Decision, PaceTicket};

pub use config::*;

pub use dice::*;

pub use engine::*;

pub use error::*;

pub use logic::{apply_hold, apply_roll, check_winner, reset, HoldOutcome, RollOutcome};

pub use message::*;

pub use scoreboard::*;

pub use state::*;
