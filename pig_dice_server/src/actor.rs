use std::time::Duration;

use pig_dice_core::{ClientMessage, PaceTicket, PigEngine, ServerMessage, Snapshot};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

// 引擎任务的输入。手动操作和计时回调走同一个队列，所有修改因此天然串行。
enum EngineInput {
    Command(ClientMessage),
    PaceElapsed(PaceTicket),
    Snapshot(oneshot::Sender<Snapshot>),
}

/// 引擎任务的句柄，可以随意克隆给每个连接
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineInput>,
    events: broadcast::Sender<ServerMessage>,
}

impl EngineHandle {
    /// 启动引擎任务。所有句柄都被丢弃后任务退出。
    pub fn spawn(engine: PigEngine) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(64);
        let (events, _) = broadcast::channel(256);
        let task = tokio::spawn(run_engine(engine, rx, commands.downgrade(), events.clone()));
        (EngineHandle { commands, events }, task)
    }

    /// 提交一个操作。引擎任务已退出时返回 false。
    pub async fn send(&self, msg: ClientMessage) -> bool {
        self.commands.send(EngineInput::Command(msg)).await.is_ok()
    }

    /// 读取当前状态快照。会排在此前提交的操作之后。
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(EngineInput::Snapshot(tx)).await.ok()?;
        rx.await.ok()
    }

    /// 订阅引擎产生的全部事件
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }
}

/// 引擎任务主循环
///
/// 只持有命令队列的弱引用，否则队列永远不会关闭。
async fn run_engine(
    mut engine: PigEngine,
    mut rx: mpsc::Receiver<EngineInput>,
    scheduler: mpsc::WeakSender<EngineInput>,
    events: broadcast::Sender<ServerMessage>,
) {
    info!("引擎任务已启动");
    while let Some(input) = rx.recv().await {
        let produced = match input {
            EngineInput::Command(msg) => {
                debug!("收到操作 {:?}", msg);
                engine.handle_client_message(msg)
            }
            EngineInput::PaceElapsed(ticket) => engine.on_pace_elapsed(ticket),
            EngineInput::Snapshot(reply) => {
                let _ = reply.send(engine.snapshot());
                continue;
            }
        };

        if let Some(ticket) = engine.take_pace_request() {
            schedule_pace(&scheduler, ticket);
        }
        publish(&events, produced, &engine);
    }
    info!("引擎任务已退出");
}

/// 延时后把票据交回引擎队列
fn schedule_pace(scheduler: &mpsc::WeakSender<EngineInput>, ticket: PaceTicket) {
    let Some(tx) = scheduler.upgrade() else { return; };
    tokio::spawn(async move {
        if ticket.delay > Duration::ZERO {
            tokio::time::sleep(ticket.delay).await;
        }
        // 发送失败说明引擎已退出，票据作废即可
        let _ = tx.send(EngineInput::PaceElapsed(ticket)).await;
    });
}

/// 广播事件；只要状态有变化，随后再推送一份完整快照
fn publish(events: &broadcast::Sender<ServerMessage>, produced: Vec<ServerMessage>, engine: &PigEngine) {
    let changed = produced.iter().any(ServerMessage::changes_state);
    for msg in produced {
        // 没有订阅者时发送会失败，可以忽略
        let _ = events.send(msg);
    }
    if changed {
        let _ = events.send(ServerMessage::Snapshot(engine.snapshot()));
    }
}
