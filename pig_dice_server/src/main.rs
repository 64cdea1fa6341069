use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{stream::StreamExt, SinkExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pig_dice_core::{ClientMessage, FileStorage, PigEngine, RandomDie, ScoreboardStore, ServerConfig, ServerMessage};

mod actor;

use actor::EngineHandle;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    info!("数据目录 {}", config.data_dir.display());

    let store = ScoreboardStore::new(FileStorage::new(&config.data_dir));
    let engine = match config.seed {
        Some(seed) => {
            info!("使用固定骰子种子 {}", seed);
            PigEngine::new(config.engine.clone(), store, RandomDie::seeded(seed))
        }
        None => PigEngine::new(config.engine.clone(), store, RandomDie::new()),
    };
    let (handle, _engine_task) = EngineHandle::spawn(engine);

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("服务器正在监听 {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(handle): State<EngineHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, handle))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, handle: EngineHandle) {
    let (mut sender, mut receiver) = socket.split();

    // 只发给当前连接的消息 (快照、错误提示)
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);
    let mut events = handle.subscribe();
    let lag_handle = handle.clone();

    // 启动一个新任务，把广播事件和私有消息一起写进 WebSocket
    tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                direct = rx.recv() => match direct {
                    Some(msg) => msg,
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(msg) => msg,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // 落后太多，直接补一份最新快照
                        warn!("连接落后 {} 条事件，重新同步快照", skipped);
                        match lag_handle.snapshot().await {
                            Some(snapshot) => ServerMessage::Snapshot(snapshot),
                            None => break,
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };
            let payload = match serde_json::to_string(&msg) {
                Ok(p) => p,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    info!("新的观察者已连接");
    send_snapshot(&handle, &tx).await;

    // 主循环，处理从客户端接收到的消息
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::GetSnapshot) => send_snapshot(&handle, &tx).await,
                Ok(client_msg) => {
                    if !handle.send(client_msg).await {
                        let _ = tx.send(ServerMessage::Error { message: "引擎已停止".to_string() }).await;
                        break;
                    }
                }
                Err(e) => {
                    warn!("解析消息失败: {}", e);
                    let _ = tx.send(ServerMessage::Error { message: format!("无法识别的消息: {}", e) }).await;
                }
            }
        }
    }

    info!("客户端连接关闭");
}

async fn send_snapshot(handle: &EngineHandle, tx: &mpsc::Sender<ServerMessage>) {
    if let Some(snapshot) = handle.snapshot().await {
        let _ = tx.send(ServerMessage::Snapshot(snapshot)).await;
    }
}
