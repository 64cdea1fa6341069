use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use pig_dice_core::{ClientMessage, Mode, ServerMessage, Side, Snapshot};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let raw_url = std::env::var("PIG_SERVER_URL").unwrap_or_else(|_| "ws://127.0.0.1:25917/ws".to_string());
    let url = Url::parse(&raw_url)?;

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerMessage>(text.as_str()) {
                        Ok(server_msg) => {
                            print_server_message(&server_msg);
                            print!("> "); // 重新显示输入提示符
                            let _ = std::io::stdout().flush();
                        }
                        Err(e) => eprintln!("解析服务器消息失败: {}", e),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- Pig 骰子客户端 ---");
    println!("可用命令:");
    println!("  solo                      - 单人模式 (对电脑)，重新开局");
    println!("  duel                      - 双人模式，重新开局");
    println!("  roll                      - 掷骰");
    println!("  hold                      - 存分");
    println!("  replay                    - 再来一局");
    println!("  name <1|2> [名字]          - 设置名字，留空恢复默认");
    println!("  state                     - 查看当前状态");
    println!("  clear                     - 清空记分板");
    println!("  exit                      - 退出");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else { break; };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts.first().copied();

        let client_msg = match command {
            Some("solo") => ClientMessage::SetMode(Mode::Solo),
            Some("duel") => ClientMessage::SetMode(Mode::Duel),
            Some("roll") => ClientMessage::Roll,
            Some("hold") => ClientMessage::Hold,
            Some("replay") => ClientMessage::Replay,
            Some("state") => ClientMessage::GetSnapshot,
            Some("clear") => ClientMessage::ResetScoreboard,
            Some("name") => {
                let side = match parts.get(1).copied() {
                    Some("1") => Side::First,
                    Some("2") => Side::Second,
                    _ => {
                        println!("用法: name <1|2> [名字]");
                        continue;
                    }
                };
                let name = parts[2..].join(" ");
                ClientMessage::SetName { side, name }
            }
            Some("exit") => {
                println!("正在断开连接...");
                break;
            }
            None => continue,
            _ => {
                println!("未知命令: {}", line);
                continue;
            }
        };

        let payload = serde_json::to_string(&client_msg)?;
        write.send(Message::Text(payload.into())).await?;
    }

    Ok(())
}

/// 把服务器消息打印成一行简短的文字
fn print_server_message(msg: &ServerMessage) {
    match msg {
        ServerMessage::Snapshot(snapshot) => print_snapshot(snapshot),
        ServerMessage::MatchStarted { mode } => println!("\n新的一局开始 ({:?})", mode),
        ServerMessage::Rolled { side, value, turn_total } => println!("\n{} 掷出 {}，本回合累计 {}", side, value, turn_total),
        ServerMessage::PiggedOut { side } => println!("\n{} 掷出 1，本回合作废", side),
        ServerMessage::Held { side, banked, total } => println!("\n{} 存入 {}，总分 {}", side, banked, total),
        ServerMessage::TurnPassed { to } => println!("\n轮到 {}", to),
        ServerMessage::GameOver { winner } => println!("\n游戏结束，{} 获胜!", winner),
        ServerMessage::ScoreboardUpdated(_) => {}
        ServerMessage::OpponentStarted => println!("\n电脑开始行动..."),
        ServerMessage::OpponentFinished => println!("\n电脑行动结束"),
        ServerMessage::NameUpdated { side, name } => println!("\n{} 现在叫 {}", side, name),
        ServerMessage::Info { message } => println!("\n[提示] {}", message),
        ServerMessage::Error { message } => println!("\n[错误] {}", message),
    }
}

fn print_snapshot(s: &Snapshot) {
    let [first, second] = &s.names;
    let turn = match s.state.current_side {
        Side::First => first,
        Side::Second => second,
    };
    println!(
        "\n[{:?}] {} {} : {} {} | 当前 {} 累计 {} | 战绩 {}胜{}负 / {}胜{}负",
        s.mode,
        first,
        s.state.score_first,
        s.state.score_second,
        second,
        turn,
        s.state.turn_accumulator,
        s.scoreboard.wins_first,
        s.scoreboard.losses_first,
        s.scoreboard.wins_second,
        s.scoreboard.losses_second,
    );
}
