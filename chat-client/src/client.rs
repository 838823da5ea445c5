//! 聊天客户端核心流程

use anyhow::{Context, Result};
use protocol::{prompt_username, ProtocolLimits, Session, StdioActor, TransportConfig};
use tracing::info;

/// 提示用户名、连接对端并运行会话
pub async fn run(host: &str, port: u16) -> Result<()> {
    println!("欢迎使用 chatclient！");

    let limits = ProtocolLimits::default();
    let mut actor = StdioActor::new();
    let username = prompt_username(&mut actor, &limits)
        .await
        .context("无法读取用户名")?;

    let session = Session::connect(
        host,
        &port.to_string(),
        &TransportConfig::default(),
        limits,
        username,
    )
    .await?;

    let reason = session.run(&mut actor).await?;
    info!("Session finished: {:?}", reason);

    println!("chatclient 正在退出... 再见！");
    Ok(())
}
