//! 聊天服务端实现

use anyhow::{Context, Result};
use protocol::{
    prompt_username, LocalActor, ProtocolError, ProtocolLimits, Role, Session, SessionEnd,
    StdioActor, TcpListener, TransportListener, Username,
};
use tracing::{error, info, warn};

/// 聊天服务器，一次只服务一个对端
pub struct ChatServer {
    limits: ProtocolLimits,
}

impl ChatServer {
    pub fn new() -> Self {
        Self {
            limits: ProtocolLimits::default(),
        }
    }

    /// 运行服务器，直到收到 Ctrl+C
    pub async fn run(&self, addr: &str) -> Result<()> {
        println!("欢迎使用 chatserve！");
        let mut actor = StdioActor::new();
        let username = prompt_username(&mut actor, &self.limits)
            .await
            .context("无法读取用户名")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("无法监听 {}", addr))?;
        info!("Server listening on {}", listener.local_addr()?);
        println!("正在 {} 上等待连接...", listener.local_addr()?);

        tokio::select! {
            result = self.serve(&listener, &username, &mut actor) => result,

            // 监听 Ctrl+C 信号，未完成的会话随连接一起释放
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                println!("\nchatserve 正在退出... 再见！");
                Ok(())
            }
        }
    }

    /// 依次接受连接，每个连接运行一个响应方会话
    async fn serve<A: LocalActor>(
        &self,
        listener: &TcpListener,
        username: &Username,
        actor: &mut A,
    ) -> Result<()> {
        loop {
            let transport = match listener.accept().await {
                Ok(transport) => transport,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let session = Session::new(transport, self.limits, Role::Responder, username.clone());
            match session.run(actor).await {
                Ok(SessionEnd::LocalInputClosed) => {
                    info!("Local input closed, stop serving");
                    return Ok(());
                }
                Ok(reason) => info!("Session ended: {:?}", reason),
                // 对端出错只影响当前会话
                Err(e @ (ProtocolError::Handshake(_)
                | ProtocolError::PartialSend { .. }
                | ProtocolError::Recv(_))) => {
                    warn!("Session failed: {}", e);
                    eprintln!("错误: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
            println!("正在等待下一个连接...");
        }
    }
}

impl Default for ChatServer {
    fn default() -> Self {
        Self::new()
    }
}
