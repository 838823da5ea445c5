//! 本地交互端
//!
//! 会话只依赖"读取一行"和"显示事件"两种能力，终端格式化由具体实现负责。

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::error::Result;
use crate::framer::strip_line_terminator;
use crate::username::{Username, UsernameError};
use crate::ProtocolLimits;

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// 本地发送了退出指令
    LocalQuit,
    /// 对端发送了退出指令
    PeerQuit,
    /// 对端关闭了连接
    PeerDisconnected,
    /// 本地输入已结束
    LocalInputClosed,
}

/// 会话发送给本地交互端的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// 输入的用户名不合法，需要重新输入
    UsernameRejected { reason: UsernameError },
    /// 握手完成
    Connected { peer: String },
    /// 收到对端消息（完整帧文本）
    Message { text: String },
    /// 本地消息过长，未发送
    MessageRejected { len: usize, max: usize },
    /// 会话结束
    Ended { peer: String, reason: SessionEnd },
}

/// 本地交互端
pub trait LocalActor: Send {
    /// 显示提示并读取一行，输入结束时返回 None
    fn next_line(
        &mut self,
        prompt: &str,
    ) -> impl std::future::Future<Output = io::Result<Option<String>>> + Send;

    /// 显示一个会话事件
    fn notify(
        &mut self,
        event: SessionEvent,
    ) -> impl std::future::Future<Output = io::Result<()>> + Send;
}

/// 反复提示直到输入合法的用户名
pub async fn prompt_username<A: LocalActor>(
    actor: &mut A,
    limits: &ProtocolLimits,
) -> Result<Username> {
    let prompt = format!(
        "请输入一个由字母组成的用户名，最多 {} 个字符\n",
        limits.max_username_len
    );
    loop {
        let Some(line) = actor.next_line(&prompt).await? else {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        };
        match Username::with_max_len(strip_line_terminator(&line), limits.max_username_len) {
            Ok(name) => return Ok(name),
            Err(reason) => actor.notify(SessionEvent::UsernameRejected { reason }).await?,
        }
    }
}

/// 基于标准输入输出的交互端
pub struct StdioActor {
    stdin: BufReader<Stdin>,
    stdout: Stdout,
}

impl StdioActor {
    pub fn new() -> Self {
        Self {
            stdin: BufReader::new(tokio::io::stdin()),
            stdout: tokio::io::stdout(),
        }
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.stdout.write_all(line.as_bytes()).await?;
        self.stdout.write_all(b"\n").await?;
        self.stdout.flush().await
    }
}

impl Default for StdioActor {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalActor for StdioActor {
    async fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.stdout.write_all(prompt.as_bytes()).await?;
        self.stdout.flush().await?;

        let mut line = String::new();
        if self.stdin.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    async fn notify(&mut self, event: SessionEvent) -> io::Result<()> {
        let line = match event {
            SessionEvent::UsernameRejected { reason } => match reason {
                UsernameError::NotAlphabetic => "用户名格式无效: 只能包含字母".to_string(),
                UsernameError::Empty { max } | UsernameError::TooLong { max, .. } => {
                    format!("用户名格式无效: 长度必须在 1 到 {} 个字符之间", max)
                }
            },
            SessionEvent::Connected { peer } => format!("正在与 {} 聊天，打个招呼吧！", peer),
            SessionEvent::Message { text } => text,
            SessionEvent::MessageRejected { len, max } => {
                format!("消息过长 ({} 字节，上限 {} 字节)，未发送", len, max)
            }
            SessionEvent::Ended { peer, reason } => match reason {
                SessionEnd::LocalQuit => "你已离开聊天。".to_string(),
                SessionEnd::PeerQuit => format!("{} 结束了聊天。", peer),
                SessionEnd::PeerDisconnected => format!("{} 已断开连接。", peer),
                SessionEnd::LocalInputClosed => "输入已结束，离开聊天。".to_string(),
            },
        };
        self.write_line(&line).await
    }
}
