//! 会话状态机
//!
//! `Connecting → Handshaking → Chatting → Closing → Closed`，状态只前进不回退。
//! 收发严格交替：发起方先发后收，响应方先收后发。

use tracing::{debug, info, warn};

use crate::actor::{LocalActor, SessionEnd, SessionEvent};
use crate::error::{ProtocolError, Result};
use crate::framer::{strip_line_terminator, Framer};
use crate::quit::is_quit;
use crate::transport::{TcpTransport, Transport, TransportConfig};
use crate::username::Username;
use crate::{ProtocolLimits, SEPARATOR};

/// 会话角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// 主动连接方：先发送用户名，聊天时先发言
    Initiator,
    /// 接受连接方：先接收用户名，聊天时先等待对端发言
    Responder,
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Handshaking,
    Chatting,
    Closing,
    Closed,
}

/// 点对点聊天会话，独占一个连接
pub struct Session<T> {
    transport: T,
    framer: Framer,
    limits: ProtocolLimits,
    role: Role,
    local: Username,
    peer: Option<String>,
    /// 握手时收到的对端用户名字节数，剥离前缀时使用
    peer_len: usize,
    state: SessionState,
}

impl Session<TcpTransport> {
    /// 连接对端并创建发起方会话
    pub async fn connect(
        host: &str,
        service: &str,
        config: &TransportConfig,
        limits: ProtocolLimits,
        local: Username,
    ) -> Result<Self> {
        debug!(state = ?SessionState::Connecting, host, service, "session state");
        let transport = TcpTransport::connect(host, service, config).await?;
        Ok(Self::new(transport, limits, Role::Initiator, local))
    }
}

impl<T: Transport> Session<T> {
    /// 基于已建立的连接创建会话，初始状态为 Handshaking
    pub fn new(transport: T, limits: ProtocolLimits, role: Role, local: Username) -> Self {
        Self {
            transport,
            framer: Framer::new(limits.max_message_len),
            limits,
            role,
            local,
            peer: None,
            peer_len: 0,
            state: SessionState::Handshaking,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 握手完成后可用
    pub fn peer_name(&self) -> Option<&str> {
        self.peer.as_deref()
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    /// 交换用户名，成功后进入 Chatting
    ///
    /// 用户名以原始字节发送，不成帧。
    pub async fn handshake(&mut self) -> Result<&str> {
        let bytes = match self.role {
            Role::Initiator => {
                self.send_name().await?;
                self.recv_name().await?
            }
            Role::Responder => {
                let bytes = self.recv_name().await?;
                self.send_name().await?;
                bytes
            }
        };

        // 文本只用于显示，非 UTF-8 字节替换后长度会变化
        self.peer_len = bytes.len();
        let peer = String::from_utf8_lossy(&bytes).into_owned();

        info!("Handshake complete: {} <-> {}", self.local, peer);
        self.transition(SessionState::Chatting);
        Ok(self.peer.insert(peer).as_str())
    }

    async fn send_name(&mut self) -> Result<()> {
        self.transport
            .send_all(self.local.as_bytes())
            .await
            .map_err(|e| ProtocolError::Handshake(Box::new(e)))?;
        Ok(())
    }

    async fn recv_name(&mut self) -> Result<Vec<u8>> {
        let bytes = self
            .transport
            .recv_chunk(self.limits.max_username_len)
            .await
            .map_err(|e| ProtocolError::Handshake(Box::new(e)))?;
        if bytes.is_empty() {
            return Err(ProtocolError::Handshake(Box::new(
                ProtocolError::ConnectionClosed,
            )));
        }
        Ok(bytes)
    }

    /// 运行会话直到结束，无论成功或失败都恰好关闭连接一次
    pub async fn run<A: LocalActor>(mut self, actor: &mut A) -> Result<SessionEnd> {
        let result = self.drive(actor).await;

        self.transition(SessionState::Closing);
        let peer = self.peer.take().unwrap_or_default();
        let state = self.state;
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close connection cleanly: {}", e);
        }
        debug!(from = ?state, to = ?SessionState::Closed, "session state");

        match result {
            Ok(reason) => {
                info!("Session with {} ended: {:?}", peer, reason);
                actor.notify(SessionEvent::Ended { peer, reason }).await?;
                Ok(reason)
            }
            Err(e) => {
                warn!("Session with {} failed: {}", peer, e);
                Err(e)
            }
        }
    }

    async fn drive<A: LocalActor>(&mut self, actor: &mut A) -> Result<SessionEnd> {
        if self.state == SessionState::Handshaking {
            self.handshake().await?;
        }
        let peer = self.peer.clone().unwrap_or_default();
        actor.notify(SessionEvent::Connected { peer }).await?;

        loop {
            let end = match self.role {
                Role::Initiator => match self.send_turn(actor).await? {
                    Some(end) => Some(end),
                    None => self.recv_turn(actor).await?,
                },
                Role::Responder => match self.recv_turn(actor).await? {
                    Some(end) => Some(end),
                    None => self.send_turn(actor).await?,
                },
            };
            if let Some(end) = end {
                return Ok(end);
            }
        }
    }

    /// 读取本地消息并发送，本地退出时返回结束原因
    async fn send_turn<A: LocalActor>(&mut self, actor: &mut A) -> Result<Option<SessionEnd>> {
        let prompt = format!("{}{}", self.local, SEPARATOR);
        let (body, framed) = loop {
            let Some(line) = actor.next_line(&prompt).await? else {
                return Ok(Some(SessionEnd::LocalInputClosed));
            };
            let body = strip_line_terminator(&line);
            match self.framer.frame(&self.local, body) {
                Ok(framed) => break (body.to_string(), framed),
                Err(ProtocolError::MessageTooLong { len, max }) => {
                    actor
                        .notify(SessionEvent::MessageRejected { len, max })
                        .await?;
                }
                Err(e) => return Err(e),
            }
        };

        self.transport
            .send_all(framed.as_bytes())
            .await
            .map_err(|e| match e {
                ProtocolError::Send { sent, expected, .. } => {
                    ProtocolError::PartialSend { sent, expected }
                }
                other => other,
            })?;

        // 退出指令也会先发给对端
        if is_quit(&body) {
            return Ok(Some(SessionEnd::LocalQuit));
        }
        Ok(None)
    }

    /// 接收对端消息并显示，对端退出或断开时返回结束原因
    async fn recv_turn<A: LocalActor>(&mut self, actor: &mut A) -> Result<Option<SessionEnd>> {
        let chunk = self
            .transport
            .recv_chunk(self.framer.max_message_len())
            .await?;
        if chunk.is_empty() {
            return Ok(Some(SessionEnd::PeerDisconnected));
        }

        let body = self.framer.unframe(&chunk, self.peer_len);
        if is_quit(&String::from_utf8_lossy(body)) {
            return Ok(Some(SessionEnd::PeerQuit));
        }

        let text = String::from_utf8_lossy(&chunk).into_owned();
        actor.notify(SessionEvent::Message { text }).await?;
        Ok(None)
    }
}
