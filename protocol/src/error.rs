//! 错误类型定义

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 地址解析失败
    #[error("could not get address info for host: {host} port: {service} ({reason})")]
    Resolution {
        host: String,
        service: String,
        reason: String,
    },

    /// 所有候选地址均连接失败
    #[error("failed to connect to host: {host} on port: {service} ({attempts} candidates tried)")]
    Connect {
        host: String,
        service: String,
        attempts: usize,
    },

    /// 握手失败
    #[error("could not handshake with peer: {0}")]
    Handshake(#[source] Box<ProtocolError>),

    /// 底层发送失败，携带已发送的字节数
    #[error("send failed after {sent} of {expected} bytes: {source}")]
    Send {
        sent: usize,
        expected: usize,
        #[source]
        source: std::io::Error,
    },

    /// 消息未能完整发送
    #[error("only {sent} of {expected} bytes were sent to peer")]
    PartialSend { sent: usize, expected: usize },

    /// 接收失败
    #[error("unable to receive message from peer: {0}")]
    Recv(#[source] std::io::Error),

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 消息过长
    #[error("Message too long: {len} bytes (max: {max})")]
    MessageTooLong { len: usize, max: usize },
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
