//! 点对点聊天共享协议库
//!
//! 包含:
//! - 用户名校验 (Username)
//! - 消息成帧 (Framer)
//! - 退出指令识别 (is_quit)
//! - 传输层抽象 (Transport trait)
//! - 本地交互端 (LocalActor)
//! - 会话状态机 (Session)

mod actor;
mod constants;
mod error;
mod framer;
mod quit;
mod session;
mod transport;
mod username;

pub use actor::{prompt_username, LocalActor, SessionEnd, SessionEvent, StdioActor};
pub use constants::*;
pub use error::{ProtocolError, Result};
pub use framer::{strip_line_terminator, FramedMessage, Framer};
pub use quit::is_quit;
pub use session::{Role, Session, SessionState};
pub use transport::{
    StreamTransport, TcpListener, TcpTransport, Transport, TransportConfig, TransportListener,
};
pub use username::{Username, UsernameError};
