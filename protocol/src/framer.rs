//! 消息成帧
//!
//! 帧格式:
//! ```text
//! ┌──────────────┬──────────┬─────────────────────┐
//! │ Username     │  "> "    │  Body               │
//! │ 1-10 字节    │  2 字节  │  剩余字节            │
//! └──────────────┴──────────┴─────────────────────┘
//! ```
//!
//! 没有长度前缀也没有结束符，消息边界完全依赖一次 send/recv 调用的边界。

use crate::error::{ProtocolError, Result};
use crate::username::Username;
use crate::SEPARATOR;

/// 成帧后的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage(Vec<u8>);

impl FramedMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 消息成帧器
#[derive(Debug, Clone, Copy)]
pub struct Framer {
    max_message_len: usize,
}

impl Framer {
    pub fn new(max_message_len: usize) -> Self {
        Self { max_message_len }
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// 构造 `username> body`，超过上限时返回 [`ProtocolError::MessageTooLong`]
    pub fn frame(&self, username: &Username, body: &str) -> Result<FramedMessage> {
        let len = username.len() + SEPARATOR.len() + body.len();
        if len > self.max_message_len {
            return Err(ProtocolError::MessageTooLong {
                len,
                max: self.max_message_len,
            });
        }

        let mut bytes = Vec::with_capacity(len);
        bytes.extend_from_slice(username.as_bytes());
        bytes.extend_from_slice(SEPARATOR.as_bytes());
        bytes.extend_from_slice(body.as_bytes());
        Ok(FramedMessage(bytes))
    }

    /// 按握手得到的对端用户名长度剥离前缀
    ///
    /// 只按位置截取，不查找分隔符；数据比前缀短时返回空切片。
    pub fn unframe<'a>(&self, framed: &'a [u8], peer_name_len: usize) -> &'a [u8] {
        framed.get(peer_name_len + SEPARATOR.len()..).unwrap_or(&[])
    }
}

/// 去掉行尾的一个换行符（`\n` 或 `\r\n`）
pub fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
