//! 协议常量定义
//!
//! 这些值只作为默认配置使用，运行时通过 [`ProtocolLimits`] 显式传入各组件。

/// 单条消息（含用户名前缀）最大字节数
pub const MAX_MESSAGE_LEN: usize = 500;

/// 用户名最大长度
pub const MAX_USERNAME_LEN: usize = 10;

/// 用户名与消息体之间的分隔符
pub const SEPARATOR: &str = "> ";

/// 推荐使用的最小端口号，低于该值只给出提示
pub const RECOMMENDED_MIN_PORT: u16 = 50000;

/// 协议长度限制
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolLimits {
    /// 成帧后消息的最大字节数，也是接收缓冲区大小
    pub max_message_len: usize,
    /// 用户名最大长度，也是握手时接收对端用户名的上限
    pub max_username_len: usize,
}

impl Default for ProtocolLimits {
    fn default() -> Self {
        Self {
            max_message_len: MAX_MESSAGE_LEN,
            max_username_len: MAX_USERNAME_LEN,
        }
    }
}
