//! 退出指令识别
//!
//! 消息体去掉前导空格和制表符后，以 `\` 开头且紧跟 `quit`（不区分大小写）即为退出指令，
//! 之后的内容忽略。只作用于去掉用户名前缀后的消息体。

const QUIT_COMMAND: &[u8] = b"quit";

/// 判断消息体是否为退出指令
pub fn is_quit(body: &str) -> bool {
    let rest = body.trim_start_matches([' ', '\t']).as_bytes();
    match rest.split_first() {
        Some((b'\\', tail)) => tail
            .get(..QUIT_COMMAND.len())
            .is_some_and(|word| word.eq_ignore_ascii_case(QUIT_COMMAND)),
        _ => false,
    }
}
