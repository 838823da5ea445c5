//! 点对点聊天客户端
//!
//! 连接到指定主机和端口，交换用户名后与对端轮流发言，直到任意一方发送 `\quit`。

mod client;

use anyhow::Result;
use clap::Parser;
use protocol::RECOMMENDED_MIN_PORT;
use tracing_subscriber::EnvFilter;

/// 点对点聊天客户端
#[derive(Parser, Debug)]
#[command(name = "chatclient")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 对端主机名或 IP
    host: String,

    /// 对端端口
    port: u16,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.port < RECOMMENDED_MIN_PORT {
        println!("警告: 建议使用 {} 以上的端口号", RECOMMENDED_MIN_PORT);
    }

    // 初始化日志，写到 stderr 以免打断聊天内容
    let filter = if cli.verbose {
        EnvFilter::new("chat_client=debug,protocol=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    client::run(&cli.host, cli.port).await
}
