//! 点对点聊天服务端
//!
//! 监听指定端口，每次接受一个对端并与其轮流发言；会话结束后继续等待下一个对端。

mod server;

use anyhow::Result;
use clap::Parser;
use protocol::RECOMMENDED_MIN_PORT;
use server::ChatServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 点对点聊天服务端
#[derive(Parser, Debug)]
#[command(name = "chatserve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 监听端口
    port: u16,

    /// 监听地址
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

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

    // 初始化日志
    let filter = if cli.verbose {
        EnvFilter::new("chat_server=debug,protocol=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let addr = format!("{}:{}", cli.host, cli.port);
    info!("Chat Server starting on {}", addr);

    let server = ChatServer::new();
    server.run(&addr).await?;

    Ok(())
}
