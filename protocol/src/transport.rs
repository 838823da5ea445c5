//! 传输层抽象
//!
//! 提供 Transport trait 使会话层与具体传输实现解耦。
//! 字节流的单次读写可能只完成一部分，发送端在这里循环补齐，
//! 接收端每次只发起一次读取。

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::error::{ProtocolError, Result};

/// 传输层配置
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// 单个候选地址的连接超时，默认不设超时
    pub connect_timeout: Option<Duration>,
    /// 是否禁用 Nagle 算法（TCP nodelay）
    pub nodelay: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            nodelay: true, // 每条消息单独一次写入，尽量让对端一次读到
        }
    }
}

/// 传输层抽象 trait
///
/// 连接由会话独占，`close` 消耗 self，关闭后无法再次使用。
pub trait Transport: Send + Sized {
    /// 发送全部字节，返回实际发送的字节数
    ///
    /// 失败时返回 [`ProtocolError::Send`]，其中带有失败前已发送的字节数。
    fn send_all(
        &mut self,
        bytes: &[u8],
    ) -> impl std::future::Future<Output = Result<usize>> + Send;

    /// 发起一次读取，最多 `max_bytes` 字节
    ///
    /// 返回空 Vec 表示对端已正常关闭连接。
    fn recv_chunk(
        &mut self,
        max_bytes: usize,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// 关闭连接
    fn close(self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 传输层监听器抽象 trait（服务端使用）
pub trait TransportListener: Send + Sync + Sized {
    /// 对应的传输类型
    type Transport: Transport;

    /// 绑定地址并开始监听
    ///
    /// # Arguments
    /// * `addr` - 监听地址，格式为 "host:port"
    fn bind(addr: &str) -> impl std::future::Future<Output = Result<Self>> + Send;

    /// 接受新连接
    fn accept(&self) -> impl std::future::Future<Output = Result<Self::Transport>> + Send;
}

/// 基于任意字节流的传输实现
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_all(&mut self, bytes: &[u8]) -> Result<usize> {
        let expected = bytes.len();
        let mut sent = 0;

        while sent < expected {
            match self.stream.write(&bytes[sent..]).await {
                Ok(0) => {
                    return Err(ProtocolError::Send {
                        sent,
                        expected,
                        source: io::ErrorKind::WriteZero.into(),
                    });
                }
                Ok(n) => {
                    sent += n;
                    trace!(n, sent, expected, "write");
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(ProtocolError::Send {
                        sent,
                        expected,
                        source,
                    });
                }
            }
        }

        self.stream
            .flush()
            .await
            .map_err(|source| ProtocolError::Send {
                sent,
                expected,
                source,
            })?;

        Ok(sent)
    }

    async fn recv_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; max_bytes];
        let n = loop {
            match self.stream.read(&mut buffer).await {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProtocolError::Recv(e)),
            }
        };
        buffer.truncate(n);
        trace!(n, max_bytes, "read");
        Ok(buffer)
    }

    async fn close(mut self) -> Result<()> {
        // stream 在此处被 drop，底层句柄随之释放
        self.stream.shutdown().await?;
        Ok(())
    }
}

// ============================================================================
// TCP 实现
// ============================================================================

/// TCP 传输实现
pub type TcpTransport = StreamTransport<TcpStream>;

impl StreamTransport<TcpStream> {
    /// 解析 host/service 并依次尝试每个候选地址，返回第一个连接成功的
    ///
    /// # Arguments
    /// * `host` - 主机名或 IP
    /// * `service` - 数字端口
    /// * `config` - 传输配置
    pub async fn connect(host: &str, service: &str, config: &TransportConfig) -> Result<Self> {
        let resolution_error = |reason: String| ProtocolError::Resolution {
            host: host.to_string(),
            service: service.to_string(),
            reason,
        };

        let port: u16 = service
            .parse()
            .map_err(|_| resolution_error("service must be a numeric port".to_string()))?;
        let candidates: Vec<SocketAddr> = lookup_host((host, port))
            .await
            .map_err(|e| resolution_error(e.to_string()))?
            .collect();
        if candidates.is_empty() {
            return Err(resolution_error("no addresses found".to_string()));
        }

        for addr in &candidates {
            match Self::connect_one(*addr, config).await {
                Ok(stream) => {
                    stream.set_nodelay(config.nodelay)?;
                    info!("Connected to {}", addr);
                    return Ok(Self::new(stream));
                }
                // 失败的 socket 已随 future 一起释放
                Err(e) => debug!("Candidate {} failed: {}", addr, e),
            }
        }

        Err(ProtocolError::Connect {
            host: host.to_string(),
            service: service.to_string(),
            attempts: candidates.len(),
        })
    }

    async fn connect_one(addr: SocketAddr, config: &TransportConfig) -> io::Result<TcpStream> {
        match config.connect_timeout {
            Some(limit) => timeout(limit, TcpStream::connect(addr))
                .await
                .map_err(|_| io::Error::from(io::ErrorKind::TimedOut))?,
            None => TcpStream::connect(addr).await,
        }
    }

    /// 从已有的 TcpStream 创建（服务端 accept 后使用）
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    /// 对端地址
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }
}

/// TCP 监听器实现
pub struct TcpListener {
    listener: tokio::net::TcpListener,
}

impl TransportListener for TcpListener {
    type Transport = TcpTransport;

    async fn bind(addr: &str) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ProtocolError::Io)?;
        Ok(Self { listener })
    }

    async fn accept(&self) -> Result<TcpTransport> {
        let (stream, addr) = self.listener.accept().await.map_err(ProtocolError::Io)?;
        info!("Accepted connection from {}", addr);
        TcpTransport::from_stream(stream)
    }
}

impl TcpListener {
    /// 获取本地绑定地址
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// 每次写入最多接受 `per_call` 字节的测试流
    #[derive(Default)]
    struct Trickle {
        written: Vec<u8>,
        per_call: usize,
        calls: usize,
        /// 写满该字节数后返回错误
        fail_after: Option<usize>,
    }

    impl AsyncWrite for Trickle {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.calls += 1;
            let mut n = buf.len().min(self.per_call);
            if let Some(limit) = self.fail_after {
                let room = limit.saturating_sub(self.written.len());
                if room == 0 {
                    return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
                }
                n = n.min(room);
            }
            self.written.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncRead for Trickle {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_send_all_loops_over_partial_writes() {
        let mut transport = StreamTransport::new(Trickle {
            per_call: 7,
            ..Default::default()
        });
        let payload = vec![b'x'; 500];

        let sent = transport.send_all(&payload).await.unwrap();

        assert_eq!(sent, 500);
        assert_eq!(transport.get_ref().written, payload);
        assert_eq!(transport.get_ref().calls, 72); // ceil(500 / 7)
    }

    #[tokio::test]
    async fn test_send_all_reports_partial_count_on_failure() {
        let mut transport = StreamTransport::new(Trickle {
            per_call: 4,
            fail_after: Some(10),
            ..Default::default()
        });

        match transport.send_all(b"alice> hello").await {
            Err(ProtocolError::Send { sent, expected, .. }) => {
                assert_eq!(sent, 10);
                assert_eq!(expected, 12);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_all_write_zero_is_error() {
        let mut transport = StreamTransport::new(Trickle {
            per_call: 0,
            ..Default::default()
        });

        assert!(matches!(
            transport.send_all(b"abc").await,
            Err(ProtocolError::Send { sent: 0, expected: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_recv_chunk_is_single_read_and_capped() {
        let (a, mut b) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(a);

        b.write_all(b"bob> hi there").await.unwrap();

        assert_eq!(transport.recv_chunk(3).await.unwrap(), b"bob");
        assert_eq!(transport.recv_chunk(500).await.unwrap(), b"> hi there");
    }

    #[tokio::test]
    async fn test_recv_chunk_empty_on_peer_shutdown() {
        let (a, b) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(a);
        StreamTransport::new(b).close().await.unwrap();

        assert!(transport.recv_chunk(500).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_all_over_small_duplex() {
        // duplex 缓冲只有 4 字节，写入必然被拆分
        let (a, b) = tokio::io::duplex(4);
        let mut sender = StreamTransport::new(a);
        let mut receiver = StreamTransport::new(b);
        let payload: Vec<u8> = (0..=255u8).cycle().take(500).collect();

        let reader = tokio::spawn(async move {
            let mut received = Vec::new();
            loop {
                let chunk = receiver.recv_chunk(500).await.unwrap();
                if chunk.is_empty() {
                    break received;
                }
                received.extend(chunk);
            }
        });

        assert_eq!(sender.send_all(&payload).await.unwrap(), 500);
        sender.close().await.unwrap();
        assert_eq!(reader.await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_tcp_listener_bind() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_tcp_connect_and_accept() {
        // 启动监听
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();

        // 客户端连接
        let client_handle = tokio::spawn(async move {
            let config = TransportConfig::default();
            TcpTransport::connect("127.0.0.1", &port, &config).await
        });

        // 服务端接受
        let mut server_transport = listener.accept().await.unwrap();
        let mut client_transport = client_handle.await.unwrap().unwrap();

        client_transport.send_all(b"alice").await.unwrap();
        assert_eq!(server_transport.recv_chunk(10).await.unwrap(), b"alice");
        assert_eq!(
            client_transport.peer_addr().unwrap(),
            listener.local_addr().unwrap()
        );
    }

    #[tokio::test]
    async fn test_connect_timeout_gives_up_on_candidate() {
        // 不可路由地址：要么超时，要么立即不可达，都不应一直等待
        let config = TransportConfig {
            connect_timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        };

        let result = timeout(
            Duration::from_secs(5),
            TcpTransport::connect("10.255.255.1", "9", &config),
        )
        .await
        .expect("connect_timeout was not applied");

        match result {
            Err(ProtocolError::Connect { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_named_service() {
        let result = TcpTransport::connect("127.0.0.1", "http", &TransportConfig::default()).await;
        assert!(matches!(result, Err(ProtocolError::Resolution { .. })));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // 先绑定再释放，得到一个大概率无人监听的端口
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let result =
            TcpTransport::connect("127.0.0.1", &port.to_string(), &TransportConfig::default())
                .await;
        match result {
            Err(ProtocolError::Connect { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
