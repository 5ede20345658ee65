use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::probe::http::truncate;
use crate::types::PortInfo;

/// The curated "quick" set: common service ports, not a sweep of all 65535.
pub const QUICK_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 135, 139, 143, 443, 993, 995, 1723, 3306, 3389, 5432, 5900, 8080,
    8443, 8888, 9000, 9090,
];

/// How many ports of one host are dialed at once.
const DIAL_CONCURRENCY: usize = 16;

const BANNER_DEADLINE: Duration = Duration::from_secs(2);
const BANNER_MAX_CHARS: usize = 200;

pub struct PortScanner {
    timeout: Duration,
}

impl PortScanner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Dial the quick port set against `ip`; closed or filtered ports are
    /// simply absent from the result. Output is sorted by port number.
    pub async fn quick_scan(&self, ip: IpAddr) -> Vec<PortInfo> {
        let mut open: Vec<PortInfo> = stream::iter(QUICK_PORTS.iter().copied())
            .map(|port| self.scan_port(ip, port))
            .buffer_unordered(DIAL_CONCURRENCY)
            .filter_map(|r| async move { r })
            .collect()
            .await;
        open.sort_by_key(|p| p.port);
        open
    }

    async fn scan_port(&self, ip: IpAddr, port: u16) -> Option<PortInfo> {
        let addr = SocketAddr::new(ip, port);
        let mut stream = match timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            _ => return None,
        };
        let banner = grab_banner(&mut stream).await;
        Some(PortInfo {
            port,
            protocol: "tcp".to_string(),
            service: service_name(port).to_string(),
            banner,
        })
    }
}

/// Best-effort read of whatever the service volunteers on connect. Many
/// services say nothing; a short deadline keeps the scan moving.
async fn grab_banner(stream: &mut TcpStream) -> Option<String> {
    let mut buf = [0u8; 1024];
    let n = match timeout(BANNER_DEADLINE, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => n,
        _ => return None,
    };
    let raw = String::from_utf8_lossy(&buf[..n]);
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(truncate(&collapsed, BANNER_MAX_CHARS))
    }
}

pub fn service_name(port: u16) -> &'static str {
    match port {
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "dns",
        80 => "http",
        110 => "pop3",
        111 => "rpcbind",
        135 => "msrpc",
        139 => "netbios-ssn",
        143 => "imap",
        443 => "https",
        993 => "imaps",
        995 => "pop3s",
        1723 => "pptp",
        3306 => "mysql",
        3389 => "rdp",
        5432 => "postgresql",
        5900 => "vnc",
        5984 => "couchdb",
        6379 => "redis",
        8080 => "http-proxy",
        8443 => "https-alt",
        8888 | 9000 | 9090 => "http-alt",
        9200 | 9300 => "elasticsearch",
        11211 => "memcached",
        27017 => "mongodb",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn quick_set_is_small_and_sorted() {
        assert!(QUICK_PORTS.len() < 30);
        let mut sorted = QUICK_PORTS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, QUICK_PORTS);
    }

    #[test]
    fn knows_common_services() {
        assert_eq!(service_name(22), "ssh");
        assert_eq!(service_name(443), "https");
        assert_eq!(service_name(3306), "mysql");
        assert_eq!(service_name(31337), "unknown");
    }

    #[tokio::test]
    async fn finds_open_port_and_grabs_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await;
            }
        });

        let scanner = PortScanner::new(Duration::from_secs(1));
        let info = scanner.scan_port(addr.ip(), addr.port()).await.unwrap();
        assert_eq!(info.port, addr.port());
        assert_eq!(info.protocol, "tcp");
        assert_eq!(info.banner.as_deref(), Some("SSH-2.0-OpenSSH_9.6"));
    }

    #[tokio::test]
    async fn closed_port_is_absent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let scanner = PortScanner::new(Duration::from_millis(500));
        assert!(scanner.scan_port(addr.ip(), addr.port()).await.is_none());
    }
}
