use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, retry};
use std::time::Duration;
use url::Url;

/// Dial timeout applied when the caller configures nothing else.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// Default keepalive probe period. Cluster members can die silently,
/// so probing aggressively surfaces dead peers at the socket layer
/// instead of hanging a later request.
pub const DEFAULT_KEEPALIVE_PERIOD: Duration = Duration::from_secs(1);

/// How every outbound connection is established: bounded dial phase,
/// optional keepalive probing on the resulting stream. Set once at
/// client construction and read on every dial after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPolicy {
    /// Upper bound on connection establishment per attempt.
    pub dial_timeout: Duration,
    /// Keepalive probe period, or `None` to leave probing off.
    pub keepalive: Option<Duration>,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            keepalive: Some(DEFAULT_KEEPALIVE_PERIOD),
        }
    }
}

/// Capability of transports whose connections can run keepalive
/// probes. A transport either has this or it doesn't; the client
/// checks for it whenever the connection policy asks for probing,
/// and refuses transports that come up empty.
pub trait KeepAliveConfigurable {
    /// Applies `period` probing to every connection this transport
    /// establishes from now on.
    fn enable_keepalive(&mut self, period: Duration) -> Result<(), TransportError>;
}

/// The wire seam for membership queries: one GET, fully read body.
///
/// Implementations own connection establishment under their bound
/// [`ConnectionPolicy`] and are reused across requests, so pooling
/// is theirs to provide. Any error from [`fetch`] is treated by the
/// sync loop as "this candidate is unusable right now".
///
/// [`fetch`]: Transport::fetch
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` and returns the complete response body.
    async fn fetch(&self, url: Url) -> Result<Bytes, TransportError>;

    /// Keepalive capability of this transport, when it has one.
    fn keepalive(&mut self) -> Option<&mut dyn KeepAliveConfigurable> {
        None
    }
}

/// Production transport over a pooled reqwest client.
///
/// The inner client is built eagerly so a broken TLS or resolver
/// setup fails at construction instead of on the first sync pass,
/// and then reused for every request.
pub struct HttpTransport {
    policy: ConnectionPolicy,
    client: Client,
}

impl HttpTransport {
    /// Builds a transport honoring `policy`'s dial timeout. Keepalive
    /// is left off here; the client enables it through the
    /// [`KeepAliveConfigurable`] capability when the policy asks.
    pub fn new(policy: &ConnectionPolicy) -> Result<HttpTransport, TransportError> {
        let base = ConnectionPolicy {
            dial_timeout: policy.dial_timeout,
            keepalive: None,
        };

        Ok(HttpTransport {
            client: Self::build_client(&base)?,
            policy: base,
        })
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    fn build_client(policy: &ConnectionPolicy) -> Result<Client, TransportError> {
        reqwest::ClientBuilder::new()
            .user_agent("eureka-client")
            .connect_timeout(policy.dial_timeout)
            .tcp_keepalive(policy.keepalive)
            .tcp_nodelay(true)
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .retry(retry::never())
            .hickory_dns(true)
            .build()
            .map_err(|e| TransportError::init(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: Url) -> Result<Bytes, TransportError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::DialTimeout {
                    timeout: self.policy.dial_timeout,
                }
            } else {
                TransportError::connect(e.to_string())
            }
        })?;

        // Status codes are deliberately not inspected: the registry
        // contract is "any fully read body is a membership payload".
        response
            .bytes()
            .await
            .map_err(|e| TransportError::read(e.to_string()))
    }

    fn keepalive(&mut self) -> Option<&mut dyn KeepAliveConfigurable> {
        Some(self)
    }
}

impl KeepAliveConfigurable for HttpTransport {
    fn enable_keepalive(&mut self, period: Duration) -> Result<(), TransportError> {
        // reqwest applies socket options at dial time, so rebuilding
        // the pooled client covers every subsequent connection.
        self.policy.keepalive = Some(period);
        self.client = Self::build_client(&self.policy)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a canned 200 response with `body` to every connection
    /// and returns the base url to reach it.
    async fn canned_server(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let mut request = Vec::new();

                    loop {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                request.extend_from_slice(&buf[..n]);
                                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                    break;
                                }
                            }
                        }
                    }

                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_default_policy_matches_registry_expectations() {
        let policy = ConnectionPolicy::default();

        assert_eq!(policy.dial_timeout, Duration::from_secs(1));
        assert_eq!(policy.keepalive, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_new_transport_defers_keepalive_to_capability() {
        let transport = HttpTransport::new(&ConnectionPolicy::default()).unwrap();

        assert_eq!(transport.policy().keepalive, None);
        assert_eq!(transport.policy().dial_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_fetch_returns_full_body() {
        let base = canned_server("10.0.0.5:8080, 10.0.0.6:8080").await;
        let transport = HttpTransport::new(&ConnectionPolicy::default()).unwrap();

        let url = Url::parse(&format!("{}/machines", base)).unwrap();
        let body = transport.fetch(url).await.unwrap();

        assert_eq!(&body[..], b"10.0.0.5:8080, 10.0.0.6:8080");
    }

    #[tokio::test]
    async fn test_fetch_refused_connection_is_a_connect_error() {
        // Bind then drop to get a port with nothing listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&ConnectionPolicy::default()).unwrap();
        let url = Url::parse(&format!("http://{}/machines", addr)).unwrap();

        let err = transport.fetch(url).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_enable_keepalive_rebuilds_a_working_client() {
        let base = canned_server("10.0.0.5:8080").await;
        let mut transport = HttpTransport::new(&ConnectionPolicy::default()).unwrap();

        transport
            .enable_keepalive(Duration::from_millis(500))
            .unwrap();
        assert_eq!(
            transport.policy().keepalive,
            Some(Duration::from_millis(500))
        );

        let url = Url::parse(&format!("{}/machines", base)).unwrap();
        let body = transport.fetch(url).await.unwrap();
        assert_eq!(&body[..], b"10.0.0.5:8080");
    }

    #[test]
    fn test_http_transport_advertises_keepalive_capability() {
        let mut transport = HttpTransport::new(&ConnectionPolicy::default()).unwrap();

        assert!(transport.keepalive().is_some());
    }
}
