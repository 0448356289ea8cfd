use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use reqwest::redirect;

use super::types::{CheckOutcome, ProbeReport};

/// Probe trait for availability checks
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Perform one GET request against the URL and classify the result
    async fn probe(&self, url: &str) -> Result<ProbeReport>;
}

/// HTTP/HTTPS prober
///
/// Follows redirects and applies a connect timeout only; once connected,
/// the response may take as long as it takes. Expected network failures
/// become typed outcomes, anything else surfaces as an error for the
/// caller to drop.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(connect_timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_seconds))
            .redirect(redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str) -> Result<ProbeReport> {
        let timestamp = Utc::now();
        let start = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let outcome = classify_error(&e)?;
                return Ok(ProbeReport::unreachable(url.to_string(), timestamp, outcome));
            }
        };

        let latency = start.elapsed().as_millis() as u64;
        let status = response.status();

        // 2xx and 3xx count as reachable
        if status.is_success() || status.is_redirection() {
            Ok(ProbeReport::ok(url.to_string(), timestamp, status.as_u16(), latency))
        } else {
            Ok(ProbeReport::unavailable(url.to_string(), timestamp, status.as_u16()))
        }
    }
}

/// Map transport failures onto check outcomes.
///
/// A connect timeout satisfies both `is_timeout` and `is_connect`, so the
/// timeout check must come first. Connection-level failures (name
/// resolution, refused, unreachable) all land in `DnsError`.
fn classify_error(error: &reqwest::Error) -> Result<CheckOutcome> {
    if error.is_timeout() {
        return Ok(CheckOutcome::Timeout);
    }
    if error.is_connect() {
        return Ok(CheckOutcome::DnsError);
    }
    Err(anyhow::anyhow!("probe failed: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn spawn_http_server(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let body = "ok";
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_line,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn healthy_response_is_ok_with_latency() {
        let url = spawn_http_server("200 OK").await;
        let prober = HttpProber::new(5).unwrap();

        let report = prober.probe(&url).await.unwrap();

        assert_eq!(report.outcome, CheckOutcome::Ok);
        assert_eq!(report.status_code, Some(200));
        assert!(report.response_time_ms.is_some());
    }

    #[tokio::test]
    async fn error_response_is_unavailable_with_code() {
        let url = spawn_http_server("503 Service Unavailable").await;
        let prober = HttpProber::new(5).unwrap();

        let report = prober.probe(&url).await.unwrap();

        assert_eq!(report.outcome, CheckOutcome::Unavailable);
        assert_eq!(report.status_code, Some(503));
        assert_eq!(report.response_time_ms, None);
    }

    #[tokio::test]
    async fn unresolvable_host_is_dns_error() {
        let prober = HttpProber::new(5).unwrap();

        let report = prober.probe("http://nonexistent.invalid").await.unwrap();

        assert_eq!(report.outcome, CheckOutcome::DnsError);
        assert_eq!(report.status_code, None);
        assert_eq!(report.response_time_ms, None);
    }

    #[tokio::test]
    async fn refused_connection_is_dns_error() {
        // Bind then drop to get a local port with no listener behind it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = HttpProber::new(5).unwrap();
        let report = prober.probe(&format!("http://{}", addr)).await.unwrap();

        assert_eq!(report.outcome, CheckOutcome::DnsError);
    }
}
