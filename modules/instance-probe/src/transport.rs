//! Network seam for the prober: name resolution and HTTP GET.

use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::lookup_host;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("resolve failed: {0}")]
    Resolve(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("timed out")]
    Timeout,
}

#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// What a probe needs from the network. Each call is a single attempt.
pub trait Transport: Send + Sync + 'static {
    fn resolve(&self, host: &str) -> impl Future<Output = Result<Vec<IpAddr>, TransportError>> + Send;
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpReply, TransportError>> + Send;
}

#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub redirects: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        TransportOptions {
            timeout: Duration::from_secs(10),
            user_agent: format!("fedicheck/{}", fedicheck_core::version()),
            redirects: 10,
        }
    }
}

/// System resolver plus a shared reqwest client over rustls.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(opts: &TransportOptions) -> Result<Self, TransportError> {
        let client = Client::builder()
            .redirect(Policy::limited(opts.redirects))
            .timeout(opts.timeout)
            .user_agent(opts.user_agent.clone())
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(HttpTransport { client, timeout: opts.timeout })
    }
}

impl Transport for HttpTransport {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, TransportError> {
        let addrs = timeout(self.timeout, lookup_host((host, 0u16)))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::Resolve(e.to_string()))?;
        let ips: Vec<IpAddr> = addrs.map(|sa| sa.ip()).collect();
        if ips.is_empty() {
            return Err(TransportError::Resolve(format!("no addresses for {}", host)));
        }
        Ok(ips)
    }

    /// The body is only read for 2xx answers; other statuses come back as soon as
    /// the headers arrive, with an empty body.
    async fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
        let resp = self.client.get(url).send().await.map_err(from_reqwest)?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Ok(HttpReply { status, body: Vec::new() });
        }
        let body = resp.bytes().await.map_err(from_reqwest)?;
        Ok(HttpReply { status, body: body.to_vec() })
    }
}

fn from_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() { TransportError::Timeout } else { TransportError::Request(e.to_string()) }
}
