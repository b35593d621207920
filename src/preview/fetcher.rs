use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::redirect::Policy;
use reqwest::Client as ReqwestClient;
use thiserror::Error;
use url::{Host, Url};

/// Desktop browser UA. Some sites serve stripped-down markup to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("server returned HTTP {0}")]
    Http(u16),

    #[error("blocked by fetch policy: {0}")]
    Blocked(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        // A redirect refused by the private-host policy carries our own error.
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            if let Some(blocked) = inner.downcast_ref::<FetchError>() {
                return blocked.clone();
            }
            source = inner.source();
        }

        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Http(status.as_u16())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Response headers plus a body that is only read when asked for.
pub struct FetchResult {
    headers: HashMap<String, String>,
    body: BoxFuture<'static, Result<String, FetchError>>,
}

impl FetchResult {
    /// Header names are matched case-insensitively.
    pub fn new<I, K, V, F>(headers: I, body: F) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
        F: Future<Output = Result<String, FetchError>> + Send + 'static,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        Self {
            headers,
            body: body.boxed(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Read the body as text. Consumes the result; nothing is read before this.
    pub async fn text(self) -> Result<String, FetchError> {
        self.body.await
    }
}

impl std::fmt::Debug for FetchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResult")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Issues the single GET an extraction is allowed to make.
///
/// Implementations must report non-2xx statuses as [`FetchError::Http`].
/// The caller enforces the timeout as a hard deadline regardless, so an
/// implementation that overruns it is cut off.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResult, FetchError>;
}

const MAX_REDIRECTS: usize = 10;

fn is_private_v4(v4: Ipv4Addr) -> bool {
    let o = v4.octets();
    matches!(
        o,
        [127, ..] | [10, ..] | [169, 254, ..] | [192, 168, ..] | [0, ..] | [255, 255, 255, 255]
    ) || (o[0] == 172 && (16..=31).contains(&o[1]))
}

/// Returns `true` if `ip` is a private, loopback, or link-local address.
/// IPv4-mapped IPv6 addresses are judged by their IPv4 part.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_v4(v4);
            }
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00 == 0xfc00)
                || (v6.segments()[0] & 0xffc0 == 0xfe80)
        }
    }
}

fn check_scheme(url: &Url) -> Result<(), FetchError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::Blocked(format!("unsupported scheme {other}"))),
    }
}

fn check_addrs<I>(host: &str, addrs: I) -> Result<(), FetchError>
where
    I: IntoIterator<Item = SocketAddr>,
{
    for addr in addrs {
        if is_private_ip(addr.ip()) {
            return Err(FetchError::Blocked(format!(
                "{host} resolves to a private or reserved address"
            )));
        }
    }
    Ok(())
}

/// Literal IP hosts are decided without DNS. Returns `false` when the host is
/// a name that still needs resolving.
fn check_literal_host(url: &Url) -> Result<bool, FetchError> {
    let ip = match url.host() {
        Some(Host::Ipv4(v4)) => IpAddr::V4(v4),
        Some(Host::Ipv6(v6)) => IpAddr::V6(v6),
        Some(Host::Domain(_)) => return Ok(false),
        None => return Err(FetchError::Network("URL has no host".into())),
    };
    if is_private_ip(ip) {
        return Err(FetchError::Blocked(format!("{ip} is a private address")));
    }
    Ok(true)
}

/// Private-host check for a redirect target. Runs inside reqwest's redirect
/// policy, which is synchronous, so names are resolved with blocking DNS.
fn check_redirect_target(url: &Url) -> Result<(), FetchError> {
    check_scheme(url)?;
    if check_literal_host(url)? {
        return Ok(());
    }
    let host = url.host_str().unwrap_or_default();
    let port = url.port_or_known_default().unwrap_or(80);
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| FetchError::Network(format!("could not resolve {host}: {e}")))?;
    check_addrs(host, addrs)
}

fn build_client(user_agent: &str, block_private_hosts: bool) -> Result<ReqwestClient, FetchError> {
    let mut builder = ReqwestClient::builder().user_agent(user_agent);

    if block_private_hosts {
        builder = builder.redirect(Policy::custom(|attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                return attempt.error("too many redirects");
            }
            match check_redirect_target(attempt.url()) {
                Ok(()) => attempt.follow(),
                Err(e) => {
                    tracing::warn!(url = %attempt.url(), error = %e, "Refusing redirect");
                    attempt.error(e)
                }
            }
        }));
    }

    builder
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))
}

/// [`Fetcher`] backed by a shared reqwest client.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: ReqwestClient,
    block_private_hosts: bool,
}

impl ReqwestFetcher {
    /// With `block_private_hosts`, hosts that resolve to loopback, private or
    /// link-local addresses are refused, both for the link itself and for
    /// every redirect hop.
    pub fn new(user_agent: &str, block_private_hosts: bool) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(user_agent, block_private_hosts)?,
            block_private_hosts,
        })
    }

    async fn check_host(&self, url: &str) -> Result<(), FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Network(e.to_string()))?;
        check_scheme(&parsed)?;

        if !self.block_private_hosts || check_literal_host(&parsed)? {
            return Ok(());
        }

        let host = parsed.host_str().unwrap_or_default();
        let port = parsed.port_or_known_default().unwrap_or(80);
        let addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| FetchError::Network(format!("could not resolve {host}: {e}")))?;
        check_addrs(host, addrs)
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResult, FetchError> {
        self.check_host(url).await?;

        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        Ok(FetchResult::new(headers, async move {
            response.text().await.map_err(FetchError::from)
        }))
    }
}
