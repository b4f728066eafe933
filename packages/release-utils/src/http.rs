use bytes::{Bytes, BytesMut};
use http_body_util::{BodyExt, Empty};
use hyper::{header, StatusCode, Uri};
#[cfg(not(feature = "rustls-platform-verifier"))]
use hyper_rustls::ConfigBuilderExt;
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use once_cell::sync::Lazy;
use rustls::ClientConfig;
#[cfg(feature = "rustls-platform-verifier")]
use rustls_platform_verifier::BuilderVerifierExt;
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// Redirects followed before giving up. GitHub release assets answer with
/// one hop to their object storage.
const MAX_REDIRECTS: usize = 5;

pub const DEFAULT_USER_AGENT: &str = concat!("release-channels/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid url `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: hyper::http::uri::InvalidUri,
    },
    #[error("failed to configure TLS: {0}")]
    Tls(#[from] rustls::Error),
    #[error("failed to load native root certificates: {0}")]
    NativeRoots(#[from] std::io::Error),
    #[error("failed to build request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("request failed: {0}")]
    Client(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),
    #[error("too many redirects while fetching {url}")]
    TooManyRedirects { url: String },
}

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub body: Bytes,
}

impl ResponseData {
    pub fn is_ok(&self) -> bool {
        http_status_is_ok(self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Display for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response status: {}, body: {}", self.status, self.text())
    }
}

static PROVIDER: Lazy<Arc<rustls::crypto::CryptoProvider>> =
    Lazy::new(|| Arc::new(rustls::crypto::ring::default_provider()));

fn tls_config() -> Result<ClientConfig, HttpError> {
    let builder = ClientConfig::builder_with_provider(PROVIDER.clone())
        .with_safe_default_protocol_versions()?;
    #[cfg(feature = "rustls-platform-verifier")]
    let tls = builder.with_platform_verifier().with_no_client_auth();
    #[cfg(not(feature = "rustls-platform-verifier"))]
    let tls = builder.with_native_roots()?.with_no_client_auth();
    Ok(tls)
}

/// Shared GET client for both `http` and `https` urls.
#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
    user_agent: String,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(user_agent: impl Into<String>) -> Result<Self, HttpError> {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config()?)
            .https_or_http()
            .enable_http1()
            .build();
        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build(https),
            user_agent: user_agent.into(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// GET `url`, following redirects, and buffer the whole body.
    ///
    /// Non-success statuses are returned as data, not as errors.
    pub async fn get(&self, url: &str) -> Result<ResponseData, HttpError> {
        let mut uri = parse_uri(url)?;
        for _ in 0..=MAX_REDIRECTS {
            let req = hyper::Request::builder()
                .method("GET")
                .uri(uri.clone())
                .header(header::USER_AGENT, self.user_agent.as_str())
                .body(Empty::<Bytes>::new())?;
            let mut res = self.client.request(req).await?;
            let status = res.status();
            debug!(url = %uri, status = status.as_u16(), "GET");

            if status.is_redirection() {
                if let Some(location) = res
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                {
                    uri = resolve_location(&uri, location)?;
                    continue;
                }
            }

            let mut body = BytesMut::new();
            while let Some(next) = res.frame().await {
                let frame = next?;
                if let Some(chunk) = frame.data_ref() {
                    body.extend_from_slice(chunk);
                }
            }
            return Ok(ResponseData {
                status: status.as_u16(),
                body: body.freeze(),
            });
        }
        Err(HttpError::TooManyRedirects {
            url: url.to_string(),
        })
    }
}

fn parse_uri(url: &str) -> Result<Uri, HttpError> {
    url.parse().map_err(|source| HttpError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

fn resolve_location(base: &Uri, location: &str) -> Result<Uri, HttpError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return parse_uri(location);
    }
    let scheme = base.scheme_str().unwrap_or("https");
    let authority = base.authority().map_or("", |a| a.as_str());
    let path = if location.starts_with('/') {
        location.to_string()
    } else {
        let dir = base.path().rsplit_once('/').map_or("", |(dir, _)| dir);
        format!("{}/{}", dir, location)
    };
    parse_uri(&format!("{}://{}{}", scheme, authority, path))
}

pub fn http_status_is_ok(status: u16) -> bool {
    if let Ok(status) = StatusCode::from_u16(status) {
        status.is_success()
    } else {
        false
    }
}
