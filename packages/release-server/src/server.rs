use hyper::{body::Incoming, service::Service, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use release_provider::ChannelResolver;

use crate::handlers::{self, Body};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
}

pub struct ReleaseServer {
    resolver: Arc<ChannelResolver>,
}

impl ReleaseServer {
    pub fn new(resolver: Arc<ChannelResolver>) -> Self {
        Self { resolver }
    }

    pub async fn start(self, addr: SocketAddr) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener).await
    }

    /// Serves connections from `listener` until accepting fails.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "release server listening");
        }

        loop {
            let (stream, peer) = listener.accept().await.map_err(ServerError::Accept)?;
            let io = TokioIo::new(stream);
            let service = ReleaseService {
                resolver: self.resolver.clone(),
            };

            tokio::spawn(async move {
                if let Err(err) = hyper::server::conn::http1::Builder::new()
                    .serve_connection(io, service)
                    .await
                {
                    warn!(%peer, error = %err, "error serving connection");
                }
            });
        }
    }
}

#[derive(Clone)]
struct ReleaseService {
    resolver: Arc<ChannelResolver>,
}

impl Service<Request<Incoming>> for ReleaseService {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let resolver = self.resolver.clone();
        Box::pin(async move { Ok(handle(&resolver, req).await) })
    }
}

/// Routes a request onto the handlers. The body is never read.
pub async fn handle<B>(resolver: &ChannelResolver, req: Request<B>) -> Response<Body> {
    debug!(method = %req.method(), uri = %req.uri(), "request");

    if req.method() == Method::OPTIONS {
        return handlers::preflight();
    }
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return handlers::text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let segments = path_segments(req.uri().path());
    let query = parse_query(req.uri().query().unwrap_or_default());
    let param = |name: &str| query.get(name).map(String::as_str);

    match segments.iter().map(String::as_str).collect::<Vec<_>>()[..] {
        ["release"] => handlers::get_release(resolver, param("channel")).await,
        ["release", channel] => handlers::get_release(resolver, Some(channel)).await,
        ["releases"] => handlers::get_releases(resolver, param("channels")).await,
        ["download"] => handlers::download(resolver, param("channel"), param("arch")).await,
        ["download", channel] => handlers::download(resolver, Some(channel), param("arch")).await,
        ["download", channel, arch] => {
            handlers::download(resolver, Some(channel), Some(arch)).await
        }
        _ => handlers::text_response(StatusCode::NOT_FOUND, "Not found"),
    }
}

fn path_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(decode)
        .collect()
}

/// Later duplicates win.
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode(key), decode(value)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segments() {
        assert!(path_segments("/").is_empty());
        assert_eq!(path_segments("/release/alpha"), vec!["release", "alpha"]);
        assert_eq!(path_segments("//download/beta/arm64/"), vec!["download", "beta", "arm64"]);
        assert_eq!(path_segments("/release/my%20channel"), vec!["release", "my channel"]);
    }

    #[test]
    fn test_parse_query() {
        let query = parse_query("channel=alpha&arch=arm64");
        assert_eq!(query["channel"], "alpha");
        assert_eq!(query["arch"], "arm64");

        let query = parse_query("channels=alpha%2Cbeta&flag&channel=a&channel=b");
        assert_eq!(query["channels"], "alpha,beta");
        assert_eq!(query["flag"], "");
        assert_eq!(query["channel"], "b");

        assert!(parse_query("").is_empty());
        assert_eq!(parse_query("q=a+b")["q"], "a b");
    }
}
