//! Request operations and their mapping onto HTTP responses.
//!
//! Every response, successful or not, allows any origin.

use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{error, warn};

use release_provider::{ChannelResolver, ResolveError};

pub type Body = http_body_util::Full<Bytes>;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, OPTIONS";
const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// `GET release?channel=<c>`
pub async fn get_release(resolver: &ChannelResolver, channel: Option<&str>) -> Response<Body> {
    match resolver.find_latest(channel).await {
        Ok(release) => json_response(&release),
        Err(err) => error_response(&err),
    }
}

/// `GET releases?channels=<csv>`; an empty list means every channel.
pub async fn get_releases(resolver: &ChannelResolver, channels: Option<&str>) -> Response<Body> {
    let channels = split_channels(channels.unwrap_or_default());
    match resolver.find_all(&channels).await {
        Ok(releases) => json_response(&releases),
        Err(err) => error_response(&err),
    }
}

/// `GET download/<channel>[/<arch>]`, redirecting to the installer.
pub async fn download(
    resolver: &ChannelResolver,
    channel: Option<&str>,
    arch: Option<&str>,
) -> Response<Body> {
    match resolver.find_download(channel, arch).await {
        Ok(url) => match HeaderValue::from_str(&url) {
            Ok(location) => {
                let mut rsp = response(StatusCode::FOUND, Body::default());
                rsp.headers_mut().insert(header::LOCATION, location);
                rsp
            }
            Err(_) => error_response(&ResolveError::upstream_msg(format!(
                "Invalid download url {}",
                url
            ))),
        },
        Err(err) => error_response(&err),
    }
}

/// CORS preflight.
pub fn preflight() -> Response<Body> {
    let mut rsp = response(StatusCode::NO_CONTENT, Body::default());
    let headers = rsp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    rsp
}

pub fn text_response(status: StatusCode, message: impl Into<String>) -> Response<Body> {
    let mut rsp = response(status, Body::from(message.into()));
    rsp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT));
    rsp
}

pub fn split_channels(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .map(str::to_string)
        .collect()
}

fn json_response<T: Serialize>(value: &T) -> Response<Body> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let mut rsp = response(StatusCode::OK, Body::from(json));
            rsp.headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON));
            rsp
        }
        Err(err) => {
            error!(error = %err, "failed to serialize response");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn error_response(err: &ResolveError) -> Response<Body> {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, source = ?std::error::Error::source(err), "request failed");
    } else {
        warn!(error = %err, "request rejected");
    }
    text_response(status, err.to_string())
}

fn response(status: StatusCode, body: Body) -> Response<Body> {
    let mut rsp = Response::new(body);
    *rsp.status_mut() = status;
    rsp.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    rsp
}
