//! The network seam between a session and the ConfigHub service.
//!
//! [`ConfigHub`](crate::ConfigHub) builds a [`Request`] (path, headers and
//! optional body) and hands it to a [`Transport`]. The session only looks
//! at the returned status, body and `ETag`. Timeouts, TLS and connection
//! handling all live in the transport.
//!
//! [`HttpTransport`] is the blocking HTTP implementation used by default.
//! Tests and embedders can supply their own.

use std::time::Duration;

use thiserror::Error;

/// Request method. Pulls are `GET`, pushes are `POST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path below the server address, e.g. `/rest/pull`.
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    /// Push results carry their message in the `ETag` header.
    pub etag: Option<String>,
}

/// The request never produced an HTTP response.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait Transport: Send + Sync {
    /// Send a request. Non-2xx statuses are responses, not errors.
    fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

/// Blocking HTTP(S) transport on top of `ureq`.
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTransport {
    /// `server` is a host with optional port and path prefix, without scheme.
    pub fn new(server: &str, secure: bool, timeout: Duration) -> Self {
        let scheme = if secure { "https" } else { "http" };
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: format!("{scheme}://{}", server.trim_end_matches('/')),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::info!(%url, method = request.method.as_str(), "connecting to ConfigHub");

        let mut req = self.agent.request(request.method.as_str(), &url);
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }

        let result = match &request.body {
            Some(body) => req.send_string(body),
            None => req.call(),
        };
        let response = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(e) => return Err(TransportError(e.to_string())),
        };

        let status = response.status();
        let etag = response.header("ETag").map(str::to_string);
        let body = response
            .into_string()
            .map_err(|e| TransportError(format!("failed to read response body: {e}")))?;

        Ok(Response { status, body, etag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_uses_scheme_and_trims_slash() {
        let t = HttpTransport::new("demo.confighub.com/", true, Duration::from_secs(1));
        assert_eq!(t.base_url(), "https://demo.confighub.com");
        let t = HttpTransport::new("localhost:8080", false, Duration::from_secs(1));
        assert_eq!(t.base_url(), "http://localhost:8080");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request {
            method: Method::Get,
            path: "/rest/pull".into(),
            headers: vec![("Context", "Dev;App".into())],
            body: None,
        };
        assert_eq!(req.header("context"), Some("Dev;App"));
        assert_eq!(req.header("Tag"), None);
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let t = HttpTransport::new("127.0.0.1:9", false, Duration::from_secs(2));
        let req = Request {
            method: Method::Get,
            path: "/rest/pull".into(),
            headers: vec![],
            body: None,
        };
        assert!(t.send(&req).is_err());
    }
}
