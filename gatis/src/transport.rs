//! HTTP transport port.
//!
//! [`ApiClient`](crate::ApiClient) builds [`HttpRequest`]s and interprets
//! [`HttpResponse`]s; a [`Transport`] only moves bytes. In the browser that is
//! [`GlooTransport`] (fetch); tests script responses instead.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    /// Serialized JSON, sent as `application/json`.
    Json(String),
    /// Fields sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>, body: Body) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }
}

/// The request never produced a response (network down, CORS, bad URL).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sends one request and waits for the full response.
///
/// No retries and no timeout beyond what the underlying client does.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(feature = "browser")]
pub use self::fetch::GlooTransport;

#[cfg(feature = "browser")]
mod fetch {
    use gloo_net::http::{Request, RequestBuilder};
    use web_sys::UrlSearchParams;

    use super::{Body, HttpRequest, HttpResponse, Method, Transport, TransportError};

    /// fetch-based transport for the browser.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct GlooTransport;

    impl From<gloo_net::Error> for TransportError {
        fn from(err: gloo_net::Error) -> Self {
            TransportError::new(err.to_string())
        }
    }

    impl Transport for GlooTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let mut builder: RequestBuilder = match request.method {
                Method::Get => Request::get(&request.url),
                Method::Post => Request::post(&request.url),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = match request.body {
                Body::Empty => builder.send().await?,
                Body::Json(json) => {
                    builder
                        .header("Content-Type", "application/json")
                        .body(json)?
                        .send()
                        .await?
                }
                Body::Form(fields) => {
                    // The browser sets the urlencoded content type itself.
                    let params = UrlSearchParams::new()
                        .map_err(|e| TransportError::new(format!("{:?}", e)))?;
                    for (name, value) in &fields {
                        params.append(name, value);
                    }
                    builder.body(params)?.send().await?
                }
            };

            let status = response.status();
            let content_type = response.headers().get("content-type");
            let body = response.binary().await?;

            Ok(HttpResponse {
                status,
                content_type,
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HttpRequest::post("http://x/", Body::Empty).header("Authorization", "Bearer t");
        assert_eq!(req.header_value("authorization"), Some("Bearer t"));
        assert_eq!(req.header_value("content-type"), None);
    }

    #[test]
    fn test_response_classification() {
        let png = HttpResponse {
            status: 200,
            content_type: Some("image/png".to_string()),
            body: vec![0x89, b'P'],
        };
        assert!(png.ok());
        assert!(png.is_image());

        let err = HttpResponse {
            status: 500,
            content_type: Some("application/json".to_string()),
            body: br#"{"detail":"x"}"#.to_vec(),
        };
        assert!(!err.ok());
        assert!(!err.is_image());
        assert_eq!(err.body, br#"{"detail":"x"}"#);
    }
}
