//! Remote Request Client for the GATIS API.
//!
//! Each operation issues exactly one request and turns the outcome into a
//! value or a [`GatisError`] of the matching kind. Nothing is retried.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClientConfig, ResponseMode};
use crate::error::{GatisError, Result};
use crate::transport::{Body, HttpRequest, HttpResponse, Transport};

const AUTH_FAILED: &str = "Authentication failed";
const SIGNUP_FAILED: &str = "Signup failed";
const GENERATION_FAILED: &str = "Image generation failed";
const DEFAULT_IMAGE_TYPE: &str = "image/png";

/// Token payload returned by `/token` (and possibly by `/signup`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub username: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Credentials {
    /// Credentials that carry no token, as granted by the stub verifier.
    pub fn anonymous(username: Option<String>) -> Self {
        Self {
            access_token: None,
            token_type: default_token_type(),
            username,
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Absolute URL or `data:` URL that an `<img>` can load directly.
    pub result_location: String,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PromptRequest<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
struct LegacyPromptRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateJsonResponse {
    image_url: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// `POST /token` with form-encoded credentials.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Credentials> {
        let request = HttpRequest::post(
            self.endpoint("/token"),
            Body::Form(vec![
                ("username".to_string(), username.to_string()),
                ("password".to_string(), password.to_string()),
            ]),
        );
        debug!("Authenticating user {}", username);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| GatisError::AuthError(e.message))?;
        if !response.ok() {
            warn!("Authentication rejected with status {}", response.status);
            return Err(GatisError::AuthError(AUTH_FAILED.to_string()));
        }

        let credentials: Credentials = serde_json::from_slice(&response.body).map_err(|e| {
            GatisError::AuthError(format!("Failed to parse token response: {}", e))
        })?;
        if credentials.bearer().is_none() {
            return Err(GatisError::AuthError(
                "Token response did not contain an access token".to_string(),
            ));
        }
        Ok(credentials)
    }

    /// `POST /signup` with a JSON body. The server may answer with only a
    /// message, in which case the returned credentials carry no token.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Credentials> {
        let body = serde_json::to_string(&SignupRequest {
            username,
            email,
            password,
        })
        .map_err(|e| GatisError::SignupError(format!("Failed to serialize request: {}", e)))?;
        debug!("Registering user {}", username);

        let response = self
            .transport
            .send(HttpRequest::post(self.endpoint("/signup"), Body::Json(body)))
            .await
            .map_err(|e| GatisError::SignupError(e.message))?;
        if !response.ok() {
            let message = detail_message(&response).unwrap_or_else(|| SIGNUP_FAILED.to_string());
            warn!("Signup rejected with status {}: {}", response.status, message);
            return Err(GatisError::SignupError(message));
        }

        // Any 2xx counts as registered; a payload without token fields is fine.
        let mut credentials: Credentials = serde_json::from_slice(&response.body)
            .unwrap_or_else(|_| Credentials::anonymous(None));
        if credentials.username.is_none() {
            credentials.username = Some(username.to_string());
        }
        Ok(credentials)
    }

    /// Submit a prompt and return where the generated image can be loaded.
    pub async fn request_generation(
        &self,
        prompt_text: &str,
        auth_token: Option<&str>,
    ) -> Result<GenerationResult> {
        let request = GenerationRequest {
            prompt_text: prompt_text.to_string(),
            auth_token: auth_token.filter(|t| !t.is_empty()).map(str::to_string),
        };
        if request.prompt_text.trim().is_empty() {
            return Err(GatisError::GenerationError(
                "Please enter a text description".to_string(),
            ));
        }
        self.send_generation(&request).await
    }

    async fn send_generation(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let serialized = match self.config.response_mode {
            ResponseMode::Json => serde_json::to_string(&PromptRequest {
                prompt: &request.prompt_text,
            }),
            ResponseMode::Binary => serde_json::to_string(&LegacyPromptRequest {
                text: &request.prompt_text,
            }),
        }
        .map_err(|e| GatisError::GenerationError(format!("Failed to serialize request: {}", e)))?;

        let path = match self.config.response_mode {
            ResponseMode::Json => "/generate",
            ResponseMode::Binary => "/generate-image/",
        };
        let mut http = HttpRequest::post(self.endpoint(path), Body::Json(serialized));
        if let Some(token) = &request.auth_token {
            http = http.header("Authorization", &format!("Bearer {}", token));
        }
        debug!(
            "Requesting generation ({} mode, authenticated: {})",
            self.config.response_mode.as_str(),
            request.auth_token.is_some()
        );

        let response = self
            .transport
            .send(http)
            .await
            .map_err(|e| GatisError::GenerationError(e.message))?;
        if !response.ok() {
            let message =
                detail_message(&response).unwrap_or_else(|| GENERATION_FAILED.to_string());
            warn!("Generation failed with status {}: {}", response.status, message);
            return Err(GatisError::GenerationError(message));
        }

        self.parse_generation(response)
    }

    fn parse_generation(&self, response: HttpResponse) -> Result<GenerationResult> {
        if response.is_image() || self.config.response_mode == ResponseMode::Binary {
            if response.body.is_empty() {
                return Err(GatisError::GenerationError(
                    "Server returned an empty image".to_string(),
                ));
            }
            let content_type = response
                .content_type
                .as_deref()
                .filter(|ct| ct.starts_with("image/"))
                .unwrap_or(DEFAULT_IMAGE_TYPE);
            return Ok(GenerationResult {
                result_location: data_url(content_type, &response.body),
            });
        }

        let parsed: GenerateJsonResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GatisError::GenerationError(format!("Failed to parse generation response: {}", e))
        })?;
        Ok(GenerationResult {
            result_location: self.resolve_result_location(&parsed.image_url),
        })
    }

    /// Make a result location absolute against the configured base.
    ///
    /// Absolute (`http(s):`, `data:`, `blob:`) locations come back unchanged,
    /// paths are joined to the base, and a bare filename is taken to live
    /// under `/images/`.
    pub fn resolve_result_location(&self, path: &str) -> String {
        let path = path.trim();
        if is_absolute_location(path) {
            return path.to_string();
        }
        if path.starts_with('/') {
            self.endpoint(path)
        } else if path.contains('/') {
            self.endpoint(&format!("/{}", path))
        } else {
            self.image_url(path)
        }
    }

    /// URL of `GET /images/{filename}`.
    pub fn image_url(&self, filename: &str) -> String {
        self.endpoint(&format!("/images/{}", filename))
    }
}

fn is_absolute_location(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    ["http://", "https://", "data:", "blob:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        content_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Pull the server's explanation out of a FastAPI-style error body.
fn detail_message(response: &HttpResponse) -> Option<String> {
    let value: Value = serde_json::from_slice(&response.body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{json_response, ScriptedTransport};
    use crate::transport::{Method, TransportError};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    fn client(transport: &ScriptedTransport, mode: ResponseMode) -> ApiClient<ScriptedTransport> {
        let config = ClientConfig {
            base_url: "http://api.test".to_string(),
            response_mode: mode,
            ..ClientConfig::default()
        };
        ApiClient::new(transport.clone(), config)
    }

    #[test]
    fn test_authenticate_sends_form_and_returns_token() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(
            200,
            r#"{"access_token":"abc","token_type":"bearer","username":"ada"}"#,
        ));
        let api = client(&transport, ResponseMode::Json);

        let creds = block_on(api.authenticate("ada", "pw")).unwrap();
        assert_eq!(creds.bearer(), Some("abc"));
        assert_eq!(creds.username.as_deref(), Some("ada"));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].url, "http://api.test/token");
        assert_eq!(
            sent[0].body,
            Body::Form(vec![
                ("username".to_string(), "ada".to_string()),
                ("password".to_string(), "pw".to_string()),
            ])
        );
    }

    #[test]
    fn test_authenticate_failure_is_generic() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(401, r#"{"detail":"Invalid password"}"#));
        let api = client(&transport, ResponseMode::Json);

        match block_on(api.authenticate("ada", "wrong")) {
            Err(GatisError::AuthError(m)) => assert_eq!(m, AUTH_FAILED),
            other => panic!("expected AuthError, got {:?}", other),
        }
    }

    #[test]
    fn test_authenticate_requires_token() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(200, r#"{"token_type":"bearer"}"#));
        let api = client(&transport, ResponseMode::Json);
        assert!(matches!(
            block_on(api.authenticate("ada", "pw")),
            Err(GatisError::AuthError(_))
        ));
    }

    #[test]
    fn test_transport_failure_maps_to_operation_error() {
        let transport = ScriptedTransport::new();
        transport.push(Err(TransportError::new("Failed to fetch")));
        let api = client(&transport, ResponseMode::Json);
        match block_on(api.authenticate("ada", "pw")) {
            Err(GatisError::AuthError(m)) => assert_eq!(m, "Failed to fetch"),
            other => panic!("expected AuthError, got {:?}", other),
        }
    }

    #[test]
    fn test_register_passes_server_detail() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(400, r#"{"detail":"Username already registered"}"#));
        transport.push(json_response(500, "<html>oops</html>"));
        let api = client(&transport, ResponseMode::Json);

        match block_on(api.register("ada", "ada@example.com", "pw")) {
            Err(GatisError::SignupError(m)) => assert_eq!(m, "Username already registered"),
            other => panic!("expected SignupError, got {:?}", other),
        }
        match block_on(api.register("ada", "ada@example.com", "pw")) {
            Err(GatisError::SignupError(m)) => assert_eq!(m, SIGNUP_FAILED),
            other => panic!("expected SignupError, got {:?}", other),
        }
    }

    #[test]
    fn test_register_message_only_payload() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(200, r#"{"message":"User created successfully"}"#));
        let api = client(&transport, ResponseMode::Json);

        let creds = block_on(api.register("ada", "ada@example.com", "pw")).unwrap();
        assert_eq!(creds.bearer(), None);
        assert_eq!(creds.username.as_deref(), Some("ada"));

        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://api.test/signup");
        let body: Value = match &sent[0].body {
            Body::Json(json) => serde_json::from_str(json).unwrap(),
            other => panic!("expected JSON body, got {:?}", other),
        };
        assert_eq!(
            body,
            serde_json::json!({"username": "ada", "email": "ada@example.com", "password": "pw"})
        );
    }

    #[test]
    fn test_generation_json_mode() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(
            200,
            r#"{"message":"Image generated successfully","image_url":"/images/bird_1.png"}"#,
        ));
        let api = client(&transport, ResponseMode::Json);

        let result = block_on(api.request_generation("A red bird", Some("tok"))).unwrap();
        assert_eq!(result.result_location, "http://api.test/images/bird_1.png");

        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://api.test/generate");
        assert_eq!(sent[0].header_value("Authorization"), Some("Bearer tok"));
        assert_eq!(sent[0].body, Body::Json(r#"{"prompt":"A red bird"}"#.to_string()));
    }

    #[test]
    fn test_generation_binary_mode() {
        let transport = ScriptedTransport::new();
        transport.push(Ok(HttpResponse {
            status: 200,
            content_type: Some("image/jpeg".to_string()),
            body: vec![1, 2, 3],
        }));
        let api = client(&transport, ResponseMode::Binary);

        let result = block_on(api.request_generation("A red bird", None)).unwrap();
        assert_eq!(result.result_location, "data:image/jpeg;base64,AQID");

        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://api.test/generate-image/");
        assert_eq!(sent[0].header_value("Authorization"), None);
        assert_eq!(sent[0].body, Body::Json(r#"{"text":"A red bird"}"#.to_string()));
    }

    #[test]
    fn test_generation_error_detail() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(500, r#"{"detail":"model overloaded"}"#));
        transport.push(json_response(
            422,
            r#"{"detail":[{"loc":["body","prompt"],"msg":"field required","type":"missing"}]}"#,
        ));
        transport.push(json_response(502, ""));
        let api = client(&transport, ResponseMode::Json);

        let messages: Vec<String> = (0..3)
            .map(|_| match block_on(api.request_generation("bird", None)) {
                Err(GatisError::GenerationError(m)) => m,
                other => panic!("expected GenerationError, got {:?}", other),
            })
            .collect();
        assert_eq!(
            messages,
            vec!["model overloaded", "field required", GENERATION_FAILED]
        );
    }

    #[test]
    fn test_empty_prompt_is_rejected_without_request() {
        let transport = ScriptedTransport::new();
        let api = client(&transport, ResponseMode::Json);
        assert!(matches!(
            block_on(api.request_generation("   ", None)),
            Err(GatisError::GenerationError(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_resolve_result_location() {
        let transport = ScriptedTransport::new();
        let api = client(&transport, ResponseMode::Json);

        let cases = [
            ("bird.png", "http://api.test/images/bird.png"),
            ("/images/bird.png", "http://api.test/images/bird.png"),
            ("images/bird.png", "http://api.test/images/bird.png"),
            ("https://cdn.test/bird.png", "https://cdn.test/bird.png"),
            ("data:image/png;base64,AA==", "data:image/png;base64,AA=="),
            ("blob:http://localhost/1234", "blob:http://localhost/1234"),
        ];
        for (input, expected) in cases {
            let resolved = api.resolve_result_location(input);
            assert_eq!(resolved, expected);
            // Resolving again changes nothing.
            assert_eq!(api.resolve_result_location(&resolved), expected);
        }
    }
}
