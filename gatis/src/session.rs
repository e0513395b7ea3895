//! Session gate.
//!
//! Decides whether the generation page may be shown and records who signed
//! in. How credentials are checked is up to the [`Verifier`] in use, so the
//! page logic is the same with a real backend or the placeholder one.

use tracing::{debug, info};

use crate::client::{ApiClient, Credentials};
use crate::config::AuthMode;
use crate::error::{GatisError, Result};
use crate::storage::{
    KeyValueStore, StorageError, STORAGE_AUTHENTICATED, STORAGE_TOKEN, STORAGE_USERNAME,
};
use crate::transport::Transport;

/// Top-level pages of the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Home,
    Login,
    Signup,
    Generate,
    /// Anything the app has no page for.
    NotFound,
}

impl Page {
    pub fn requires_session(&self) -> bool {
        matches!(self, Page::Generate)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Login => "/login",
            Page::Signup => "/signup",
            Page::Generate => "/model",
            Page::NotFound => "/404",
        }
    }

    pub fn from_path(path: &str) -> Page {
        match path.trim_end_matches('/') {
            "" => Page::Home,
            "/login" => Page::Login,
            "/signup" => Page::Signup,
            "/model" => Page::Generate,
            _ => Page::NotFound,
        }
    }
}

/// Checks login and signup submissions.
#[allow(async_fn_in_trait)]
pub trait Verifier {
    async fn login(&self, username: &str, password: &str) -> Result<Credentials>;

    async fn signup(&self, username: &str, email: &str, password: &str) -> Result<Credentials>;
}

/// Verifies against the API's `/signup` and `/token` endpoints.
#[derive(Debug, Clone)]
pub struct RemoteVerifier<T> {
    client: ApiClient<T>,
}

impl<T: Transport> RemoteVerifier<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Verifier for RemoteVerifier<T> {
    async fn login(&self, username: &str, password: &str) -> Result<Credentials> {
        self.client.authenticate(username, password).await
    }

    async fn signup(&self, username: &str, email: &str, password: &str) -> Result<Credentials> {
        let registered = self.client.register(username, email, password).await?;
        if registered.bearer().is_some() {
            return Ok(registered);
        }
        // The server only confirmed the account; sign in to get a token.
        debug!("Signup returned no token, signing in as {}", username);
        self.client.authenticate(username, password).await
    }
}

/// Accepts every submission without contacting a server.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubVerifier;

impl Verifier for StubVerifier {
    async fn login(&self, username: &str, _password: &str) -> Result<Credentials> {
        Ok(Credentials::anonymous(Some(username.to_string())))
    }

    async fn signup(&self, username: &str, _email: &str, _password: &str) -> Result<Credentials> {
        Ok(Credentials::anonymous(Some(username.to_string())))
    }
}

/// Verifier picked from [`AuthMode`].
#[derive(Debug, Clone)]
pub enum AuthBackend<T> {
    Remote(RemoteVerifier<T>),
    Stub(StubVerifier),
}

impl<T: Transport> AuthBackend<T> {
    pub fn from_client(client: ApiClient<T>) -> Self {
        match client.config().auth_mode {
            AuthMode::Remote => AuthBackend::Remote(RemoteVerifier::new(client)),
            AuthMode::Stub => AuthBackend::Stub(StubVerifier),
        }
    }
}

impl<T: Transport> Verifier for AuthBackend<T> {
    async fn login(&self, username: &str, password: &str) -> Result<Credentials> {
        match self {
            AuthBackend::Remote(v) => v.login(username, password).await,
            AuthBackend::Stub(v) => v.login(username, password).await,
        }
    }

    async fn signup(&self, username: &str, email: &str, password: &str) -> Result<Credentials> {
        match self {
            AuthBackend::Remote(v) => v.signup(username, email, password).await,
            AuthBackend::Stub(v) => v.signup(username, email, password).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionGate<S> {
    store: S,
}

impl<S: KeyValueStore> SessionGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get(STORAGE_AUTHENTICATED).as_deref() == Some("true")
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(STORAGE_TOKEN).filter(|t| !t.is_empty())
    }

    pub fn username(&self) -> Option<String> {
        self.store.get(STORAGE_USERNAME)
    }

    /// The page to actually show when `requested` is asked for.
    pub fn guard(&self, requested: Page) -> Page {
        if requested.requires_session() && !self.is_authenticated() {
            info!("No session, redirecting {} to login", requested.path());
            return Page::Login;
        }
        requested
    }

    /// Persist a successful sign-in.
    pub fn establish(&self, credentials: &Credentials, username: &str) -> std::result::Result<(), StorageError> {
        match credentials.bearer() {
            Some(token) => self.store.set(STORAGE_TOKEN, token)?,
            None => self.store.remove(STORAGE_TOKEN),
        }
        let username = credentials.username.as_deref().unwrap_or(username);
        self.store.set(STORAGE_USERNAME, username)?;
        self.store.set(STORAGE_AUTHENTICATED, "true")
    }

    pub fn sign_out(&self) {
        self.store.remove(STORAGE_AUTHENTICATED);
        self.store.remove(STORAGE_TOKEN);
        self.store.remove(STORAGE_USERNAME);
    }

    pub async fn sign_in<V: Verifier>(
        &self,
        verifier: &V,
        username: &str,
        password: &str,
    ) -> Result<Credentials> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(GatisError::AuthError(
                "Username and password are required".to_string(),
            ));
        }
        let credentials = verifier.login(username.trim(), password).await?;
        self.establish(&credentials, username.trim())?;
        info!("Signed in as {}", username.trim());
        Ok(credentials)
    }

    pub async fn sign_up<V: Verifier>(
        &self,
        verifier: &V,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Credentials> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(GatisError::SignupError(
                "Username, email and password are required".to_string(),
            ));
        }
        let credentials = verifier
            .signup(username.trim(), email.trim(), password)
            .await?;
        self.establish(&credentials, username.trim())?;
        info!("Signed up as {}", username.trim());
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::storage::MemoryStore;
    use crate::test_helpers::{json_response, ScriptedTransport};
    use futures::executor::block_on;

    fn remote(transport: &ScriptedTransport) -> AuthBackend<ScriptedTransport> {
        AuthBackend::from_client(ApiClient::new(transport.clone(), ClientConfig::default()))
    }

    #[test]
    fn test_page_paths() {
        for page in [
            Page::Home,
            Page::Login,
            Page::Signup,
            Page::Generate,
            Page::NotFound,
        ] {
            assert_eq!(Page::from_path(page.path()), page);
        }
        assert_eq!(Page::from_path("/model/"), Page::Generate);
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        for path in ["/nope", "/model/extra", "/Login"] {
            assert_eq!(Page::from_path(path), Page::NotFound);
        }
        let gate = SessionGate::new(MemoryStore::new());
        assert_eq!(gate.guard(Page::from_path("/nope")), Page::NotFound);
    }

    #[test]
    fn test_guard_redirects_without_session() {
        let store = MemoryStore::new();
        let gate = SessionGate::new(store.clone());

        assert!(!gate.is_authenticated());
        assert_eq!(gate.guard(Page::Generate), Page::Login);
        assert_eq!(gate.guard(Page::Home), Page::Home);
        assert_eq!(gate.guard(Page::Signup), Page::Signup);

        store.set(STORAGE_AUTHENTICATED, "true").unwrap();
        assert_eq!(gate.guard(Page::Generate), Page::Generate);

        store.set(STORAGE_AUTHENTICATED, "false").unwrap();
        assert_eq!(gate.guard(Page::Generate), Page::Login);
    }

    #[test]
    fn test_remote_sign_in_stores_session() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(200, r#"{"access_token":"jwt","token_type":"bearer"}"#));
        let gate = SessionGate::new(MemoryStore::new());

        block_on(gate.sign_in(&remote(&transport), " ada ", "pw")).unwrap();
        assert!(gate.is_authenticated());
        assert_eq!(gate.token().as_deref(), Some("jwt"));
        assert_eq!(gate.username().as_deref(), Some("ada"));

        gate.sign_out();
        assert!(!gate.is_authenticated());
        assert_eq!(gate.token(), None);
        assert_eq!(gate.username(), None);
    }

    #[test]
    fn test_failed_sign_in_leaves_no_session() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(401, r#"{"detail":"Invalid username"}"#));
        let gate = SessionGate::new(MemoryStore::new());

        let err = block_on(gate.sign_in(&remote(&transport), "ada", "pw")).unwrap_err();
        assert!(matches!(err, GatisError::AuthError(_)));
        assert!(!gate.is_authenticated());
    }

    #[test]
    fn test_empty_fields_rejected_before_verifier() {
        let transport = ScriptedTransport::new();
        let gate = SessionGate::new(MemoryStore::new());

        assert!(matches!(
            block_on(gate.sign_in(&remote(&transport), "", "pw")),
            Err(GatisError::AuthError(_))
        ));
        assert!(matches!(
            block_on(gate.sign_up(&remote(&transport), "ada", " ", "pw")),
            Err(GatisError::SignupError(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_remote_signup_signs_in_when_no_token() {
        let transport = ScriptedTransport::new();
        transport.push(json_response(200, r#"{"message":"User created successfully"}"#));
        transport.push(json_response(200, r#"{"access_token":"jwt","username":"ada"}"#));
        let gate = SessionGate::new(MemoryStore::new());

        block_on(gate.sign_up(&remote(&transport), "ada", "ada@example.com", "pw")).unwrap();
        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec!["http://localhost:8000/signup", "http://localhost:8000/token"]
        );
        assert_eq!(gate.token().as_deref(), Some("jwt"));
    }

    #[test]
    fn test_stub_verifier_always_grants() {
        let config = ClientConfig {
            auth_mode: AuthMode::Stub,
            ..ClientConfig::default()
        };
        let transport = ScriptedTransport::new();
        let backend = AuthBackend::from_client(ApiClient::new(transport.clone(), config));
        assert!(matches!(backend, AuthBackend::Stub(_)));

        let gate = SessionGate::new(MemoryStore::new());
        block_on(gate.sign_in(&backend, "anyone", "anything")).unwrap();
        assert!(gate.is_authenticated());
        assert_eq!(gate.token(), None);
        assert_eq!(gate.guard(Page::Generate), Page::Generate);
        assert!(transport.requests().is_empty());
    }
}
