//! The library services the pages share, built once at startup.

use gatis::{
    ApiClient, AuthBackend, ClientConfig, GenerationService, GlooTransport, LocalStore,
    SessionGate,
};

pub type Generator = GenerationService<GlooTransport, LocalStore>;

#[derive(Debug, Clone)]
pub struct Services {
    pub generator: Generator,
    pub gate: SessionGate<LocalStore>,
    pub auth: AuthBackend<GlooTransport>,
}

impl Services {
    /// Build from compile-time env plus any overrides saved in localStorage.
    pub fn from_env() -> Self {
        let config = ClientConfig::from_env().with_overrides(&LocalStore);
        log::info!(
            "API at {} ({} responses, {:?} auth)",
            config.base_url,
            config.response_mode.as_str(),
            config.auth_mode
        );

        let client = ApiClient::new(GlooTransport, config);
        Self {
            generator: GenerationService::new(client.clone(), LocalStore),
            gate: SessionGate::new(LocalStore),
            auth: AuthBackend::from_client(client),
        }
    }
}
