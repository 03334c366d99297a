//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use secrecy::SecretString;
use sigma_config::{
    ChatConfig, ChatProviderConfig, Config, CorsConfig, HealthConfig, ImageGenConfig, ImageGenProviderType,
    SearchConfig, ServerConfig,
};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder whose chat and image providers point at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                chat: ChatConfig {
                    provider: ChatProviderConfig {
                        name: "mock".to_owned(),
                        api_key: Some(SecretString::from("test-key")),
                        base_url: Some(base_url.parse().expect("valid URL")),
                    },
                    model: "mock-chat".to_owned(),
                    system_prompt: "You are a test assistant.".to_owned(),
                    ..ChatConfig::default()
                },
                search: SearchConfig::default(),
                imagegen: ImageGenConfig {
                    model: "mock-image".to_owned(),
                    api_key: Some(SecretString::from("test-key")),
                    base_url: Some(base_url.parse().expect("valid URL")),
                    ..ImageGenConfig::default()
                },
                telemetry: None,
            },
        }
    }

    /// Enable the web search tool against a Tavily-compatible mock
    pub fn with_search(mut self, base_url: &str) -> Self {
        self.config.search = SearchConfig {
            enabled: true,
            api_key: Some(SecretString::from("tvly-test")),
            base_url: Some(base_url.parse().expect("valid URL")),
            ..SearchConfig::default()
        };
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.config.chat.max_tool_rounds = rounds;
        self
    }

    pub fn without_sources(mut self) -> Self {
        self.config.chat.emit_sources = false;
        self
    }

    /// Use the images API instead of a chat completion with image output
    pub fn with_images_api(mut self, model: &str) -> Self {
        self.config.imagegen.provider_type = ImageGenProviderType::Openai;
        model.clone_into(&mut self.config.imagegen.model);
        self
    }

    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
