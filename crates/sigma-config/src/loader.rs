use std::path::Path;
use std::str::FromStr;

use secrecy::ExposeSecret;

use crate::Config;

/// Largest tool round budget accepted from configuration
const MAX_TOOL_ROUNDS: u32 = 8;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        raw.parse()
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_chat()?;
        self.validate_search()?;
        self.validate_imagegen()?;
        Ok(())
    }

    fn validate_chat(&self) -> anyhow::Result<()> {
        let chat = &self.chat;

        let has_key = chat
            .provider
            .api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty());

        // Self-hosted OpenAI-compatible servers often run without a key
        if !has_key && chat.provider.base_url.is_none() {
            anyhow::bail!("chat.provider.api_key is required unless chat.provider.base_url is set");
        }

        if chat.model.trim().is_empty() {
            anyhow::bail!("chat.model must not be empty");
        }

        if chat.max_tool_rounds > MAX_TOOL_ROUNDS {
            anyhow::bail!("chat.max_tool_rounds must be at most {MAX_TOOL_ROUNDS}");
        }

        if let Some(temperature) = chat.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            anyhow::bail!("chat.temperature must be between 0.0 and 2.0");
        }

        if chat.timeout.is_zero() {
            anyhow::bail!("chat.timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_search(&self) -> anyhow::Result<()> {
        let search = &self.search;

        if !search.enabled {
            return Ok(());
        }

        if search.api_key.as_ref().is_none_or(|k| k.expose_secret().is_empty()) {
            anyhow::bail!("search.api_key is required when search is enabled");
        }

        if !(1..=10).contains(&search.max_results) {
            anyhow::bail!("search.max_results must be between 1 and 10");
        }

        if search.timeout.is_zero() {
            anyhow::bail!("search.timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_imagegen(&self) -> anyhow::Result<()> {
        if self.imagegen.model.trim().is_empty() {
            anyhow::bail!("imagegen.model must not be empty");
        }

        if self.imagegen.timeout.is_zero() {
            anyhow::bail!("imagegen.timeout must be greater than 0");
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    /// Parse configuration from raw TOML text, expanding environment
    /// placeholders and validating the result
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }
}
