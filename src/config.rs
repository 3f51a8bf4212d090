use crate::error::{Error, Result};
use crate::prompt::InstructionRenderer;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.1-sonar-small-128k-online";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 1_000;
const MAX_TEMPERATURE: f32 = 2.0;

/// Key under which the API credential is persisted.
pub const CREDENTIAL_KEY: &str = "llm_comply_api_key";

/// Configuration for the llm-comply pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,

    /// Model name sent with every request
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens the API may generate
    pub max_tokens: u32,

    /// Reject calls up front when no credential is set
    pub require_credential: bool,

    /// Key used with the credential store
    pub credential_key: String,

    /// File backing the credential store (None keeps it in memory)
    pub credential_path: Option<PathBuf>,

    /// Custom Tera source for the system instructions
    pub instructions_template: Option<String>,

    /// Request timeout. None waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_comply::Config;
    ///
    /// let config = Config::builder()
    ///     .model("sonar")
    ///     .temperature(0.1)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default location of the credential file, under the user's config dir.
    #[must_use]
    pub fn default_credential_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("llm-comply").join("credentials.json"))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The endpoint is not an http(s) URL
    /// - Model or credential key is empty
    /// - Temperature or token limit is out of range
    /// - The instruction template is invalid
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(Error::config(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }

        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }

        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature ({}) must be between 0 and {}",
                self.temperature, MAX_TEMPERATURE
            )));
        }

        if self.max_tokens == 0 {
            return Err(Error::config("max_tokens must be greater than 0"));
        }

        if self.credential_key.trim().is_empty() {
            return Err(Error::config("credential_key must not be empty"));
        }

        if let Some(ref source) = self.instructions_template {
            InstructionRenderer::validate_source(source)?;
        }

        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::config("request_timeout must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            require_credential: true,
            credential_key: CREDENTIAL_KEY.to_string(),
            credential_path: None,
            instructions_template: None,
            request_timeout: None,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    endpoint: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    require_credential: Option<bool>,
    credential_key: Option<String>,
    credential_path: Option<PathBuf>,
    instructions_template: Option<String>,
    request_timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Sets the chat completions endpoint.
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the generation token limit.
    #[must_use]
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Controls whether an empty credential fails before any request.
    ///
    /// Disable for local OpenAI-compatible servers that take no key.
    #[must_use]
    pub fn require_credential(mut self, required: bool) -> Self {
        self.require_credential = Some(required);
        self
    }

    /// Sets the credential store key.
    #[must_use]
    pub fn credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = Some(key.into());
        self
    }

    /// Persists the credential in a JSON file at `path`.
    #[must_use]
    pub fn credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = Some(path.into());
        self
    }

    /// Overrides the built-in system instructions.
    ///
    /// The source is a Tera template; `{{ template }}` expands to the
    /// template's content, `{{ name }}` to its name and `warning_words`
    /// holds the flagged words.
    #[must_use]
    pub fn instructions_template(mut self, source: impl Into<String>) -> Self {
        self.instructions_template = Some(source.into());
        self
    }

    /// Sets a request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            require_credential: self.require_credential.unwrap_or(true),
            credential_key: self
                .credential_key
                .unwrap_or_else(|| CREDENTIAL_KEY.to_string()),
            credential_path: self.credential_path,
            instructions_template: self.instructions_template,
            request_timeout: self.request_timeout,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::builder().build().unwrap();

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(config.require_credential);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = Config::builder().endpoint("ftp://example.com").build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_invalid_temperature() {
        assert!(Config::builder().temperature(2.5).build().is_err());
        assert!(Config::builder().temperature(-0.1).build().is_err());
        assert!(Config::builder().temperature(0.0).build().is_ok());
    }

    #[test]
    fn test_invalid_limits() {
        assert!(Config::builder().max_tokens(0).build().is_err());
        assert!(Config::builder().model("  ").build().is_err());
        assert!(Config::builder().credential_key("").build().is_err());
        assert!(Config::builder()
            .request_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_instructions_template_is_validated() {
        assert!(Config::builder()
            .instructions_template("Use this layout: {{ template }}")
            .build()
            .is_ok());
        assert!(Config::builder()
            .instructions_template("{% if %}")
            .build()
            .is_err());
        assert!(Config::builder()
            .instructions_template("No placeholder here")
            .build()
            .is_err());
    }
}
