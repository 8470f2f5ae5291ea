use secrecy::SecretString;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default model when the request does not name one.
const DEFAULT_MODEL: &str = "gpt-5";

/// Default sampling temperature, also used when the request value is not a
/// finite number.
pub const DEFAULT_TEMPERATURE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct CopygenConfig {
    pub common: core_config::Config,
    pub openai: OpenAiConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Resolved once at startup; never read from ambient env mid-request.
    pub api_key: SecretString,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub default_model: String,
    pub default_temperature: f64,
    pub provider: ProviderKind,
}

/// Which text provider backs the service. `Mock` is for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Mock,
}

impl CopygenConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let provider = match get_env("COPYGEN_PROVIDER", Some("openai"), is_prod)?.as_str() {
            "mock" => ProviderKind::Mock,
            _ => ProviderKind::OpenAi,
        };

        Ok(CopygenConfig {
            common: common_config,
            openai: OpenAiConfig {
                // Dev default is a blank key; the handler turns that into a
                // server-configuration error instead of calling upstream.
                api_key: SecretString::new(get_env("OPENAI_API_KEY", Some(""), is_prod)?),
                base_url: get_env(
                    "OPENAI_BASE_URL",
                    Some("https://api.openai.com/v1"),
                    is_prod,
                )?,
            },
            generation: GenerationConfig {
                default_model: get_env("COPYGEN_DEFAULT_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                default_temperature: get_env(
                    "COPYGEN_DEFAULT_TEMPERATURE",
                    Some(&DEFAULT_TEMPERATURE.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_TEMPERATURE),
                provider,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
