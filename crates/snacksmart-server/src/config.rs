use serde::Deserialize;
use snacksmart_ai::llm;
use snacksmart_core::CoreSettings;
use snacksmart_core::auth::{AuthSettings, DEFAULT_TOKEN_TTL_DAYS};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "snacksmart.toml";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Database file; defaults to ~/.snacksmart/snacksmart.db
    pub db_path: Option<String>,
    pub llm: LlmConfig,
    pub core: CoreSettings,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub live_search: bool,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    storage: StorageSection,
    #[serde(default)]
    llm: LlmSection,
    #[serde(default)]
    auth: AuthSection,
    #[serde(default)]
    relay: RelaySection,
    #[serde(default)]
    knowledge: KnowledgeSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct StorageSection {
    #[serde(default)]
    db_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LlmSection {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_live_search")]
    live_search: bool,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            live_search: default_live_search(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthSection {
    #[serde(default)]
    jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl_days")]
    token_ttl_days: i64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_days: default_token_ttl_days(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RelaySection {
    #[serde(default = "default_throttle_ms")]
    throttle_ms: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct KnowledgeSection {
    #[serde(default)]
    dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    llm::DEFAULT_XAI_BASE_URL.to_string()
}

fn default_model() -> String {
    llm::DEFAULT_XAI_MODEL.to_string()
}

fn default_temperature() -> f32 {
    llm::DEFAULT_TEMPERATURE
}

fn default_live_search() -> bool {
    true
}

fn default_token_ttl_days() -> i64 {
    DEFAULT_TOKEN_TTL_DAYS
}

fn default_throttle_ms() -> u64 {
    80
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = match load_from_file()? {
            Some(file_config) => Self::from_file(file_config),
            None => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(file: FileConfig) -> Self {
        let api_key = file
            .llm
            .api_key
            .or_else(|| env::var("XAI_API_KEY").ok())
            .unwrap_or_default();
        let jwt_secret = file
            .auth
            .jwt_secret
            .or_else(|| env::var("AUTH_JWT_SECRET").ok())
            .unwrap_or_default();

        let mut core = CoreSettings::new(AuthSettings {
            jwt_secret,
            token_ttl_days: file.auth.token_ttl_days,
        });
        core.throttle_ms = file.relay.throttle_ms;
        core.knowledge_dir = file.knowledge.dir;

        Self {
            host: file.server.host,
            port: file.server.port,
            db_path: file.storage.db_path,
            llm: LlmConfig {
                api_key,
                base_url: file.llm.base_url,
                model: file.llm.model,
                temperature: file.llm.temperature,
                live_search: file.llm.live_search,
            },
            core,
        }
    }

    fn from_env() -> Self {
        let host = env::var("SNACKSMART_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("SNACKSMART_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let throttle_ms = env::var("SNACKSMART_THROTTLE_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or_else(default_throttle_ms);

        let mut core = CoreSettings::new(AuthSettings::new(
            env::var("AUTH_JWT_SECRET").unwrap_or_default(),
        ));
        core.throttle_ms = throttle_ms;
        core.knowledge_dir = env::var("SNACKSMART_KNOWLEDGE_DIR").ok().map(PathBuf::from);

        Self {
            host,
            port,
            db_path: env::var("SNACKSMART_DB_PATH").ok(),
            llm: LlmConfig {
                api_key: env::var("XAI_API_KEY").unwrap_or_default(),
                base_url: env::var("SNACKSMART_LLM_BASE_URL").unwrap_or_else(|_| default_base_url()),
                model: env::var("SNACKSMART_LLM_MODEL").unwrap_or_else(|_| default_model()),
                temperature: default_temperature(),
                live_search: default_live_search(),
            },
            core,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.core.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!("AUTH_JWT_SECRET is not configured");
        }
        if self.llm.api_key.trim().is_empty() {
            tracing::warn!("XAI_API_KEY is not configured; upstream requests will be rejected");
        }
        if self.core.throttle_ms == 0 {
            tracing::warn!("Relay throttle is disabled; every delta will be committed");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("SNACKSMART_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Some(DEFAULT_CONFIG_FILE.to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    let parsed = parse_file_config(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
    Ok(Some(parsed))
}

fn parse_file_config(contents: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(contents)
}
