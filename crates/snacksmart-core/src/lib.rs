pub mod auth;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod paths;
pub mod prompt;
pub mod services;
pub mod storage;

pub use error::{CoreError, Result};
pub use models::*;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snacksmart_ai::{LlmClient, RelayConfig, StreamRelay};
use tracing::info;

use auth::{AuthManager, AuthSettings, TokenIssuer};
use knowledge::KnowledgeBase;
use services::ChatService;
use storage::Storage;

/// Settings the core needs beyond the database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreSettings {
    pub auth: AuthSettings,
    /// Minimum spacing between partial commits, in milliseconds
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Directory of `*.md` nutrition references; none means no knowledge base
    #[serde(default)]
    pub knowledge_dir: Option<PathBuf>,
}

fn default_throttle_ms() -> u64 {
    RelayConfig::default().throttle_interval.as_millis() as u64
}

impl CoreSettings {
    pub fn new(auth: AuthSettings) -> Self {
        Self {
            auth,
            throttle_ms: default_throttle_ms(),
            knowledge_dir: None,
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            throttle_interval: std::time::Duration::from_millis(self.throttle_ms),
            ..RelayConfig::default()
        }
    }
}

/// Core application state shared by every request handler
pub struct AppCore {
    pub storage: Arc<Storage>,
    pub auth: AuthManager,
    pub chats: ChatService,
    pub knowledge: KnowledgeBase,
}

impl AppCore {
    pub async fn new(
        db_path: &str,
        settings: CoreSettings,
        llm: Arc<dyn LlmClient>,
    ) -> anyhow::Result<Self> {
        let storage = Storage::new(db_path)?;

        let knowledge = match &settings.knowledge_dir {
            Some(dir) => KnowledgeBase::load(dir)?,
            None => KnowledgeBase::empty(),
        };
        let system_prompt = prompt::system_prompt(&knowledge);

        let tokens = TokenIssuer::new(&settings.auth)?;
        let auth = AuthManager::new(storage.users.clone(), tokens);
        let chats = ChatService::new(
            storage.clone(),
            llm.clone(),
            StreamRelay::new(settings.relay_config()),
            system_prompt,
        );

        info!(
            provider = llm.provider(),
            model = llm.model(),
            knowledge_files = knowledge.file_count(),
            "Initializing SnackSmart core"
        );

        Ok(Self {
            storage: Arc::new(storage),
            auth,
            chats,
            knowledge,
        })
    }

    /// The upstream model client
    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        self.chats.llm()
    }

    pub fn system_prompt(&self) -> &str {
        self.chats.system_prompt()
    }
}
