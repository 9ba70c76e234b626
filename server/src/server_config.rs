use config::{Config, ConfigError};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::{env, fmt, path::Path, result::Result};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct GmailConfig {
    pub client_id: String,
    pub project_id: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    pub userinfo_uri: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
    pub scopes: Vec<String>,
}

impl GmailConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        builder.try_deserialize()
    }
}

#[derive(Clone, Deserialize)]
pub struct ApiConfig {
    pub endpoint: String,
    #[serde(default)]
    pub key: String,
    /// Sent as `HTTP-Referer`, shows up on the provider's usage stats
    pub referer: Option<String>,
    /// Sent as `X-Title`
    pub title: Option<String>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub max_list_results: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct FEConfig {
    pub callback_path: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    settings: Settings,
    api: ApiConfig,
    model: ModelConfig,
    frontend: FEConfig,
}

#[derive(Debug, Clone)]
pub struct Frontend {
    base_url: Url,
    config: FEConfig,
}

impl Frontend {
    pub fn new(base_url: Url, callback_path: &str) -> Self {
        Self {
            base_url,
            config: FEConfig {
                callback_path: callback_path.to_string(),
            },
        }
    }

    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    pub fn get_callback_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&self.config.callback_path);
        url
    }
}

#[derive(Debug)]
pub struct ServerConfig {
    pub settings: Settings,
    pub api: ApiConfig,
    pub gmail_config: GmailConfig,
    pub model: ModelConfig,
    pub frontend: Frontend,
}

impl std::fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Server Config:\n{:?}\n\nAPI: {:?}\n\nGmail client: {} ({:?})\n\nModel Config: {:?}\n\nFrontend Config: {:?}",
            self.settings,
            self.api,
            self.gmail_config.client_id,
            self.gmail_config.scopes,
            self.model,
            self.frontend,
        )
    }
}

fn config_root() -> String {
    env::var("APP_DIR").unwrap_or_else(|_| {
        let dir =
            env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR or APP_DIR is required");
        let dir = Path::new(&dir)
            .parent()
            .expect("Failed to get parent dir")
            .display()
            .to_string();
        format!("{}/config", dir)
    })
}

lazy_static! {
    pub static ref cfg: ServerConfig = {
        let root = config_root();
        let path = format!("{root}/client_secret.toml");
        let mut gmail_config =
            GmailConfig::from_file(&path).expect("client_secret.toml is required");
        if let Ok(redirect_uri) = env::var("GOOGLE_REDIRECT_URI") {
            gmail_config.redirect_uris = vec![redirect_uri];
        }
        if gmail_config.redirect_uris.is_empty() {
            panic!("client_secret.toml needs at least one redirect uri");
        }

        let path = format!("{root}/config.toml");
        let cfg_file: ConfigFile = Config::builder()
            .add_source(config::File::with_name(&path))
            .build()
            .expect("config.toml is required")
            .try_deserialize()
            .expect("config.toml is invalid");

        let ConfigFile {
            settings,
            mut api,
            model,
            frontend,
        } = cfg_file;

        if let Ok(key) = env::var("OPENROUTER_API_KEY") {
            api.key = key;
        }
        if api.key.is_empty() {
            panic!("OPENROUTER_API_KEY is required");
        }

        let frontend = Frontend {
            base_url: Url::parse(
                &env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            )
            .expect("FRONTEND_URL is invalid"),
            config: frontend,
        };

        ServerConfig {
            settings,
            api,
            gmail_config,
            model,
            frontend,
        }
    };
}
