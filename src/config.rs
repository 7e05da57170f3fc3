use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub expires_in: i64, // seconds
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "static/uploads".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Use the unit price sent by the client instead of the catalog price
    #[serde(default)]
    pub trust_client_prices: bool,
    /// Allow stock to go below zero
    #[serde(default = "default_true")]
    pub allow_oversell: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            trust_client_prices: false,
            allow_oversell: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub admin_name: String,
    pub sample_products: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            admin_name: "Administrator".to_string(),
            sample_products: true,
        }
    }
}

fn default_cookie_name() -> String {
    "koperasi_session".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse {config_path}: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env_defaults(),
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Configuration used when no file exists: defaults for a local sqlite store.
    fn from_env_defaults() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://koperasi.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            session: SessionConfig {
                secret: "change-me-in-production".to_string(),
                expires_in: 86_400,
                cookie_name: default_cookie_name(),
                cookie_secure: false,
            },
            uploads: UploadConfig::default(),
            checkout: CheckoutConfig::default(),
            seed: SeedConfig::default(),
        }
    }

    // environment variables win over the file
    fn apply_env_overrides(&mut self) {
        fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
            env::var(name).ok().and_then(|v| v.parse::<T>().ok())
        }

        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = parsed("SERVER_PORT") {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = parsed("DB_MAX_CONNECTIONS") {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.session.secret = v;
        }
        if let Some(n) = parsed("SESSION_EXPIRES_IN") {
            self.session.expires_in = n;
        }
        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.uploads.dir = v;
        }
        if let Some(n) = parsed("UPLOAD_MAX_BYTES") {
            self.uploads.max_bytes = n;
        }
        if let Some(b) = parsed("CHECKOUT_TRUST_CLIENT_PRICES") {
            self.checkout.trust_client_prices = b;
        }
        if let Some(b) = parsed("CHECKOUT_ALLOW_OVERSELL") {
            self.checkout.allow_oversell = b;
        }
        if let Ok(v) = env::var("SEED_ADMIN_USERNAME") {
            self.seed.admin_username = v;
        }
        if let Ok(v) = env::var("SEED_ADMIN_PASSWORD") {
            self.seed.admin_password = v;
        }
        if let Ok(v) = env::var("SEED_ADMIN_NAME") {
            self.seed.admin_name = v;
        }
        if let Some(b) = parsed("SEED_SAMPLE_PRODUCTS") {
            self.seed.sample_products = b;
        }
    }
}
