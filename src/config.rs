use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
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
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_token_expires_in")]
    pub expires_in: i64, // seconds
}

/// Outbound mail. SMTP is used when `smtp_host` is set, otherwise the
/// transactional HTTP API (Brevo-compatible JSON endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16, // 465 = implicit TLS, anything else STARTTLS
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default = "default_mail_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Falls back to `smtp_username` when empty.
    #[serde(default)]
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default = "default_mail_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Expected `aud` of incoming ID tokens; audience is not checked when empty.
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_tokeninfo_url")]
    pub tokeninfo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: i64,
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

fn default_token_expires_in() -> i64 {
    7 * 24 * 3600
}

fn default_smtp_port() -> u16 {
    465
}

fn default_mail_api_url() -> String {
    "https://api.brevo.com/v3/smtp/email".to_string()
}

fn default_mail_timeout_secs() -> u64 {
    10
}

fn default_tokeninfo_url() -> String {
    "https://oauth2.googleapis.com/tokeninfo".to_string()
}

fn default_code_ttl_minutes() -> i64 {
    15
}

fn default_purge_interval_secs() -> u64 {
    3600
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            api_url: default_mail_api_url(),
            api_key: String::new(),
            sender_email: String::new(),
            sender_name: Some("NutriSnap".to_string()),
            timeout_secs: default_mail_timeout_secs(),
        }
    }
}

impl MailConfig {
    pub fn uses_smtp(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }

    pub fn sender_address(&self) -> &str {
        match self.smtp_username.as_deref() {
            Some(user) if self.sender_email.is_empty() => user,
            _ => &self.sender_email,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tokeninfo_url: default_tokeninfo_url(),
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            code_ttl_minutes: default_code_ttl_minutes(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)
                .with_context(|| format!("failed to parse config file {config_path}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // No file: the environment must at least name the database
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    anyhow!("DATABASE_URL is not set and no config file was found at {config_path}")
                })?;

                Config {
                    server: ServerConfig {
                        host: "0.0.0.0".to_string(),
                        port: 3000,
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: 10,
                    },
                    jwt: JwtConfig {
                        secret: "change-me-in-production".to_string(),
                        expires_in: default_token_expires_in(),
                    },
                    mail: MailConfig::default(),
                    google: GoogleConfig::default(),
                    registration: RegistrationConfig::default(),
                }
            }
            Err(e) => {
                return Err(anyhow!("cannot read config file {config_path}: {e}"));
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = get_env("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = get_env_parse("SERVER_PORT") {
            self.server.port = p;
        }
        if let Some(v) = get_env("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = get_env_parse("DB_MAX_CONNECTIONS") {
            self.database.max_connections = mc;
        }
        if let Some(v) = get_env("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(n) = get_env_parse("JWT_EXPIRES_IN") {
            self.jwt.expires_in = n;
        }
        if let Some(v) = get_env("MAIL_SMTP_HOST") {
            self.mail.smtp_host = Some(v);
        }
        if let Some(p) = get_env_parse("MAIL_SMTP_PORT") {
            self.mail.smtp_port = p;
        }
        if let Some(v) = get_env("MAIL_SMTP_USERNAME") {
            self.mail.smtp_username = Some(v);
        }
        if let Some(v) = get_env("MAIL_SMTP_PASSWORD") {
            self.mail.smtp_password = Some(v);
        }
        if let Some(v) = get_env("MAIL_API_URL") {
            self.mail.api_url = v;
        }
        if let Some(v) = get_env("MAIL_API_KEY") {
            self.mail.api_key = v;
        }
        if let Some(v) = get_env("MAIL_SENDER_EMAIL") {
            self.mail.sender_email = v;
        }
        if let Some(v) = get_env("MAIL_SENDER_NAME") {
            self.mail.sender_name = Some(v);
        }
        if let Some(n) = get_env_parse("MAIL_TIMEOUT_SECS") {
            self.mail.timeout_secs = n;
        }
        if let Some(v) = get_env("GOOGLE_CLIENT_ID") {
            self.google.client_id = v;
        }
        if let Some(v) = get_env("GOOGLE_TOKENINFO_URL") {
            self.google.tokeninfo_url = v;
        }
        if let Some(n) = get_env_parse("REGISTRATION_CODE_TTL_MINUTES") {
            self.registration.code_ttl_minutes = n;
        }
        if let Some(n) = get_env_parse("REGISTRATION_PURGE_INTERVAL_SECS") {
            self.registration.purge_interval_secs = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [database]
            url = "postgres://localhost/nutrisnap"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.jwt.expires_in, 604_800);
        assert_eq!(config.registration.code_ttl_minutes, 15);
        assert_eq!(config.mail.timeout_secs, 10);
        assert!(config.google.client_id.is_empty());
    }

    #[test]
    fn test_mail_section_is_parsed() {
        let config = Config::from_toml_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 3000

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "x"
            expires_in = 60

            [mail]
            api_url = "http://mail.local/send"
            api_key = "key"
            sender_email = "no-reply@nutrisnap.app"
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.jwt.expires_in, 60);
        assert_eq!(config.mail.api_url, "http://mail.local/send");
        assert_eq!(config.mail.timeout_secs, 3);
        assert!(config.mail.sender_name.is_none());
        assert!(!config.mail.uses_smtp());
    }

    #[test]
    fn test_smtp_section_without_api_fields() {
        let config = Config::from_toml_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 3000

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "x"

            [mail]
            smtp_host = "smtp.gmail.com"
            smtp_username = "nutrisnap@gmail.com"
            smtp_password = "app-password"
            "#,
        )
        .unwrap();

        assert!(config.mail.uses_smtp());
        assert_eq!(config.mail.smtp_port, 465);
        assert_eq!(config.mail.sender_address(), "nutrisnap@gmail.com");
        assert!(config.mail.api_key.is_empty());
    }
}
