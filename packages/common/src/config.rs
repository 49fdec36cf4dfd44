use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;

/// Characters escaped in the user and password of a connection URL.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Postgres connection settings shared by the server and the ingester.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the individual fields.
    #[serde(default)]
    pub url: Option<String>,
    /// Default: "localhost".
    #[serde(default = "default_db_host")]
    pub host: String,
    /// Default: 5432.
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// Database name. Default: "ztfref".
    #[serde(default = "default_db_name")]
    pub name: String,
    /// Default: "app".
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Pool size. Default: 10.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Default: 8.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Default: 8.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_db_host() -> String {
    "localhost".into()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_name() -> String {
    "ztfref".into()
}
fn default_db_user() -> String {
    "app".into()
}
fn default_max_connections() -> u32 {
    10
}
fn default_connect_timeout_secs() -> u64 {
    8
}
fn default_acquire_timeout_secs() -> u64 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: default_db_user(),
            password: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let user = utf8_percent_encode(&self.user, USERINFO);
        let credentials = match &self.password {
            Some(password) => format!("{user}:{}", utf8_percent_encode(password, USERINFO)),
            None => user.to_string(),
        };
        format!(
            "postgres://{credentials}@{}:{}/{}",
            self.host, self.port, self.name
        )
    }

    /// Connection URL with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        match &self.url {
            Some(_) => "<configured url>".to_string(),
            None => format!(
                "postgres://{}@{}:{}/{}",
                self.user, self.host, self.port, self.name
            ),
        }
    }
}
