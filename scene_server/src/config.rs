use std::{fmt::Display, path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ServerError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Asset endpoint and static files.
    pub http_port: u16,
    /// Control channel.
    pub ws_port: u16,
    pub flush_interval_ms: u64,
    /// Visibility groups that are never streamed.
    pub hidden_groups: Vec<i32>,
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            http_port: 5000,
            ws_port: 5001,
            flush_interval_ms: 33,
            hidden_groups: vec![3],
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Missing fields fall back to their defaults.
    pub fn from_json_str(value: &str) -> Result<Self, ServerError> {
        let config: ServerConfig =
            serde_json::from_str(value).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.flush_interval_ms == 0 {
            return Err(ServerError::Config(
                "flush_interval_ms must be at least 1".to_string(),
            ));
        }
        // Port 0 lets the OS pick, so two zeros do not collide.
        if self.http_port == self.ws_port && self.http_port != 0 {
            return Err(ServerError::Config(format!(
                "http_port and ws_port are both {}",
                self.http_port
            )));
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Web,
    Null,
}

impl FromStr for BackendKind {
    type Err = ServerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(BackendKind::Web),
            "null" | "none" => Ok(BackendKind::Null),
            other => Err(ServerError::Config(format!("unknown backend {other}"))),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Web => write!(f, "web"),
            BackendKind::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config = ServerConfig::from_json_str(r#"{ "http_port": 8080 }"#).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.ws_port, 5001);
        assert_eq!(config.flush_interval(), Duration::from_millis(33));
        assert_eq!(config.hidden_groups, [3]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ServerConfig::from_json_str(r#"{ "flush_interval_ms": 0 }"#),
            Err(ServerError::Config(_))
        ));
        assert!(matches!(
            ServerConfig::from_json_str(r#"{ "http_port": 7000, "ws_port": 7000 }"#),
            Err(ServerError::Config(_))
        ));
        assert!(ServerConfig::from_json_str(r#"{ "http_port": 0, "ws_port": 0 }"#).is_ok());
        assert!(ServerConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn backend_names() {
        assert_eq!("Web".parse::<BackendKind>().unwrap(), BackendKind::Web);
        assert_eq!("null".parse::<BackendKind>().unwrap(), BackendKind::Null);
        assert!("vulkan".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::default().to_string(), "web");
    }
}
