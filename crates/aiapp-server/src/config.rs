use aiapp_relay::AppProfile;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dify_base_url: String,
    pub apps: Vec<AppProfile>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    dify: DifySection,
    #[serde(default)]
    apps: Vec<AppProfile>,
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

#[derive(Debug, Deserialize)]
struct DifySection {
    #[serde(default = "default_dify_base_url")]
    base_url: String,
}

impl Default for DifySection {
    fn default() -> Self {
        Self {
            base_url: default_dify_base_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8087
}

fn default_dify_base_url() -> String {
    "http://127.0.0.1:5001/v1".to_string()
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(Self {
                host: file_config.server.host,
                port: file_config.server.port,
                dify_base_url: file_config.dify.base_url,
                apps: file_config.apps,
            });
        }

        Ok(Self::from_env())
    }

    fn from_env() -> Self {
        let host = env::var("AIAPP_SERVER_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("AIAPP_SERVER_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let dify_base_url =
            env::var("AIAPP_DIFY_BASE_URL").unwrap_or_else(|_| default_dify_base_url());

        Self {
            host,
            port,
            dify_base_url,
            apps: Vec::new(),
        }
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("AIAPP_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("aiapp.toml").exists() {
        Some("aiapp.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aiapp_relay::AppKind;

    #[test]
    fn full_config_parses() {
        let parsed: FileConfig = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [dify]
            base_url = "http://dify.internal/v1"

            [[apps]]
            id = "writer"
            name = "Writing Helper"
            kind = "chat"
            api_key = "app-secret"
            description = "drafts text"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.dify.base_url, "http://dify.internal/v1");
        assert_eq!(parsed.apps.len(), 1);
        assert_eq!(parsed.apps[0].kind, AppKind::Chat);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let parsed: FileConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.server.host, "0.0.0.0");
        assert_eq!(parsed.server.port, 8087);
        assert!(parsed.apps.is_empty());
    }
}
