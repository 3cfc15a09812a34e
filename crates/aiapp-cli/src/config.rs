use aiapp_relay::AppProfile;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// CLI configuration; shares the server's `aiapp.toml` (the `[server]`
/// section is simply ignored here).
#[derive(Debug, Deserialize, Default)]
pub struct CliConfig {
    #[serde(default)]
    pub dify: DifySection,
    #[serde(default)]
    pub apps: Vec<AppProfile>,
}

#[derive(Debug, Deserialize)]
pub struct DifySection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for DifySection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5001/v1".to_string()
}

impl CliConfig {
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let path = path.unwrap_or("aiapp.toml");
        if !Path::new(path).exists() {
            anyhow::bail!(
                "config file '{}' not found; create one with a [dify] section and [[apps]] entries",
                path
            );
        }

        let contents = fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
        let parsed: CliConfig = toml::from_str(&contents)
            .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
        Ok(parsed)
    }

    pub fn find_app(&self, id: &str) -> Option<&AppProfile> {
        self.apps.iter().find(|app| app.id == id)
    }
}
