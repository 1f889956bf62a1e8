use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "formbind.config.json";

/// formbind configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Nesting limit for expressions
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Document used when an expression names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_document: Option<String>,

    #[serde(default = "default_language")]
    pub language: String,

    /// Fail instead of falling back to the default value
    #[serde(default)]
    pub error_as_exception: bool,

    /// Text resource file used by `text` and option labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_resources: Option<String>,
}

fn default_max_depth() -> usize {
    formbind_evaluator::DEFAULT_MAX_DEPTH
}

fn default_language() -> String {
    "nb".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Text resource file relative to `cwd`
    pub fn get_text_resources(&self, cwd: &str) -> Option<PathBuf> {
        self.text_resources
            .as_ref()
            .map(|path| PathBuf::from(cwd).join(path))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            default_document: None,
            language: default_language(),
            error_as_exception: false,
            text_resources: None,
        }
    }
}
