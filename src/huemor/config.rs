use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Falls back to the OPENAI_API_KEY environment variable when empty.
    #[serde(default)]
    pub openai_api_key: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Upper bound on a single joke request.
    #[serde(default = "default_joke_timeout_ms")]
    pub joke_timeout_ms: u64,

    #[serde(default = "default_static_serving_dir")]
    pub static_serving_dir: PathBuf,

    #[serde(default = "default_serving_addr")]
    pub serving_addr: String,
}

fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}

fn default_joke_timeout_ms() -> u64 {
    15 * 1000
}

fn default_static_serving_dir() -> PathBuf {
    "ui/dist".into()
}

fn default_serving_addr() -> String {
    "0.0.0.0:3000".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: Default::default(),
            openai_model: default_openai_model(),
            joke_timeout_ms: default_joke_timeout_ms(),
            static_serving_dir: default_static_serving_dir(),
            serving_addr: default_serving_addr(),
        }
    }
}

impl Config {
    pub fn effective_openai_api_key(&self) -> String {
        if !self.openai_api_key.is_empty() {
            return self.openai_api_key.clone();
        }
        env::var("OPENAI_API_KEY").unwrap_or_default()
    }

    pub fn joke_timeout(&self) -> Duration {
        Duration::from_millis(self.joke_timeout_ms)
    }
}
