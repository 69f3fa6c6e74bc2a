use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub ollama_url: String,
    pub ollama_model: String,
    pub caption_model: String,
    pub openai_api_key: String,
    pub log_file: PathBuf,
    pub images_dir: PathBuf,
    pub context_turns: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3".to_string(),
            caption_model: "llava".to_string(),
            openai_api_key: String::new(),
            log_file: PathBuf::from("chat_log.md"),
            images_dir: PathBuf::from("saved_images"),
            context_turns: 10,
        }
    }
}

impl AppConfig {
    pub fn load(app_data: &Path) -> Self {
        let config_path = app_data.join("config.json");
        let mut config = if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => Self::default(),
            }
        } else {
            let c = Self::default();
            c.save(app_data);
            c
        };

        // Override with environment variable if set (more secure than hardcoding)
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                config.openai_api_key = key;
            }
        }

        config
    }

    pub fn save(&self, app_data: &Path) {
        let config_path = app_data.join("config.json");
        if let Ok(content) = serde_json::to_string_pretty(self) {
            std::fs::write(config_path, content).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.ollama_model = "mistral".to_string();
        config.context_turns = 4;
        config.save(dir.path());

        let loaded = AppConfig::load(dir.path());
        assert_eq!(loaded.ollama_model, "mistral");
        assert_eq!(loaded.context_turns, 4);
    }

    #[test]
    fn first_run_writes_the_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path());
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert!(dir.path().join("config.json").exists());
    }
}
