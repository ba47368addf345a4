//! Configuration management for remedy
//!
//! Stores settings in ~/.config/remedy/config.json

use remedy_core::util::debug_stderr_enabled;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_python_bin() -> String {
    "python3".to_string()
}

fn default_file_timeout_secs() -> u64 {
    30
}

fn default_trials() -> u32 {
    10
}

fn default_iterations() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
    #[serde(default = "default_file_timeout_secs")]
    pub file_timeout_secs: u64,
    #[serde(default = "default_trials")]
    pub trials: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            python_bin: default_python_bin(),
            file_timeout_secs: default_file_timeout_secs(),
            trials: default_trials(),
            iterations: default_iterations(),
        }
    }
}

impl Config {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("remedy"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str::<Config>(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        preserve_corrupt_config(&path, &content);
                        if debug_stderr_enabled() {
                            eprintln!(
                                "  Warning: Config file was corrupted ({}). A backup was saved and defaults were loaded.",
                                err
                            );
                        }
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        let dir =
            Self::config_dir().ok_or_else(|| "Could not determine config directory".to_string())?;

        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let path = dir.join("config.json");
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;
        Ok(())
    }

    /// Get the OpenRouter API key from the environment.
    pub fn get_api_key(&self) -> Option<String> {
        std::env::var("OPENROUTER_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENROUTER_API_TOKEN").ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/remedy/config.json".to_string())
    }
}

fn preserve_corrupt_config(path: &std::path::Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_round_trip() {
        let config = Config::default();
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: Config = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.model, config.model);
        assert_eq!(decoded.trials, config.trials);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let partial = r#"{"model":"openai/gpt-4o"}"#;
        let parsed: Config = serde_json::from_str(partial).unwrap();
        assert_eq!(parsed.model, "openai/gpt-4o");
        assert_eq!(parsed.python_bin, "python3");
        assert_eq!(parsed.file_timeout_secs, 30);
    }

    #[test]
    fn test_config_location_names_the_remedy_file() {
        let location = Config::config_location();
        assert!(location.ends_with("config.json"));
        assert!(location.contains("remedy"));
    }

    #[test]
    fn test_empty_object_is_all_defaults() {
        let parsed: Config = serde_json::from_str("{}").unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.model, defaults.model);
        assert_eq!(parsed.iterations, defaults.iterations);
    }
}
