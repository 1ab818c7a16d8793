//! Test configuration builder writing `main.toml` into a temp directory

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestConfigBuilder {
    temp_dir: TempDir,
    lines: Vec<String>,
    reference: Vec<String>,
}

pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_path: PathBuf,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            lines: Vec::new(),
            reference: Vec::new(),
        }
    }

    /// Top-level `key = value`, `value` given as TOML
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.lines.push(format!("{} = {}", key, value));
        self
    }

    /// `[reference]` table entry, `value` given as TOML
    pub fn with_reference(mut self, key: &str, value: &str) -> Self {
        self.reference.push(format!("{} = {}", key, value));
        self
    }

    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        let mut toml = self.lines.join("\n");
        if !self.reference.is_empty() {
            toml.push_str("\n\n[reference]\n");
            toml.push_str(&self.reference.join("\n"));
        }
        toml.push('\n');

        let config_path = config_dir.join("main.toml");
        fs::write(&config_path, toml).expect("Failed to write main.toml");

        TestConfig {
            _temp_dir: self.temp_dir,
            config_path,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
