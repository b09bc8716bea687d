//! Common test utilities for Tripsmith integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Path to the tripsmith binary
pub fn bin_path() -> PathBuf {
    env!("CARGO_BIN_EXE_tripsmith").into()
}

/// Isolated home directory with no credentials leaking in from the host
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".tripsmith");

        Ok(Self { temp_dir, data_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Command with HOME pointed at the test environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tripsmith"));
        cmd.env("HOME", self.temp_dir.path());
        for key in [
            "LLM_API_KEY",
            "LLM_BASE_URL",
            "LLM_MODEL_ID",
            "AMAP_API_KEY",
            "UNSPLASH_ACCESS_KEY",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    /// Write a config with the given gateway settings
    pub fn create_config(&self, api_key: &str, api_base: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let config = serde_json::json!({
            "provider": {
                "api_key": api_key,
                "api_base": api_base,
                "model": "test-model"
            },
            "agent": {"max_iterations": 3}
        });
        std::fs::write(self.config_file(), serde_json::to_string_pretty(&config)?)?;
        Ok(())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
