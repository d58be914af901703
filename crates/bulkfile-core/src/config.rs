//! Configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Notification channel used for file operations unless configured otherwise.
pub const DEFAULT_CHANNEL: &str = "files";

/// Text shown by the confirmation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPrompt {
    pub title: String,
    pub body: String,
    /// Label of the accepting button.
    pub confirm_label: String,
}

impl ConfirmationPrompt {
    /// Prompt shown before a bulk delete.
    pub fn delete_files() -> Self {
        Self {
            title: "Delete these files?".to_string(),
            body: "Deleting files is a permanent operation, you cannot undo this action."
                .to_string(),
            confirm_label: "Yes, Delete Files".to_string(),
        }
    }
}

impl Default for ConfirmationPrompt {
    fn default() -> Self {
        Self::delete_files()
    }
}

/// Configuration for the bulk operation orchestrator.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OrchestratorConfig {
    /// Notification channel errors are reported on.
    #[builder(default = "DEFAULT_CHANNEL.to_string()")]
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Prompt shown before destructive operations.
    #[builder(default)]
    #[serde(default)]
    pub delete_prompt: ConfirmationPrompt,
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

impl OrchestratorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref channel) = self.channel {
            if channel.trim().is_empty() {
                return Err("Notification channel cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl OrchestratorConfig {
    /// Create a new orchestrator config builder.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            delete_prompt: ConfirmationPrompt::default(),
        }
    }
}

/// Configuration for the local-disk gateway.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct LocalGatewayConfig {
    /// Directory that acts as the store root. All paths resolve under it.
    pub root: PathBuf,

    /// Move deleted entries to the OS trash instead of removing them.
    #[builder(default = "false")]
    #[serde(default)]
    pub use_trash: bool,

    /// File name prefix for created archives.
    #[builder(default = "default_archive_prefix()")]
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,
}

fn default_archive_prefix() -> String {
    "archive".to_string()
}

impl LocalGatewayConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if let Some(ref prefix) = self.archive_prefix {
            if prefix.is_empty() || prefix.contains(['/', '\\']) {
                return Err(format!("Invalid archive prefix: {prefix:?}"));
            }
        }
        Ok(())
    }
}

impl LocalGatewayConfig {
    /// Create a new gateway config builder.
    pub fn builder() -> LocalGatewayConfigBuilder {
        LocalGatewayConfigBuilder::default()
    }

    /// Create a simple config rooted at a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            use_trash: false,
            archive_prefix: default_archive_prefix(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub gateway: Option<LocalGatewayConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_builder_defaults() {
        let config = OrchestratorConfig::builder().build().unwrap();
        assert_eq!(config.channel, "files");
        assert_eq!(config.delete_prompt.confirm_label, "Yes, Delete Files");
    }

    #[test]
    fn test_orchestrator_builder_rejects_blank_channel() {
        assert!(OrchestratorConfig::builder().channel("  ").build().is_err());
    }

    #[test]
    fn test_gateway_builder() {
        let config = LocalGatewayConfig::builder()
            .root("/srv/data")
            .use_trash(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/srv/data"));
        assert!(config.use_trash);
        assert_eq!(config.archive_prefix, "archive");
    }

    #[test]
    fn test_gateway_builder_requires_root() {
        assert!(LocalGatewayConfig::builder().build().is_err());
        assert!(LocalGatewayConfig::builder().root("").build().is_err());
        assert!(
            LocalGatewayConfig::builder()
                .root("/srv")
                .archive_prefix("a/b")
                .build()
                .is_err()
        );
    }
}
