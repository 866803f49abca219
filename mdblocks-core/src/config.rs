//! Configuration management for mdblocks

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeVariant,
    pub editor: EditorConfig,
    pub render: RenderConfig,
    pub link_preview: LinkPreviewConfig,
    pub clipboard: ClipboardConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeVariant {
    Dark,
    Light,
}

/// Editing session timing and history limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_limit: usize,
    pub history_debounce_ms: u64,
    pub blur_grace_ms: u64,
    pub split_focus_frames: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub allow_raw_html: bool,
    pub highlight_cache_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkPreviewConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    pub notification_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemeVariant::Dark,
            editor: EditorConfig::default(),
            render: RenderConfig::default(),
            link_preview: LinkPreviewConfig::default(),
            clipboard: ClipboardConfig::default(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            history_debounce_ms: 500,
            blur_grace_ms: 50,
            split_focus_frames: 2,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            allow_raw_html: false,
            highlight_cache_size: 128,
        }
    }
}

impl Default for LinkPreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 5,
            user_agent: "Mozilla/5.0 (compatible; mdblocks/0.1; +link-preview)".to_string(),
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            notification_ms: 2000,
        }
    }
}

impl EditorConfig {
    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history_debounce_ms)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}

impl LinkPreviewConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ClipboardConfig {
    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mdblocks")
            .map(|proj_dirs| proj_dirs.config_dir().join("mdblocks.toml"))
    }

    /// Load configuration from file, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from a specific path (for testing)
    pub fn load_from(path: &Path) -> Result<Self> {
        check_permissions(path)?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

/// Refuse config files anyone can write to (Unix only)
fn check_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat config file: {}", path.display()))?;
        if metadata.permissions().mode() & 0o002 != 0 {
            anyhow::bail!(
                "Config file {} is world-writable (insecure permissions)",
                path.display()
            );
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme, ThemeVariant::Dark);
        assert_eq!(config.editor.history_limit, 100);
        assert_eq!(config.editor.history_debounce(), Duration::from_millis(500));
        assert_eq!(config.editor.blur_grace(), Duration::from_millis(50));
        assert_eq!(config.editor.split_focus_frames, 2);
        assert!(!config.render.allow_raw_html);
        assert!(config.link_preview.enabled);
        assert_eq!(config.link_preview.timeout(), Duration::from_secs(5));
        assert_eq!(config.clipboard.notification(), Duration::from_millis(2000));
    }

    #[test]
    fn test_load_valid_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        let toml_content = "theme = \"Light\"\n\
\n\
[editor]\n\
history_limit = 20\n\
history_debounce_ms = 250\n\
blur_grace_ms = 80\n\
split_focus_frames = 3\n\
\n\
[render]\n\
allow_raw_html = true\n\
highlight_cache_size = 16\n\
\n\
[link_preview]\n\
enabled = false\n\
timeout_secs = 2\n\
user_agent = \"test-agent\"\n\
\n\
[clipboard]\n\
notification_ms = 1000\n";

        file.write_all(toml_content.as_bytes())?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.theme, ThemeVariant::Light);
        assert_eq!(config.editor.history_limit, 20);
        assert_eq!(config.editor.history_debounce_ms, 250);
        assert_eq!(config.editor.blur_grace_ms, 80);
        assert_eq!(config.editor.split_focus_frames, 3);
        assert!(config.render.allow_raw_html);
        assert_eq!(config.render.highlight_cache_size, 16);
        assert!(!config.link_preview.enabled);
        assert_eq!(config.link_preview.user_agent, "test-agent");
        assert_eq!(config.clipboard.notification_ms, 1000);

        Ok(())
    }

    #[test]
    fn test_load_partial_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"[editor]\nhistory_limit = 5\n")?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.theme, ThemeVariant::Dark);
        assert_eq!(config.editor.history_limit, 5);
        assert_eq!(config.editor.history_debounce_ms, 500);
        assert_eq!(config.render.highlight_cache_size, 128);

        Ok(())
    }

    #[test]
    fn test_load_invalid_toml_returns_error() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"invalid toml [[[syntax")?;

        let result = Config::load_from(file.path());
        assert!(result.is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_world_writable_config_is_rejected() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new()?;
        file.write_all(b"theme = \"Dark\"\n")?;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o666))?;

        let err = Config::load_from(file.path()).err();
        assert!(err.is_some_and(|e| e.to_string().contains("world-writable")));
        Ok(())
    }

    #[test]
    fn test_config_path_returns_some() {
        let path = Config::config_path();
        assert!(path.is_some());
        if let Some(p) = path {
            assert!(p.to_string_lossy().contains("mdblocks"));
            assert!(p.to_string_lossy().ends_with("mdblocks.toml"));
        }
    }

    #[test]
    fn test_theme_variant_serialization() -> Result<()> {
        let config = Config {
            theme: ThemeVariant::Light,
            ..Default::default()
        };

        let toml_str = toml::to_string(&config)?;
        assert!(toml_str.contains("Light"));

        let parsed: Config = toml::from_str(&toml_str)?;
        assert_eq!(parsed.theme, ThemeVariant::Light);

        Ok(())
    }
}
