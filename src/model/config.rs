use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    pub notes: NotesConfig,
    pub hotkeys: HotkeyConfig,
    pub indicator: IndicatorConfig,
    pub dialog: DialogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotesConfig {
    pub max_text_len: usize,
    pub preview_width: usize,
}

/// Host scan codes for the plugin's hotkeys. The host delivers raw codes;
/// matching happens in the dispatcher.
#[derive(Debug, Clone, Deserialize)]
pub struct HotkeyConfig {
    pub edit_key: u32,
    pub list_key: u32,
    pub nav_keys: Vec<u32>,
    pub pointer_primary: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    pub hint_add: String,
    pub hint_edit: String,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub font_scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogConfig {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    pub alignment: String,
}

impl PluginConfig {
    /// Load configuration with layering: built-in defaults → user config.
    pub fn load() -> Result<Self> {
        let defaults = include_str!("../../config/default.toml");
        let mut config: PluginConfig = toml::from_str(defaults)?;

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "quest-notes") {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                config = Self::load_from(&config_path)?;
            }
        }

        config.clamp();
        Ok(config)
    }

    /// Load from an explicit path (user override, tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let mut config: PluginConfig = toml::from_str(&raw)?;
        config.clamp();
        Ok(config)
    }

    /// Force every numeric value into its documented range. Out-of-range
    /// user values are usable after clamping, not rejected.
    fn clamp(&mut self) {
        self.notes.max_text_len = self.notes.max_text_len.clamp(1, 4096);
        self.notes.preview_width = self.notes.preview_width.clamp(8, 120);
        self.indicator.anchor_x = self.indicator.anchor_x.clamp(0.0, 1.0);
        self.indicator.anchor_y = self.indicator.anchor_y.clamp(0.0, 1.0);
        self.indicator.font_scale = self.indicator.font_scale.clamp(0.5, 3.0);
        self.dialog.width = self.dialog.width.clamp(100, 4096);
        self.dialog.height = self.dialog.height.clamp(100, 4096);
        self.dialog.font_size = self.dialog.font_size.clamp(8, 72);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn built_in_defaults_parse() {
        let config: PluginConfig =
            toml::from_str(include_str!("../../config/default.toml")).expect("defaults parse");
        assert_eq!(config.notes.max_text_len, 1024);
        assert_eq!(config.hotkeys.nav_keys.len(), 4);
        assert_eq!(config.indicator.hint_add, "[Y] Add note");
    }

    #[test]
    fn user_config_values_are_clamped() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"
[notes]
max_text_len = 99999
preview_width = 2

[hotkeys]
edit_key = 21
list_key = 38
nav_keys = [1, 2]
pointer_primary = 0

[indicator]
hint_add = "add"
hint_edit = "edit"
anchor_x = 7.0
anchor_y = -1.0
font_scale = 10.0

[dialog]
width = 10
height = 9999999
font_size = 1
alignment = "center"
"#
        )
        .expect("write temp config");

        let config = PluginConfig::load_from(file.path()).expect("load");
        assert_eq!(config.notes.max_text_len, 4096);
        assert_eq!(config.notes.preview_width, 8);
        assert_eq!(config.indicator.anchor_x, 1.0);
        assert_eq!(config.indicator.anchor_y, 0.0);
        assert_eq!(config.dialog.width, 100);
        assert_eq!(config.dialog.height, 4096);
        assert_eq!(config.dialog.font_size, 8);
    }
}
