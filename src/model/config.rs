use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub wallpaper: WallpaperConfig,
    pub kwin_script: KwinScriptConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WallpaperConfig {
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KwinScriptConfig {
    pub source: PathBuf,
    /// Where the packaged archive is written. Defaults to `dist/` next to the source tree.
    #[serde(default)]
    pub dist_dir: Option<PathBuf>,
    pub package_kind: String,
    pub archive_extension: String,
    pub config_file: String,
}

/// External programs invoked by the install and restart pipelines.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    pub package_tool: String,
    pub archiver: String,
    pub config_writer: String,
    pub ipc_tool: String,
    pub ipc_service: String,
    pub ipc_object: String,
    pub restart_command: String,
}

/// Values supplied on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub wallpaper_source: Option<PathBuf>,
    pub wallpaper_target: Option<PathBuf>,
    pub kwin_script_source: Option<PathBuf>,
    pub dist_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config (or `explicit`).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|path| path.exists()),
        };

        let user_str = match &user_path {
            Some(path) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?,
            ),
            None => None,
        };

        let config = Self::from_layers(DEFAULTS, user_str.as_deref())?;
        tracing::debug!(user_config = ?user_path, "configuration loaded");
        Ok(config)
    }

    /// Deep-merges `user` over `defaults`; tables merge key by key, everything else replaces.
    pub fn from_layers(defaults: &str, user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Table =
            toml::from_str(defaults).context("failed to parse built-in defaults")?;

        if let Some(user) = user {
            let overlay: toml::Table = toml::from_str(user).context("failed to parse user config")?;
            merge_tables(&mut merged, overlay);
        }

        let mut config: AppConfig = toml::Value::Table(merged)
            .try_into()
            .context("invalid configuration")?;
        config.expand_paths();
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(path) = &overrides.wallpaper_source {
            self.wallpaper.source = expand_tilde(path);
        }
        if let Some(path) = &overrides.wallpaper_target {
            self.wallpaper.target = expand_tilde(path);
        }
        if let Some(path) = &overrides.kwin_script_source {
            self.kwin_script.source = expand_tilde(path);
        }
        if let Some(path) = &overrides.dist_dir {
            self.kwin_script.dist_dir = Some(expand_tilde(path));
        }
        self
    }

    /// Directory that receives the packaged KWin script.
    ///
    /// Without `dist_dir` this is `dist/` inside the source tree's full parent
    /// path. The old install script used only the parent's final component,
    /// relative to the working directory; the two agree for relative sources
    /// such as the default, but differ for absolute ones.
    pub fn build_target(&self) -> PathBuf {
        if let Some(dist_dir) = &self.kwin_script.dist_dir {
            return dist_dir.clone();
        }

        self.kwin_script
            .source
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join("dist")
    }

    fn expand_paths(&mut self) {
        self.wallpaper.source = expand_tilde(&self.wallpaper.source);
        self.wallpaper.target = expand_tilde(&self.wallpaper.target);
        self.kwin_script.source = expand_tilde(&self.kwin_script.source);
        self.kwin_script.dist_dir = self.kwin_script.dist_dir.as_deref().map(expand_tilde);
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn defaults() -> Self {
        Self::from_layers(DEFAULTS, None).expect("built-in defaults parse")
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "plasma-deploy")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if !text.starts_with('~') {
        return path.to_path_buf();
    }

    if let Some(base_dirs) = directories::BaseDirs::new() {
        let home = base_dirs.home_dir().to_string_lossy();
        return PathBuf::from(text.replacen('~', &home, 1));
    }

    path.to_path_buf()
}
