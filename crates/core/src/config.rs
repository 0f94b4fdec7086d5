use crate::error::RenameError;
use crate::template::{validate_extension, validate_mask};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DST_MASK: &str = "%Y%m%d_%H%M%S";
pub const DEFAULT_EXT_MASK: &str = ".jpg";
pub const DEFAULT_REF_FILE: &str = "names.log";
pub const DEFAULT_SRC_MASK: &str = "DSCF*.JPG";

/// Whether `IMG.JPG` and `img.jpg` name the same file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NameFolding {
    Sensitive,
    Insensitive,
}

impl NameFolding {
    pub fn host() -> Self {
        if cfg!(windows) {
            NameFolding::Insensitive
        } else {
            NameFolding::Sensitive
        }
    }

    pub fn fold(self, name: &str) -> String {
        match self {
            NameFolding::Sensitive => name.to_string(),
            NameFolding::Insensitive => name.to_lowercase(),
        }
    }

    pub fn same(self, a: &str, b: &str) -> bool {
        match self {
            NameFolding::Sensitive => a == b,
            NameFolding::Insensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }
}

impl Default for NameFolding {
    fn default() -> Self {
        NameFolding::host()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryPolicy {
    #[default]
    Skip,
    Recurse,
}

#[derive(Debug, Clone)]
pub struct RenamerConfig {
    pub folder: PathBuf,
    pub dst_mask: String,
    pub ext_mask: String,
    pub ref_file: String,
    pub src_mask: String,
    pub folding: NameFolding,
    pub directory_policy: DirectoryPolicy,
}

impl RenamerConfig {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            dst_mask: DEFAULT_DST_MASK.to_string(),
            ext_mask: DEFAULT_EXT_MASK.to_string(),
            ref_file: DEFAULT_REF_FILE.to_string(),
            src_mask: DEFAULT_SRC_MASK.to_string(),
            folding: NameFolding::host(),
            directory_policy: DirectoryPolicy::Skip,
        }
    }

    pub fn for_folder(&self, folder: &Path) -> Self {
        Self {
            folder: folder.to_path_buf(),
            ..self.clone()
        }
    }

    pub fn ref_path(&self) -> PathBuf {
        self.folder.join(&self.ref_file)
    }

    pub fn validate(&self) -> Result<(), RenameError> {
        validate_mask(&self.dst_mask)?;
        validate_extension(&self.ext_mask)?;
        if !self.folder.is_dir() {
            return Err(RenameError::io(
                &self.folder,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
        let ref_is_bare = Path::new(&self.ref_file)
            .file_name()
            .is_some_and(|name| name == self.ref_file.as_str());
        if !ref_is_bare {
            return Err(RenameError::io(
                self.ref_path(),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "the names log must be a plain file name",
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunOptions {
    /// Minutes added to every capture time; fractions are allowed.
    pub delta: f64,
    pub debug: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub dst_mask: String,
    pub ext_mask: String,
    pub ref_file: String,
    pub src_mask: String,
    pub directory_policy: DirectoryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dst_mask: DEFAULT_DST_MASK.to_string(),
            ext_mask: DEFAULT_EXT_MASK.to_string(),
            ref_file: DEFAULT_REF_FILE.to_string(),
            src_mask: DEFAULT_SRC_MASK.to_string(),
            directory_policy: DirectoryPolicy::Skip,
        }
    }
}

impl AppConfig {
    pub fn renamer_config(&self, folder: impl Into<PathBuf>) -> RenamerConfig {
        RenamerConfig {
            folder: folder.into(),
            dst_mask: self.dst_mask.clone(),
            ext_mask: self.ext_mask.clone(),
            ref_file: self.ref_file.clone(),
            src_mask: self.src_mask.clone(),
            folding: NameFolding::host(),
            directory_policy: self.directory_policy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("org", "imgren", "imgren")
        .context("cannot locate the user configuration directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    load_config_from(&paths.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read configuration file {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("cannot parse configuration file {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    save_config_to(config, &paths.config_path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| {
            format!("cannot create configuration directory {}", dir.display())
        })?;
    }
    let body = toml::to_string_pretty(config).context("cannot serialize configuration")?;
    fs::write(path, body)
        .with_context(|| format!("cannot write configuration file {}", path.display()))?;
    Ok(())
}
