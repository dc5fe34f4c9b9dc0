//! Path utilities.
//!
//! ```text
//! ~
//!  ├── .aws
//!  │    └── config            <- generated profiles land here
//!  └── .ssoprofile
//!       └── config.yaml       <- generator settings
//! ```
//!
//! The AWS config location can be overridden with `AWS_CONFIG_FILE`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;

/// Environment variable the AWS tooling reads the config location from.
pub const AWS_CONFIG_FILE_ENV: &str = "AWS_CONFIG_FILE";

lazy_static! {
    static ref AWS_DIR: PathBuf = PathBuf::from(".aws");
    static ref AWS_CFG: PathBuf = PathBuf::from("config");
    static ref SETTINGS_DIR: PathBuf = PathBuf::from(".ssoprofile");
    static ref SETTINGS_CFG: PathBuf = PathBuf::from("config.yaml");
}

fn home() -> Result<PathBuf> {
    home_dir().ok_or_else(|| anyhow!("unable to find the home directory"))
}

/// Path of the AWS config file that profiles are written to.
pub fn aws_config_path() -> Result<PathBuf> {
    resolve_aws_config(std::env::var_os(AWS_CONFIG_FILE_ENV), home_dir())
}

fn resolve_aws_config(env_value: Option<OsString>, home: Option<PathBuf>) -> Result<PathBuf> {
    match env_value.filter(|v| !v.is_empty()) {
        Some(path) => Ok(PathBuf::from(path)),
        None => home
            .map(|h| h.join(AWS_DIR.as_path()).join(AWS_CFG.as_path()))
            .ok_or_else(|| anyhow!("unable to find the home directory")),
    }
}

/// Path for the generator settings.
pub fn settings_path() -> Result<PathBuf> {
    Ok(home()?
        .join(SETTINGS_DIR.as_path())
        .join(SETTINGS_CFG.as_path()))
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home()?.join(rest)),
        Err(_) => Ok(path.to_owned()),
    }
}
