//! Read profiles from a YAML or JSON file.
//!
//! The file holds a list of profile records:
//!
//! ```yaml
//! - sso_start_url: https://example.awsapps.com/start
//!   sso_region: ap-southeast-2
//!   account_id: "123456789012"
//!   account_name: prod
//!   role_name: DevRole
//!   region: us-west-2
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use yaml_peg::serde as yaml;

use crate::logging::debug;
use crate::profile::SsoProfile;
use crate::source::Source;

/// Origin tag for profiles that don't carry their own.
pub const DEFAULT_FILE_ORIGIN: &str = "file";

/// A source backed by a profile list on disk.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    origin: String,
}

impl FileSource {
    /// Read profiles from `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            origin: DEFAULT_FILE_ORIGIN.to_owned(),
        }
    }

    /// Use a different origin tag for profiles without one.
    pub fn with_origin<S: Into<String>>(mut self, origin: S) -> Self {
        self.origin = origin.into();
        self
    }
}

/// Parse a profile list. `.json` files are read as JSON, anything else as YAML.
pub fn parse_profiles(path: &Path, raw: &str) -> Result<Vec<SsoProfile>> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        return serde_json::from_str(raw).context("deserializing profiles");
    }
    let mut docs =
        yaml::from_str::<Vec<SsoProfile>>(raw).context("deserializing profiles")?;
    // an empty file has no documents at all
    Ok(if docs.is_empty() {
        vec![]
    } else {
        docs.swap_remove(0)
    })
}

#[async_trait]
impl Source for FileSource {
    fn name(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn get_profiles(&self, ctx: &CancellationToken) -> Result<Vec<SsoProfile>> {
        let raw = tokio::select! {
            biased;
            _ = ctx.cancelled() => bail!("cancelled before reading {}", self.path.display()),
            raw = tokio::fs::read_to_string(&self.path) => raw
                .with_context(|| format!("reading profiles from {}", self.path.display()))?,
        };

        let mut profiles = parse_profiles(&self.path, &raw)
            .with_context(|| format!("parsing profiles from {}", self.path.display()))?;
        for profile in profiles.iter_mut().filter(|p| p.generated_from.is_empty()) {
            profile.generated_from = self.origin.to_owned();
        }

        debug!("read {} profiles from {}", profiles.len(), self.path.display());
        Ok(profiles)
    }
}
