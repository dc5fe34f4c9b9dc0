//! Generator settings, read from `~/.ssoprofile/config.yaml`.
//!
//! ```yaml
//! prefix: "sso-"
//! profile_template: "{AccountName}/{RoleName}"
//! no_credential_process: false
//! prune_start_urls:
//!   - https://example.awsapps.com/start
//! sources:
//!   - type: file
//!     path: ~/profiles.yaml
//!     origin: inventory
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

use crate::generator::Generator;
use crate::merge::MergeOpts;
use crate::paths;
use crate::sources::FileSource;

/// Struct representing the settings file.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prepended to every generated profile name.
    #[serde(default)]
    pub prefix: String,
    /// Template for profile names. Empty means the default.
    #[serde(default)]
    pub profile_template: String,
    /// Write native SSO keys instead of a credential process.
    #[serde(default)]
    pub no_credential_process: bool,
    /// Generated sections for these start URLs are dropped before merging.
    #[serde(default)]
    pub prune_start_urls: Vec<String>,
    /// Where profiles come from.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Settings {
    /// Read settings from `path`.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading settings from {}", path.as_ref().display()))?;
        raw.parse()
    }

    /// Merge options described by these settings.
    pub fn merge_opts(&self) -> MergeOpts {
        MergeOpts {
            prefix: self.prefix.to_owned(),
            section_name_template: self.profile_template.to_owned(),
            no_credential_process: self.no_credential_process,
            prune_start_urls: self.prune_start_urls.to_owned(),
        }
    }

    /// Build a generator with every configured source registered.
    pub fn generator(&self) -> Result<Generator> {
        let mut generator = Generator::new(self.merge_opts());
        for source in &self.sources {
            match source.source_type.as_str() {
                "file" => generator.add_source(source.file_source()?),
                other => bail!("unknown source type {other:?}"),
            }
        }
        Ok(generator)
    }
}

impl std::str::FromStr for Settings {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let mut docs = yaml::from_str::<Settings>(raw).context("deserializing settings")?;
        // an empty file has no documents
        Ok(docs.pop().unwrap_or_default())
    }
}

/// Config for one source.
#[derive(Clone, Deserialize, Serialize, Default, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    /// The source type
    #[serde(rename = "type")]
    pub source_type: String,
    /// Additional configuration, specific to the source
    #[serde(flatten)]
    pub config: HashMap<String, String>,
}

impl SourceConfig {
    /// Basic constructor
    pub fn new(source_type: String, config: HashMap<String, String>) -> Self {
        Self {
            source_type,
            config,
        }
    }

    fn file_source(&self) -> Result<FileSource> {
        let path = self
            .config
            .get("path")
            .ok_or_else(|| anyhow!("file source is missing a path"))?;
        let source = FileSource::new(paths::expand_home(path)?);
        Ok(match self.config.get("origin") {
            Some(origin) => source.with_origin(origin),
            None => source,
        })
    }
}
