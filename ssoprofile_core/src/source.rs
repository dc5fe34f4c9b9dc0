//! The interface profile sources implement.

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::profile::SsoProfile;

/// The trait all profile sources are expected to implement.
#[async_trait]
pub trait Source: Send + Sync {
    /// A short label for the source, used in logs.
    fn name(&self) -> String;

    /// Fetch the profiles this source knows about. `ctx` is cancelled when
    /// generation is abandoned (e.g. another source failed), and sources that
    /// do slow work should stop when it is.
    async fn get_profiles(&self, ctx: &CancellationToken) -> Result<Vec<SsoProfile>>;
}

/// A source that hands back a fixed list of profiles.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    name: String,
    profiles: Vec<SsoProfile>,
}

impl StaticSource {
    /// Basic constructor
    pub fn new<S: Into<String>>(name: S, profiles: Vec<SsoProfile>) -> Self {
        Self {
            name: name.into(),
            profiles,
        }
    }
}

#[async_trait]
impl Source for StaticSource {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    async fn get_profiles(&self, _ctx: &CancellationToken) -> Result<Vec<SsoProfile>> {
        Ok(self.profiles.to_owned())
    }
}
