//! Collect profiles from every source and merge them into a config.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::document::ConfigFile;
use crate::error::{Error, Result};
use crate::log_runtime;
use crate::logging::info;
use crate::merge::{merge, MergeOpts, MergeSummary};
use crate::naming::{effective_template, validate_prefix, SectionNamer};
use crate::profile::SsoProfile;
use crate::source::Source;

/// Generates profiles for an AWS config file. It reads profiles from its
/// sources and merges them into an existing document.
#[derive(Default)]
pub struct Generator {
    sources: Vec<Arc<dyn Source>>,
    /// Options for the merge step.
    pub options: MergeOpts,
}

impl Generator {
    /// Create a generator without any sources.
    pub fn new(options: MergeOpts) -> Self {
        Self {
            sources: vec![],
            options,
        }
    }

    /// Add a source to load profiles from.
    pub fn add_source<S: Source + 'static>(&mut self, source: S) {
        self.sources.push(Arc::new(source));
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Fetch profiles from all sources and merge them into `config`.
    ///
    /// The prefix and template are checked before any source is queried. If
    /// any source fails, the remaining ones are cancelled, the error is
    /// returned and `config` isn't touched.
    pub async fn generate(
        &self,
        config: &mut ConfigFile,
        ctx: &CancellationToken,
    ) -> Result<MergeSummary> {
        validate_prefix(&self.options.prefix)?;
        SectionNamer::new(effective_template(&self.options.section_name_template))?;

        let profiles = self.fetch_profiles(ctx).await?;
        info!(
            "merging {} profiles from {} sources",
            profiles.len(),
            self.sources.len()
        );

        merge(config, &profiles, &self.options)
    }

    /// Query every source concurrently. The first failure wins.
    async fn fetch_profiles(&self, ctx: &CancellationToken) -> Result<Vec<SsoProfile>> {
        let collected = Arc::new(Mutex::new(vec![]));
        let group_ctx = ctx.child_token();
        let mut tasks = JoinSet::new();

        for source in &self.sources {
            let source = Arc::clone(source);
            let collected = Arc::clone(&collected);
            let task_ctx = group_ctx.clone();
            tasks.spawn(async move {
                let got = log_runtime!(
                    format!("fetching profiles from {}", source.name()),
                    source.get_profiles(&task_ctx).await
                )?;
                collected.lock().unwrap().extend(got);
                Ok::<_, anyhow::Error>(())
            });
        }

        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    tasks.abort_all();
                    return Err(Error::Cancelled);
                }
                next = tasks.join_next() => next,
            };

            let err = match next {
                None => break,
                Some(Ok(Ok(()))) => continue,
                Some(Ok(Err(e))) => e,
                Some(Err(e)) => anyhow!(e).context("profile source task failed"),
            };
            group_ctx.cancel();
            tasks.abort_all();
            return Err(Error::Source(err));
        }

        let profiles = std::mem::take(&mut *collected.lock().unwrap());
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::bail;
    use async_trait::async_trait;

    use crate::error::InvalidTemplateError;
    use crate::source::StaticSource;

    /// Hands back its profiles after a delay and counts how often it was asked.
    struct SlowSource {
        delay: Duration,
        profiles: Vec<SsoProfile>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Source for SlowSource {
        fn name(&self) -> String {
            "slow".to_owned()
        }

        async fn get_profiles(&self, ctx: &CancellationToken) -> anyhow::Result<Vec<SsoProfile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::select! {
                _ = ctx.cancelled() => bail!("cancelled"),
                _ = tokio::time::sleep(self.delay) => Ok(self.profiles.to_owned()),
            }
        }
    }

    struct FailingSource;

    #[async_trait]
    impl Source for FailingSource {
        fn name(&self) -> String {
            "failing".to_owned()
        }

        async fn get_profiles(&self, _ctx: &CancellationToken) -> anyhow::Result<Vec<SsoProfile>> {
            bail!("identity provider said no")
        }
    }

    fn profile(account_name: &str, role_name: &str) -> SsoProfile {
        SsoProfile {
            sso_start_url: "https://example.awsapps.com/start".to_owned(),
            sso_region: "ap-southeast-2".to_owned(),
            account_id: "123456789012".to_owned(),
            account_name: account_name.to_owned(),
            role_name: role_name.to_owned(),
            generated_from: "aws-sso".to_owned(),
            ..Default::default()
        }
    }

    fn slow(delay_ms: u64, profiles: Vec<SsoProfile>, calls: &Arc<AtomicUsize>) -> SlowSource {
        SlowSource {
            delay: Duration::from_millis(delay_ms),
            profiles,
            calls: Arc::clone(calls),
        }
    }

    #[tokio::test]
    async fn test_generate_with_prefix() -> anyhow::Result<()> {
        let mut config: ConfigFile = "[profile example]\ntest = 1\n".parse()?;
        let mut generator = Generator::new(MergeOpts {
            prefix: "myprefix-".to_owned(),
            ..Default::default()
        });
        generator.add_source(StaticSource::new("test", vec![profile("prod", "DevRole")]));

        generator
            .generate(&mut config, &CancellationToken::new())
            .await?;

        assert_eq!(
            config.to_string().trim(),
            r#"
[profile example]
test = 1

[profile myprefix-prod/DevRole]
granted_sso_start_url      = https://example.awsapps.com/start
granted_sso_region         = ap-southeast-2
granted_sso_account_id     = 123456789012
granted_sso_role_name      = DevRole
common_fate_generated_from = aws-sso
credential_process         = granted credential-process --profile myprefix-prod/DevRole
"#
            .trim()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_profiles_from_all_sources_are_combined_in_sorted_order() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut generator = Generator::default();
        // the source that finishes first holds the profiles that sort last
        generator.add_source(slow(50, vec![profile("a", "Admin")], &calls));
        generator.add_source(slow(0, vec![profile("b", "Admin"), profile("c", "Admin")], &calls));
        generator.add_source(StaticSource::new("static", vec![]));

        let mut config = ConfigFile::new();
        let summary = generator
            .generate(&mut config, &CancellationToken::new())
            .await?;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            config.section_names(),
            vec!["profile a/Admin", "profile b/Admin", "profile c/Admin"]
        );
        assert_eq!(summary.changes.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_template_is_rejected_before_sources_are_queried() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        for template in ["{AccountName}. ", "{AccountName}.;", "'{RoleName}'", "{AccountName}[x]"] {
            let mut generator = Generator::new(MergeOpts {
                section_name_template: template.to_owned(),
                ..Default::default()
            });
            generator.add_source(slow(0, vec![profile("prod", "DevRole")], &calls));

            let res = generator
                .generate(&mut ConfigFile::new(), &CancellationToken::new())
                .await;
            assert!(
                matches!(res, Err(Error::InvalidTemplate(_))),
                "{template} should be rejected"
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_valid_custom_template() -> anyhow::Result<()> {
        let mut generator = Generator::new(MergeOpts {
            section_name_template: "{AccountName}.hello".to_owned(),
            ..Default::default()
        });
        generator.add_source(StaticSource::new("test", vec![profile("prod", "DevRole")]));

        let mut config = ConfigFile::new();
        generator
            .generate(&mut config, &CancellationToken::new())
            .await?;
        assert_eq!(config.section_names(), vec!["profile prod.hello"]);
        assert!(config.to_string().contains("--profile prod.hello\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_prefix_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut generator = Generator::new(MergeOpts {
            prefix: "my prefix".to_owned(),
            ..Default::default()
        });
        generator.add_source(slow(0, vec![profile("prod", "DevRole")], &calls));

        let res = generator
            .generate(&mut ConfigFile::new(), &CancellationToken::new())
            .await;
        assert!(matches!(
            res,
            Err(Error::InvalidTemplate(
                InvalidTemplateError::IllegalCharacters { .. }
            ))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_source_leaves_config_untouched() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let original = r#"
[profile stale]
granted_sso_start_url      = https://example.awsapps.com/start
common_fate_generated_from = aws-sso
"#;
        let mut config: ConfigFile = original.parse()?;
        let before = config.clone();

        let mut generator = Generator::new(MergeOpts {
            prune_start_urls: vec!["https://example.awsapps.com/start".to_owned()],
            ..Default::default()
        });
        // would block for a minute if it weren't cancelled
        generator.add_source(slow(60_000, vec![profile("prod", "DevRole")], &calls));
        generator.add_source(FailingSource);

        let res = tokio::time::timeout(
            Duration::from_secs(5),
            generator.generate(&mut config, &CancellationToken::new()),
        )
        .await?;

        match res {
            Err(Error::Source(e)) => assert_eq!(e.to_string(), "identity provider said no"),
            other => bail!("expected a source error, got {other:?}"),
        }
        assert_eq!(config, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_external_cancellation_stops_generation() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut generator = Generator::default();
        generator.add_source(slow(60_000, vec![profile("prod", "DevRole")], &calls));

        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let mut config = ConfigFile::new();
        let res = tokio::time::timeout(
            Duration::from_secs(5),
            generator.generate(&mut config, &ctx),
        )
        .await?;

        assert!(matches!(res, Err(Error::Cancelled)));
        assert_eq!(config, ConfigFile::new());
        Ok(())
    }

    #[tokio::test]
    async fn test_no_sources_still_prunes() -> anyhow::Result<()> {
        let mut config: ConfigFile = r#"
[profile stale]
sso_start_url              = https://example.awsapps.com/start
common_fate_generated_from = aws-sso
"#
        .parse()?;
        let generator = Generator::new(MergeOpts {
            prune_start_urls: vec!["https://example.awsapps.com/start".to_owned()],
            ..Default::default()
        });

        generator
            .generate(&mut config, &CancellationToken::new())
            .await?;
        assert!(config.section_names().is_empty());
        Ok(())
    }
}
