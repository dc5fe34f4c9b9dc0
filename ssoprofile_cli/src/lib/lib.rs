//! Full CLI library for ssoprofile
//!

#![deny(missing_docs)]

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use ssoprofile_core::{
    config::Settings,
    logging::{self, debug, info, warn},
    naming::{effective_template, validate_prefix, SectionNamer},
    paths,
    sources::FileSource,
    ConfigFile, Generator, MergeOpts, SsoProfile,
};

use crate::cmd::{SsoProfileArgs, SsoProfileCommand, TargetArgs};

/// Main CLI entrypoint.
pub async fn cli() -> Result<()> {
    let args = SsoProfileArgs::parse();
    logging::setup(args.log_level);

    match args.command {
        SsoProfileCommand::Generate {
            target,
            settings,
            source_files,
            prefix,
            profile_template,
            no_credential_process,
            prune,
        } => {
            let mut settings = load_settings(settings.as_deref())?;
            if let Some(prefix) = prefix {
                settings.prefix = prefix;
            }
            if let Some(template) = profile_template {
                settings.profile_template = template;
            }
            if no_credential_process {
                settings.no_credential_process = true;
            }
            if let Some(urls) = prune {
                settings.prune_start_urls = urls;
            }

            let mut generator = settings.generator()?;
            for path in source_files {
                generator.add_source(FileSource::new(path));
            }
            if generator.source_count() == 0 {
                warn!("no profile sources configured; only pruning will happen");
            }
            run(&generator, &target).await?;
        }

        SsoProfileCommand::Prune { target, start_urls } => {
            let generator = Generator::new(MergeOpts {
                prune_start_urls: start_urls,
                ..Default::default()
            });
            run(&generator, &target).await?;
        }

        SsoProfileCommand::CheckTemplate {
            template,
            prefix,
            account_name,
            role_name,
        } => {
            let name = preview_profile_name(&template, &prefix, &account_name, &role_name)?;
            println!("{} [profile {}]", "template ok:".green(), name);
        }
    }

    Ok(())
}

/// Read the settings file. An explicitly named file has to exist; the
/// default one is optional.
fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::read_from_file(path),
        None => {
            let path = paths::settings_path()?;
            if path.exists() {
                Settings::read_from_file(&path)
            } else {
                debug!("no settings at {}; using defaults", path.display());
                Ok(Settings::default())
            }
        }
    }
}

/// Load the AWS config, or start with an empty one if it doesn't exist yet.
fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        ConfigFile::read_from_file(path).with_context(|| format!("loading {}", path.display()))
    } else {
        info!("{} doesn't exist yet; it will be created", path.display());
        Ok(ConfigFile::new())
    }
}

fn target_path(target: &TargetArgs) -> Result<PathBuf> {
    match &target.config {
        Some(path) => Ok(path.to_owned()),
        None => paths::aws_config_path(),
    }
}

/// Run a generator against the target config and write or print the result.
async fn run(generator: &Generator, target: &TargetArgs) -> Result<()> {
    let path = target_path(target)?;
    let mut config = load_config(&path)?;

    let ctx = CancellationToken::new();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; stopping");
            interrupt.cancel();
        }
    });

    let summary = generator
        .generate(&mut config, &ctx)
        .await
        .context("generating profiles")?;
    ctx.cancel();

    print!("{summary}");
    if target.dry_run {
        println!();
        print!("{config}");
        return Ok(());
    }

    if summary.has_changes() {
        config
            .write_to_file(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("updated {}", path.display());
    } else {
        info!("{} is up to date", path.display());
    }
    Ok(())
}

fn preview_profile_name(
    template: &str,
    prefix: &str,
    account_name: &str,
    role_name: &str,
) -> Result<String> {
    validate_prefix(prefix)?;
    let namer = SectionNamer::new(effective_template(template))?;
    let sample = SsoProfile {
        sso_start_url: "https://example.awsapps.com/start".to_owned(),
        sso_region: "us-east-1".to_owned(),
        account_id: "123456789012".to_owned(),
        account_name: account_name.to_owned(),
        role_name: role_name.to_owned(),
        region: "us-east-1".to_owned(),
        ..Default::default()
    };
    Ok(namer.profile_name(prefix, &sample)?)
}
