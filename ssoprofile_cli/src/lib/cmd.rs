//! Commands for the ssoprofile CLI
//!

use std::path::PathBuf;

use clap::{self, Args, Parser, Subcommand};

use ssoprofile_core::logging::LevelFilter;

/// ssoprofile: keep SSO role profiles in your AWS config up to date
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
pub(crate) struct SsoProfileArgs {
    #[clap(subcommand)]
    pub(crate) command: SsoProfileCommand,
    #[clap(global = true, short = 'v', long)]
    pub(crate) log_level: Option<LevelFilter>,
}

/// The config file a command works on.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct TargetArgs {
    /// AWS config file to update. Defaults to $AWS_CONFIG_FILE or ~/.aws/config
    #[clap(short, long)]
    pub(crate) config: Option<PathBuf>,
    /// Print the resulting config instead of writing it
    #[clap(long, value_parser, default_value = "false")]
    pub(crate) dry_run: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum SsoProfileCommand {
    /// Generate profiles from the configured sources and merge them into the config
    Generate {
        #[clap(flatten)]
        target: TargetArgs,
        /// Settings file. Defaults to ~/.ssoprofile/config.yaml
        #[clap(short, long)]
        settings: Option<PathBuf>,
        /// Also read profiles from this YAML or JSON file (can be repeated)
        #[clap(short = 'f', long = "source-file")]
        source_files: Vec<PathBuf>,
        /// Prefix for generated profile names
        #[clap(short, long)]
        prefix: Option<String>,
        /// Template for generated profile names, e.g. "{AccountName}/{RoleName}"
        #[clap(short = 't', long)]
        profile_template: Option<String>,
        /// Write native SSO keys instead of a credential process
        #[clap(long, value_parser, default_value = "false")]
        no_credential_process: bool,
        /// Drop generated profiles for these start URLs before merging
        #[clap(long, use_value_delimiter = true, value_delimiter = ',')]
        prune: Option<Vec<String>>,
    },
    /// Remove generated profiles for the given start URLs
    Prune {
        #[clap(flatten)]
        target: TargetArgs,
        /// Start URLs whose generated profiles are removed
        #[clap(required = true, use_value_delimiter = true, value_delimiter = ',')]
        start_urls: Vec<String>,
    },
    /// Check a profile name template and preview the name it produces
    CheckTemplate {
        /// The template to check
        template: String,
        /// Prefix to put in front of the name
        #[clap(short, long, default_value = "")]
        prefix: String,
        /// Account name for the preview
        #[clap(long, default_value = "my account")]
        account_name: String,
        /// Role name for the preview
        #[clap(long, default_value = "DevRole")]
        role_name: String,
    },
}
