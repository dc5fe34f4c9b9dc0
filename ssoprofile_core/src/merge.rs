//! Merge generated profiles into an existing config document.
//!
//! Generated sections are recognized by their `common_fate_generated_from`
//! key, so user-authored sections are never touched unless a generated
//! profile is written under exactly the same name.

use std::collections::HashSet;
use std::fmt::Display;

use colored::Colorize;

use crate::document::ConfigFile;
use crate::error::Result;
use crate::fields::{generated_start_url, is_generated, ProfileFields};
use crate::logging::{debug, warn};
use crate::naming::{effective_template, SectionNamer};
use crate::profile::SsoProfile;

/// Non-default profiles live under `[profile <name>]` in the config file.
const PROFILE_SECTION_PREFIX: &str = "profile ";

/// Options for a single merge.
#[derive(Clone, Debug, Default)]
pub struct MergeOpts {
    /// Prepended to every rendered profile name.
    pub prefix: String,
    /// Template for profile names. Empty means the default template.
    pub section_name_template: String,
    /// Write plain `sso_*` keys instead of a `credential_process` entry.
    pub no_credential_process: bool,
    /// Start URLs whose previously generated sections should be removed
    /// unless they're generated again by this merge.
    pub prune_start_urls: Vec<String>,
}

/// What happened to a section during a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new section was written
    Added,
    /// An existing section was rewritten with different contents
    Updated,
    /// An existing section was rewritten with the same contents
    Unchanged,
    /// A generated section was pruned
    Removed,
}

/// A change to a single section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionChange {
    /// The full section name, e.g. `profile prod/DevRole`
    pub section: String,
    /// The kind of change
    pub kind: ChangeKind,
}

/// The outcome of a merge, relative to the document that was passed in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Per-section changes: written sections in write order, then removals.
    pub changes: Vec<SectionChange>,
    /// Section names that more than one profile rendered to. The last
    /// profile (in sort order) won.
    pub collisions: Vec<String>,
}

impl MergeSummary {
    /// Whether the document content changed at all.
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.kind != ChangeKind::Unchanged)
    }

    /// Names of sections with the given kind of change.
    pub fn sections(&self, kind: ChangeKind) -> Vec<&str> {
        self.changes
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.section.as_str())
            .collect()
    }
}

impl Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut text = "".to_owned();
        for change in &self.changes {
            match change.kind {
                ChangeKind::Added => {
                    text += &format!("{}\n", format!("+ [{}]", change.section).green())
                }
                ChangeKind::Updated => {
                    text += &format!("{}\n", format!("~ [{}]", change.section).yellow())
                }
                ChangeKind::Removed => {
                    text += &format!("{}\n", format!("- [{}]", change.section).red())
                }
                ChangeKind::Unchanged => (),
            }
        }
        for name in &self.collisions {
            text += &format!(
                "{}\n",
                format!("! [{name}] was generated by more than one profile; only the last was kept")
                    .yellow()
            );
        }
        if !self.has_changes() {
            text += "no changes\n";
        }
        write!(f, "{text}")
    }
}

/// Merge profiles into the config.
///
/// Generated sections whose start URL is listed in
/// [`MergeOpts::prune_start_urls`] are removed first, then every profile is
/// written (replacing any section of the same name) in order of account name
/// and role name.
///
/// The work happens on a copy of the document that replaces `config` only
/// once everything succeeded, so on error `config` is left as it was.
pub fn merge(
    config: &mut ConfigFile,
    profiles: &[SsoProfile],
    opts: &MergeOpts,
) -> Result<MergeSummary> {
    let namer = SectionNamer::new(effective_template(&opts.section_name_template))?;

    let mut ordered: Vec<&SsoProfile> = profiles.iter().collect();
    ordered.sort_by(|a, b| {
        (&a.account_name, &a.role_name).cmp(&(&b.account_name, &b.role_name))
    });

    let mut staged = config.clone();
    let pruned = prune(&mut staged, &opts.prune_start_urls);

    let mut written: Vec<String> = vec![];
    let mut seen = HashSet::new();
    let mut collisions = vec![];

    for profile in ordered {
        let profile = profile.normalized();
        let profile_name = namer.profile_name(&opts.prefix, &profile)?;
        let section_name = format!("{PROFILE_SECTION_PREFIX}{profile_name}");

        if seen.insert(section_name.to_owned()) {
            written.push(section_name.to_owned());
        } else if !collisions.contains(&section_name) {
            warn!(
                "more than one profile generated [{}]; keeping {}/{}",
                section_name, profile.account_name, profile.role_name
            );
            collisions.push(section_name.to_owned());
        }

        staged.delete_section(&section_name);
        let section = staged.new_section(&section_name)?;
        ProfileFields::new(&profile, &profile_name, opts.no_credential_process)
            .write_to(section)?;
    }

    let summary = summarize(config, &staged, written, pruned, collisions);
    debug!(
        "merge wrote {} sections and pruned {}",
        summary.changes.len() - summary.sections(ChangeKind::Removed).len(),
        summary.sections(ChangeKind::Removed).len()
    );

    *config = staged;
    Ok(summary)
}

/// Delete generated sections for any of the given start URLs. Returns the
/// names of the deleted sections.
fn prune(config: &mut ConfigFile, prune_start_urls: &[String]) -> Vec<String> {
    if prune_start_urls.is_empty() {
        return vec![];
    }
    config.retain_sections(|section| {
        let prunable = is_generated(section)
            && generated_start_url(section)
                .map(|url| prune_start_urls.iter().any(|p| p == url))
                .unwrap_or(false);
        !prunable
    })
}

fn summarize(
    before: &ConfigFile,
    after: &ConfigFile,
    written: Vec<String>,
    pruned: Vec<String>,
    collisions: Vec<String>,
) -> MergeSummary {
    let mut changes: Vec<SectionChange> = written
        .iter()
        .map(|name| {
            let kind = match (before.section(name), after.section(name)) {
                (Some(old), Some(new)) if old.same_entries(new) => ChangeKind::Unchanged,
                (Some(_), _) => ChangeKind::Updated,
                (None, _) => ChangeKind::Added,
            };
            SectionChange {
                section: name.to_owned(),
                kind,
            }
        })
        .collect();

    changes.extend(
        pruned
            .into_iter()
            .filter(|name| !written.contains(name))
            .map(|section| SectionChange {
                section,
                kind: ChangeKind::Removed,
            }),
    );

    MergeSummary {
        changes,
        collisions,
    }
}
