//! The exact set of keys written for each generated profile, and the checks
//! used to recognize generated sections later on.

use crate::document::Section;
use crate::error::DocumentError;
use crate::profile::SsoProfile;

/// Marks a section as generated and records the source it came from.
pub const GENERATED_FROM_KEY: &str = "common_fate_generated_from";
/// Start URL key written by the credential process style.
pub const GRANTED_START_URL_KEY: &str = "granted_sso_start_url";
/// Start URL key written by the native SSO style.
pub const SSO_START_URL_KEY: &str = "sso_start_url";

/// Fields for profiles that use `granted credential-process`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialProcessFields {
    granted_sso_start_url: String,
    granted_sso_region: String,
    granted_sso_account_id: String,
    granted_sso_role_name: String,
    common_fate_generated_from: String,
    credential_process: String,
    region: String,
}

/// Fields for profiles that use the AWS CLI's own SSO support.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SsoFields {
    sso_start_url: String,
    sso_region: String,
    sso_account_id: String,
    common_fate_generated_from: String,
    sso_role_name: String,
    region: String,
}

/// The fields for one generated profile, in one of the two styles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileFields {
    /// `granted_sso_*` keys plus a `credential_process` command
    CredentialProcess(CredentialProcessFields),
    /// Plain `sso_*` keys
    Sso(SsoFields),
}

impl ProfileFields {
    /// Build the fields for a profile that will be written as `profile_name`
    /// (the name without the `profile ` section prefix).
    pub fn new(profile: &SsoProfile, profile_name: &str, no_credential_process: bool) -> Self {
        if no_credential_process {
            return ProfileFields::Sso(SsoFields {
                sso_start_url: profile.sso_start_url.to_owned(),
                sso_region: profile.sso_region.to_owned(),
                sso_account_id: profile.account_id.to_owned(),
                common_fate_generated_from: profile.generated_from.to_owned(),
                sso_role_name: profile.role_name.to_owned(),
                region: profile.region.to_owned(),
            });
        }

        let mut credential_process = format!("granted credential-process --profile {profile_name}");
        if !profile.common_fate_url.is_empty() {
            credential_process += &format!(" --url {}", profile.common_fate_url);
        }

        ProfileFields::CredentialProcess(CredentialProcessFields {
            granted_sso_start_url: profile.sso_start_url.to_owned(),
            granted_sso_region: profile.sso_region.to_owned(),
            granted_sso_account_id: profile.account_id.to_owned(),
            granted_sso_role_name: profile.role_name.to_owned(),
            common_fate_generated_from: profile.generated_from.to_owned(),
            credential_process,
            region: profile.region.to_owned(),
        })
    }

    /// The `(key, value)` pairs to write, in order. `region` is left out
    /// when it's empty.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let (mut entries, region) = match self {
            ProfileFields::CredentialProcess(f) => (
                vec![
                    (GRANTED_START_URL_KEY, f.granted_sso_start_url.as_str()),
                    ("granted_sso_region", f.granted_sso_region.as_str()),
                    ("granted_sso_account_id", f.granted_sso_account_id.as_str()),
                    ("granted_sso_role_name", f.granted_sso_role_name.as_str()),
                    (GENERATED_FROM_KEY, f.common_fate_generated_from.as_str()),
                    ("credential_process", f.credential_process.as_str()),
                ],
                f.region.as_str(),
            ),
            ProfileFields::Sso(f) => (
                vec![
                    (SSO_START_URL_KEY, f.sso_start_url.as_str()),
                    ("sso_region", f.sso_region.as_str()),
                    ("sso_account_id", f.sso_account_id.as_str()),
                    (GENERATED_FROM_KEY, f.common_fate_generated_from.as_str()),
                    ("sso_role_name", f.sso_role_name.as_str()),
                ],
                f.region.as_str(),
            ),
        };
        if !region.is_empty() {
            entries.push(("region", region));
        }
        entries
    }

    /// Write the fields into an (empty) section. Fails if a value has a
    /// line break in it.
    pub fn write_to(&self, section: &mut Section) -> Result<(), DocumentError> {
        for (key, value) in self.entries() {
            section.set(key, value)?;
        }
        Ok(())
    }
}

/// Whether the section was written by the generator.
pub fn is_generated(section: &Section) -> bool {
    section.has_key(GENERATED_FROM_KEY)
}

/// The start URL recorded in a section, in either style.
pub fn generated_start_url(section: &Section) -> Option<&str> {
    section
        .get(GRANTED_START_URL_KEY)
        .or_else(|| section.get(SSO_START_URL_KEY))
}
