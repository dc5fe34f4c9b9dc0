//! The profile record produced by sources.

use serde::{Deserialize, Serialize};

/// A single role assignment that should become a profile in the config file.
///
/// Sources produce these and hand them over as-is; the merge engine only
/// works on normalized copies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SsoProfile {
    /// The SSO start URL, e.g. `https://example.awsapps.com/start`
    pub sso_start_url: String,
    /// The region the identity provider lives in
    pub sso_region: String,
    /// The account id
    pub account_id: String,
    /// The human-readable account name
    pub account_name: String,
    /// The role to assume in the account
    pub role_name: String,
    /// The default region for the profile. Omitted from the output when empty.
    #[serde(default)]
    pub region: String,
    /// The source this profile was generated from, such as `aws-sso`
    #[serde(default)]
    pub generated_from: String,
    /// Optional Common Fate deployment passed along to the credential process
    #[serde(default)]
    pub common_fate_url: String,
}

impl SsoProfile {
    /// Return a copy with the account name made safe for a section name.
    pub(crate) fn normalized(&self) -> SsoProfile {
        SsoProfile {
            account_name: normalize_account_name(&self.account_name),
            ..self.to_owned()
        }
    }
}

/// Spaces aren't allowed in section names, so they become dashes.
pub(crate) fn normalize_account_name(account_name: &str) -> String {
    account_name.replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_replaces_spaces_in_account_name_only() {
        let profile = SsoProfile {
            account_name: "Shared Services Prod".to_owned(),
            role_name: "Read Only".to_owned(),
            ..Default::default()
        };
        let normalized = profile.normalized();

        assert_eq!(normalized.account_name, "Shared-Services-Prod");
        assert_eq!(normalized.role_name, "Read Only");
        // the original is left alone
        assert_eq!(profile.account_name, "Shared Services Prod");
    }

    #[test]
    fn test_optional_fields_default_when_deserializing() -> anyhow::Result<()> {
        let profile: SsoProfile = serde_json::from_str(
            r#"{
                "sso_start_url": "https://example.awsapps.com/start",
                "sso_region": "ap-southeast-2",
                "account_id": "123456789012",
                "account_name": "prod",
                "role_name": "DevRole"
            }"#,
        )?;

        assert_eq!(profile.region, "");
        assert_eq!(profile.generated_from, "");
        assert_eq!(profile.common_fate_url, "");
        Ok(())
    }
}
