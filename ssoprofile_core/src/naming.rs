//! Render profile section names from a user-supplied template.
//!
//! Templates use [`tinytemplate`] syntax against the fields of a profile:
//!
//! ```text
//! {AccountName}/{RoleName}
//! { AccountName | lower }-{ RoleName | kebabcase }
//! {AccountName}{{ if Region }}.{Region}{{ endif }}
//! ```
//!
//! Only pure string formatters are registered, so a template can't reach
//! anything beyond the profile it is rendering.
//!
//! Formatters can't take arguments, so there is no general `replace(old, new)`.
//! Character replacement is limited to the fixed forms: `dashes` and
//! `underscores` (spaces), `nospace`, and the case conversions.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use tinytemplate::{error::Result as TemplateResult, format_unescaped, TinyTemplate};

use crate::error::InvalidTemplateError;
use crate::profile::SsoProfile;

/// The template used when none is configured.
pub const DEFAULT_PROFILE_NAME_TEMPLATE: &str = "{AccountName}/{RoleName}";

/// Characters (beside whitespace) that can't appear in a section name.
pub const ILLEGAL_CHARS: &str = r#"\][;'""#;

const TEMPLATE_NAME: &str = "section_name";

lazy_static! {
    /// Matches escapes, blocks, comments and value substitutions so that only
    /// literal template text is left behind.
    static ref TEMPLATE_REGIONS: Regex =
        Regex::new(r"(?s)\\(.)|\{\{.*?\}\}|\{#.*?#\}|\{[^{}]*\}").unwrap();
}

/// The fields a template can refer to.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct NameContext<'a> {
    sso_start_url: &'a str,
    sso_region: &'a str,
    account_id: &'a str,
    account_name: &'a str,
    role_name: &'a str,
    region: &'a str,
    generated_from: &'a str,
    common_fate_url: &'a str,
}

impl<'a> From<&'a SsoProfile> for NameContext<'a> {
    fn from(p: &'a SsoProfile) -> Self {
        NameContext {
            sso_start_url: &p.sso_start_url,
            sso_region: &p.sso_region,
            account_id: &p.account_id,
            account_name: &p.account_name,
            role_name: &p.role_name,
            region: &p.region,
            generated_from: &p.generated_from,
            common_fate_url: &p.common_fate_url,
        }
    }
}

/// A parsed and validated naming template.
pub struct SectionNamer<'t> {
    tt: TinyTemplate<'t>,
}

impl<'t> SectionNamer<'t> {
    /// Validate and parse a template. The default template is trusted and
    /// skips the character check.
    pub fn new(template: &'t str) -> Result<Self, InvalidTemplateError> {
        if template != DEFAULT_PROFILE_NAME_TEMPLATE {
            check_template_chars(template)?;
        }

        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&format_unescaped);
        register_formatters(&mut tt);
        tt.add_template(TEMPLATE_NAME, template)
            .map_err(|source| InvalidTemplateError::Parse {
                template: template.to_owned(),
                source,
            })?;

        Ok(SectionNamer { tt })
    }

    /// Render the section name fragment for a profile.
    pub fn render(&self, profile: &SsoProfile) -> Result<String, InvalidTemplateError> {
        self.tt
            .render(TEMPLATE_NAME, &NameContext::from(profile))
            .map_err(|source| InvalidTemplateError::Render {
                account_name: profile.account_name.to_owned(),
                role_name: profile.role_name.to_owned(),
                source,
            })
    }

    /// The full profile name for a profile: the prefix followed by the
    /// rendered template, with spaces in the account name replaced by dashes.
    pub fn profile_name(
        &self,
        prefix: &str,
        profile: &SsoProfile,
    ) -> Result<String, InvalidTemplateError> {
        Ok(format!("{prefix}{}", self.render(&profile.normalized())?))
    }
}

/// Use the configured template, or the default when it's empty.
pub fn effective_template(template: &str) -> &str {
    if template.is_empty() {
        DEFAULT_PROFILE_NAME_TEMPLATE
    } else {
        template
    }
}

/// Check a literal profile prefix for characters that can't be in a section name.
pub fn validate_prefix(prefix: &str) -> Result<(), InvalidTemplateError> {
    check_literal("profile prefix", prefix, prefix)
}

fn check_template_chars(template: &str) -> Result<(), InvalidTemplateError> {
    let literal = TEMPLATE_REGIONS.replace_all(template, |caps: &Captures| {
        caps.get(1)
            .map(|escaped| escaped.as_str().to_owned())
            .unwrap_or_default()
    });
    check_literal("profile template", template, &literal)
}

fn check_literal(
    what: &'static str,
    value: &str,
    literal: &str,
) -> Result<(), InvalidTemplateError> {
    let mut found: Vec<char> = literal
        .chars()
        .filter(|c| c.is_whitespace() || ILLEGAL_CHARS.contains(*c))
        .collect();
    if found.is_empty() {
        return Ok(());
    }
    found.sort_unstable();
    found.dedup();

    Err(InvalidTemplateError::IllegalCharacters {
        what,
        value: value.to_owned(),
        found: found
            .iter()
            .map(|c| format!("{c:?}"))
            .collect::<Vec<_>>()
            .join(", "),
        illegal: r#"whitespace \][;'""#,
    })
}

type Formatter = fn(&Value, &mut String) -> TemplateResult<()>;

fn register_formatters(tt: &mut TinyTemplate) {
    let formatters: [(&'static str, Formatter); 10] = [
        ("lower", |v, out| transform(v, out, |s| s.to_lowercase())),
        ("upper", |v, out| transform(v, out, |s| s.to_uppercase())),
        ("title", |v, out| transform(v, out, title_case)),
        ("trim", |v, out| transform(v, out, |s| s.trim().to_owned())),
        ("nospace", |v, out| {
            transform(v, out, |s| s.split_whitespace().collect())
        }),
        ("dashes", |v, out| transform(v, out, |s| s.replace(' ', "-"))),
        ("underscores", |v, out| {
            transform(v, out, |s| s.replace(' ', "_"))
        }),
        ("kebabcase", |v, out| {
            transform(v, out, |s| words(s).join("-").to_lowercase())
        }),
        ("snakecase", |v, out| {
            transform(v, out, |s| words(s).join("_").to_lowercase())
        }),
        ("camelcase", |v, out| transform(v, out, camel_case)),
    ];
    for (name, formatter) in formatters {
        tt.add_formatter(name, formatter);
    }
}

/// Format the value the same way a plain substitution would, then transform it.
fn transform<F>(value: &Value, output: &mut String, f: F) -> TemplateResult<()>
where
    F: Fn(&str) -> String,
{
    let mut raw = String::new();
    format_unescaped(value, &mut raw)?;
    output.push_str(&f(&raw));
    Ok(())
}

/// Split on whitespace, `-`, `_`, `.` and lower-to-upper case changes.
fn words(s: &str) -> Vec<String> {
    let mut words = vec![];
    let mut current = String::new();
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_whitespace() || c == '-' || c == '_' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case(s: &str) -> String {
    s.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}

fn camel_case(s: &str) -> String {
    words(s)
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let w = w.to_lowercase();
            if i == 0 {
                w
            } else {
                capitalize(&w)
            }
        })
        .collect()
}
