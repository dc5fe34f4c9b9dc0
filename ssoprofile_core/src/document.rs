//! An ordered, comment-preserving model of an INI-style config file such as
//! `~/.aws/config`.
//!
//! The layout written back out looks like this:
//!
//! ```text
//! [profile example]
//! test = 1
//!
//! [profile prod/DevRole]
//! granted_sso_start_url      = https://example.awsapps.com/start
//! granted_sso_region         = ap-southeast-2
//! ```
//!
//! Keys are padded to the longest key in their section. Comments are kept with
//! the header or key that follows them, and indented lines following a key are
//! kept as continuation lines of that key's value (the AWS CLI uses these for
//! nested settings like `s3 =`).

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::DocumentError;

/// A single `key = value` line, with the comments written above it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Entry {
    value: String,
    comments: Vec<String>,
}

/// A named section of the document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    comments: Vec<String>,
    /// A comment on the header line itself, e.g. `[profile a] # mine`.
    header_comment: Option<String>,
    entries: IndexMap<String, Entry>,
}

impl Section {
    fn new(name: &str) -> Self {
        Section {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Whether the section has the key.
    pub fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Set a value. New keys go at the end; existing keys keep their position
    /// and comments.
    ///
    /// Keys and values must fit on one line, otherwise they could end up as
    /// extra keys or sections when the document is read back.
    pub fn set<K: Into<String>, V: Into<String>>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<(), DocumentError> {
        let key = key.into();
        let value = value.into();
        if key.trim().is_empty() || key.contains(['=', '\n', '\r']) {
            return Err(DocumentError::InvalidKey(key));
        }
        if value.contains(['\n', '\r']) {
            return Err(DocumentError::InvalidValue { key, value });
        }
        match self.entries.get_mut(&key) {
            Some(entry) => entry.value = value,
            None => {
                self.entries.insert(
                    key,
                    Entry {
                        value,
                        comments: vec![],
                    },
                );
            }
        }
        Ok(())
    }

    /// Iterate over `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.as_str(), e.value.as_str()))
    }

    /// Number of keys in the section.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the section has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both sections hold the same keys and values, in the same order.
    pub fn same_entries(&self, other: &Section) -> bool {
        self.iter().eq(other.iter())
    }

    fn render(&self, out: &mut String, with_header: bool) {
        for comment in &self.comments {
            out.push_str(comment);
            out.push('\n');
        }
        if with_header {
            match &self.header_comment {
                Some(comment) => out.push_str(&format!("[{}] {}\n", self.name, comment)),
                None => out.push_str(&format!("[{}]\n", self.name)),
            }
        }

        let width = self
            .entries
            .keys()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or_default();

        for (key, entry) in &self.entries {
            for comment in &entry.comments {
                out.push_str(comment);
                out.push('\n');
            }
            let mut lines = entry.value.split('\n');
            let first = lines.next().unwrap_or_default();
            if first.is_empty() {
                out.push_str(&format!("{key:<width$} =\n"));
            } else {
                out.push_str(&format!("{key:<width$} = {first}\n"));
            }
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
}

/// A parsed config file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Keys that come before the first section header.
    default: Section,
    sections: Vec<Section>,
    /// Comments after the last key.
    trailing_comments: Vec<String>,
}

impl ConfigFile {
    /// An empty document.
    pub fn new() -> Self {
        Default::default()
    }

    /// Read and parse a document from disk.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_owned(),
            source,
        })?;
        raw.parse()
    }

    /// Write the document to disk, creating parent directories as needed.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let write_err = |source| DocumentError::Write {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        fs::write(path, self.to_string()).map_err(write_err)
    }

    /// Keys that appear before any section header.
    pub fn default_section(&self) -> &Section {
        &self.default
    }

    /// The names of all named sections, in document order.
    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.to_owned()).collect()
    }

    /// Get the first section with the given name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Append a new empty section. No uniqueness check happens here: callers
    /// that don't want duplicates delete the old section first.
    pub fn new_section(&mut self, name: &str) -> Result<&mut Section, DocumentError> {
        validate_section_name(name)?;
        self.sections.push(Section::new(name));
        let last = self.sections.len() - 1;
        Ok(&mut self.sections[last])
    }

    /// Delete every section with this name. Returns whether anything was removed.
    pub fn delete_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        before != self.sections.len()
    }

    /// Keep only the sections matching the predicate. Returns the names of the
    /// removed sections.
    pub fn retain_sections<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&Section) -> bool,
    {
        let mut removed = vec![];
        self.sections.retain(|s| {
            let k = keep(s);
            if !k {
                removed.push(s.name.to_owned());
            }
            k
        });
        removed
    }
}

fn validate_section_name(name: &str) -> Result<(), DocumentError> {
    if name.trim().is_empty() || name.contains(['[', ']', '\n', '\r']) {
        return Err(DocumentError::InvalidSectionName(name.to_owned()));
    }
    Ok(())
}

impl FromStr for ConfigFile {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut doc = ConfigFile::new();
        // None means we're still in the default section
        let mut current: Option<usize> = None;
        let mut current_key: Option<String> = None;
        let mut pending_comments = vec![];

        for (idx, raw_line) in s.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw_line.trim();

            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                pending_comments.push(trimmed.to_owned());
                continue;
            }

            let section = match current {
                Some(i) => &mut doc.sections[i],
                None => &mut doc.default,
            };

            // continuation of the previous key's value
            if raw_line.starts_with(char::is_whitespace) {
                if let Some(entry) = current_key
                    .as_ref()
                    .and_then(|k| section.entries.get_mut(k))
                {
                    entry.value.push('\n');
                    entry.value.push_str(raw_line);
                    continue;
                }
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let (name, rest) = header.split_once(']').ok_or_else(|| DocumentError::Parse {
                    line: line_no,
                    message: format!("unterminated section header `{trimmed}`"),
                })?;
                let name = name.trim();
                let rest = rest.trim();
                // only a comment may follow the closing bracket
                if !(rest.is_empty() || rest.starts_with('#') || rest.starts_with(';')) {
                    return Err(DocumentError::Parse {
                        line: line_no,
                        message: format!("unexpected text after section header `{trimmed}`"),
                    });
                }
                validate_section_name(name).map_err(|_| DocumentError::Parse {
                    line: line_no,
                    message: format!("invalid section header `{trimmed}`"),
                })?;

                // repeated headers continue the earlier section
                let i = match doc.sections.iter().position(|s| s.name == name) {
                    Some(i) => i,
                    None => {
                        doc.sections.push(Section::new(name));
                        doc.sections.len() - 1
                    }
                };
                doc.sections[i].comments.append(&mut pending_comments);
                if !rest.is_empty() {
                    doc.sections[i].header_comment = Some(rest.to_owned());
                }
                current = Some(i);
                current_key = None;
                continue;
            }

            let (key, value) = raw_line.split_once('=').ok_or_else(|| DocumentError::Parse {
                line: line_no,
                message: format!("expected `key = value`, found `{trimmed}`"),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(DocumentError::Parse {
                    line: line_no,
                    message: "missing key before `=`".to_owned(),
                });
            }
            let entry = section
                .entries
                .entry(key.to_owned())
                .or_insert_with(Entry::default);
            entry.value = value.trim_start().to_owned();
            entry.comments.append(&mut pending_comments);
            current_key = Some(key.to_owned());
        }

        doc.trailing_comments = pending_comments;
        Ok(doc)
    }
}

impl Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut blocks = vec![];

        if !self.default.is_empty() {
            let mut block = String::new();
            self.default.render(&mut block, false);
            blocks.push(block);
        }
        for section in &self.sections {
            let mut block = String::new();
            section.render(&mut block, true);
            blocks.push(block);
        }
        if !self.trailing_comments.is_empty() {
            blocks.push(
                self.trailing_comments
                    .iter()
                    .map(|c| format!("{c}\n"))
                    .collect(),
            );
        }

        write!(f, "{}", blocks.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    #[test]
    fn test_parse_and_render_normalizes_spacing() -> Result<()> {
        let doc: ConfigFile = "[profile example]\ntest=1\n".parse()?;
        assert_eq!(doc.to_string(), "[profile example]\ntest = 1\n");
        Ok(())
    }

    #[test]
    fn test_keys_are_aligned_per_section() -> Result<()> {
        let doc: ConfigFile = r#"
[profile a]
region = us-east-1
output = json
cli_pager =

[profile b]
x = 1
"#
        .parse()?;

        assert_eq!(
            doc.to_string(),
            "[profile a]\nregion    = us-east-1\noutput    = json\ncli_pager =\n\n[profile b]\nx = 1\n"
        );
        Ok(())
    }

    #[test]
    fn test_comments_and_default_keys_survive_a_round_trip() -> Result<()> {
        let raw = "\
region = us-east-1

# my personal account
[profile personal]
; old key id
aws_access_key_id = abc

# end of file
";
        let doc: ConfigFile = raw.parse()?;
        assert_eq!(doc.default_section().get("region"), Some("us-east-1"));
        assert_eq!(doc.to_string(), raw);
        Ok(())
    }

    #[test]
    fn test_continuation_lines_stay_with_their_key() -> Result<()> {
        let raw = "\
[profile dev]
s3 =
    max_concurrent_requests = 20
    max_queue_size = 10000
region = us-west-2
";
        let doc: ConfigFile = raw.parse()?;
        let section = doc.section("profile dev").unwrap();
        assert_eq!(
            section.get("s3"),
            Some("\n    max_concurrent_requests = 20\n    max_queue_size = 10000")
        );
        assert_eq!(section.get("region"), Some("us-west-2"));
        assert_eq!(doc.to_string(), "[profile dev]\ns3     =\n    max_concurrent_requests = 20\n    max_queue_size = 10000\nregion = us-west-2\n");
        Ok(())
    }

    #[test]
    fn test_repeated_headers_are_merged() -> Result<()> {
        let doc: ConfigFile = "[a]\nx = 1\n[b]\ny = 2\n[a]\nz = 3\n".parse()?;
        assert_eq!(doc.section_names(), vec!["a", "b"]);
        assert_eq!(doc.section("a").unwrap().len(), 2);
        Ok(())
    }

    #[test]
    fn test_values_keep_everything_after_the_first_equals() -> Result<()> {
        let doc: ConfigFile = "[a]\nurl = https://example.com/?a=b#frag\n".parse()?;
        assert_eq!(
            doc.section("a").unwrap().get("url"),
            Some("https://example.com/?a=b#frag")
        );
        Ok(())
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert!(matches!(
            "[a]\nnot a key value\n".parse::<ConfigFile>(),
            Err(DocumentError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            "[unterminated\n".parse::<ConfigFile>(),
            Err(DocumentError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_header_comments_are_allowed_and_kept() -> Result<()> {
        let raw = "[profile a] # mine\nregion = x\n\n[profile b]   ; theirs\ny = 1\n";
        let doc: ConfigFile = raw.parse()?;
        assert_eq!(doc.section_names(), vec!["profile a", "profile b"]);
        assert_eq!(doc.section("profile a").unwrap().get("region"), Some("x"));
        assert_eq!(
            doc.to_string(),
            "[profile a] # mine\nregion = x\n\n[profile b] ; theirs\ny = 1\n"
        );

        assert!(matches!(
            "[profile a] junk\n".parse::<ConfigFile>(),
            Err(DocumentError::Parse { line: 1, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_values_are_rendered_exactly_as_stored() -> Result<()> {
        let mut doc = ConfigFile::new();
        doc.new_section("a")?.set("region", "us-east-1  ")?;
        let rendered = doc.to_string();
        assert_eq!(rendered, "[a]\nregion = us-east-1  \n");

        let reparsed: ConfigFile = rendered.parse()?;
        assert_eq!(reparsed, doc);
        Ok(())
    }

    #[test]
    fn test_set_rejects_multi_line_values_and_bad_keys() -> Result<()> {
        let mut doc = ConfigFile::new();
        let section = doc.new_section("a")?;
        assert!(matches!(
            section.set("region", "x\n[default]"),
            Err(DocumentError::InvalidValue { .. })
        ));
        assert!(matches!(
            section.set("a = b", "x"),
            Err(DocumentError::InvalidKey(_))
        ));
        assert!(section.is_empty());
        Ok(())
    }

    #[test]
    fn test_new_section_rejects_names_that_break_headers() {
        let mut doc = ConfigFile::new();
        assert!(doc.new_section("profile a]b").is_err());
        assert!(doc.new_section("").is_err());
        assert!(doc.new_section("profile ok").is_ok());
    }

    #[test]
    fn test_delete_section_removes_every_copy() -> Result<()> {
        let mut doc = ConfigFile::new();
        doc.new_section("dup")?.set("a", "1")?;
        doc.new_section("dup")?.set("a", "2")?;
        doc.new_section("keep")?;

        assert!(doc.delete_section("dup"));
        assert!(!doc.delete_section("dup"));
        assert_eq!(doc.section_names(), vec!["keep"]);
        Ok(())
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(".aws").join("config");

        let mut doc = ConfigFile::new();
        doc.new_section("profile dev")?.set("region", "eu-west-1")?;
        doc.write_to_file(&path)?;

        assert_eq!(ConfigFile::read_from_file(&path)?, doc);
        Ok(())
    }
}
