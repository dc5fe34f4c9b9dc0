//! Errors returned by profile generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for the core.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while generating profiles.
#[derive(Debug, Error)]
pub enum Error {
    /// The naming template or prefix can't produce a valid section name.
    #[error(transparent)]
    InvalidTemplate(#[from] InvalidTemplateError),
    /// A source failed to return its profiles. The source's error is passed
    /// through untouched.
    #[error(transparent)]
    Source(anyhow::Error),
    /// The config document rejected an operation.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Generation was cancelled while waiting on sources.
    #[error("profile generation was cancelled")]
    Cancelled,
}

/// Problems with a user-supplied naming template or prefix.
#[derive(Debug, Error)]
pub enum InvalidTemplateError {
    /// Literal text contains characters that would break the section header.
    #[error("{what} `{value}` must not contain any of these illegal characters ({illegal}), found {found}")]
    IllegalCharacters {
        /// What was being checked ("profile template" or "profile prefix")
        what: &'static str,
        /// The offending template or prefix
        value: String,
        /// The illegal characters that were found, quoted
        found: String,
        /// The full illegal character set, for display
        illegal: &'static str,
    },
    /// The template isn't valid template syntax.
    #[error("unable to parse profile template `{template}`")]
    Parse {
        /// The template
        template: String,
        /// The parser's complaint
        #[source]
        source: tinytemplate::error::Error,
    },
    /// The template parsed but failed for a particular profile.
    #[error("unable to render profile name for {account_name}/{role_name}")]
    Render {
        /// Account of the failing profile
        account_name: String,
        /// Role of the failing profile
        role_name: String,
        /// The renderer's complaint
        #[source]
        source: tinytemplate::error::Error,
    },
}

/// Structural problems with a config document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A section name that can't be written as a header.
    #[error("invalid section name `{0}`")]
    InvalidSectionName(String),
    /// A key that can't be written as a single `key = value` line.
    #[error("invalid key `{0}`")]
    InvalidKey(String),
    /// A value that would spill onto more than one line.
    #[error("value for `{key}` must not contain line breaks: {value:?}")]
    InvalidValue {
        /// The key being set
        key: String,
        /// The rejected value
        value: String,
    },
    /// The document text couldn't be parsed.
    #[error("unable to parse config at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },
    /// The document couldn't be read from disk.
    #[error("unable to read {}", path.display())]
    Read {
        /// The file
        path: PathBuf,
        /// The I/O error
        #[source]
        source: std::io::Error,
    },
    /// The document couldn't be written to disk.
    #[error("unable to write {}", path.display())]
    Write {
        /// The file
        path: PathBuf,
        /// The I/O error
        #[source]
        source: std::io::Error,
    },
}
