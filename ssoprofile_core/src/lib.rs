//!
//! SSO profile generation
//!
//! Merges profiles derived from single sign-on role assignments into an
//! AWS-style config file without touching the sections a user wrote by hand.
#![deny(missing_docs)]

pub use document::ConfigFile;
pub use error::{Error, InvalidTemplateError};
pub use generator::Generator;
pub use merge::{merge, MergeOpts, MergeSummary};
pub use profile::SsoProfile;
pub use source::Source;

pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod generator;
pub mod logging;
pub mod merge;
pub mod naming;
pub mod paths;
pub mod profile;
pub mod source;
pub mod sources;

#[macro_export]
/// Time the code inside the macro. Write the elapsed time to debug logs.
/// Derived from https://notes.iveselov.info/programming/time_it-a-case-study-in-rust-macros
macro_rules! log_runtime {
    ($context:expr, $($tt:tt)+) => {
        {
            $crate::logging::debug!("{}: starting", $context);
            let timer = std::time::Instant::now();
            let x =
            $(
                $tt
            )+;
            $crate::logging::debug!("{}: {:?}", $context, timer.elapsed());
            x
        }
    }
}
