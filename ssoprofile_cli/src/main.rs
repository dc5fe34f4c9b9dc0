//! ssoprofile CLI
//!

#![deny(missing_docs)]

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    ssoprofile_lib::cli().await
}
