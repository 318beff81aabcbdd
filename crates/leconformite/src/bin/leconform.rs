//! leconform binary entry point

use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    leconformite::cli::main().await
}
