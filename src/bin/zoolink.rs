//! zoolink CLI Tool
//!
//! Command-line interface for fetching a dataset window from the zoo and
//! linking it into split folders.

#[cfg(feature = "cli")]
use zoolink::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
