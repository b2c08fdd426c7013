//! StyleText API server
//!
//! Serves `POST /generate` and `GET /` over HTTP.

use styletext_api::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
