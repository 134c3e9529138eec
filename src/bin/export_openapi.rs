//! Write the gateway's OpenAPI document as JSON.
//!
//! ```text
//! cargo run --bin export_openapi                      # stdout
//! cargo run --bin export_openapi -- --output api.json
//! ```

use anyhow::Context;
use fund_transfer::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;

    let args: Vec<String> = std::env::args().collect();
    match args.iter().position(|a| a == "--output").and_then(|i| args.get(i + 1)) {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("Failed to write {}", path))?;
            eprintln!("OpenAPI document written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
