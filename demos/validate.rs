/// Install validation example
///
/// Builds the asset engine from a TOML configuration and prints the
/// inventory report as JSON.
///
/// Run with: cargo run --example validate -- [pakvfs.toml]
use anyhow::Context;
use pakvfs_rs::{AssetEngine, Inventory, VfsConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => VfsConfig::load(&path).with_context(|| format!("reading {}", path))?,
        None => VfsConfig::default(),
    };

    let engine = AssetEngine::from_config(&config).context("building asset index")?;

    println!("=== Search roots ===");
    for root in engine.search_roots() {
        println!("  {}", root.display());
    }

    println!("\n=== Archives ({}) ===", engine.archives().len());
    for archive in engine.archives() {
        println!("  {} ({} entries)", archive.label(), archive.entry_count());
    }

    let report = Inventory::new(&engine).report(&config.manifest());
    println!("\n{}", report.to_json()?);

    if !report.is_complete() {
        anyhow::bail!(
            "{} required assets missing, {} with unexpected content, {} unreadable",
            report.missing.len(),
            report.mismatched.len(),
            report.failed.len()
        );
    }
    Ok(())
}
