use anyhow::Result;

use super::load_config;
use crate::args::GlobalArgs;

pub async fn run(global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;

    println!("songsmith configuration (API keys masked)\n");
    println!("{}", config.redacted().to_toml()?);

    // Show config file locations
    println!("Config sources (later entries win):");
    if let Some(config_dir) = dirs::config_dir() {
        println!("  1. {}/songsmith/config.toml", config_dir.display());
    }
    if let Some(p) = &global.config {
        println!("  2. {} (specified)", p.display());
    }
    println!("  3. SONAUTO_API_KEY, LEMON_SLICE_API_KEY (environment or .env)");
    println!("  4. Environment variables (SONGSMITH_<SECTION>__<KEY>)");
    println!("  5. Command-line flags (--output-dir, --poll-interval, --timeout)");

    Ok(())
}
