use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use which::which;

use super::load_config;
use crate::args::GlobalArgs;

pub async fn run(global: &GlobalArgs) -> Result<()> {
    println!("songsmith dependency check\n");

    let config = load_config(global)?;
    let mut all_ok = true;

    // Only the transition workflow needs the local tools
    print!("yt-dlp:          ");
    all_ok &= check_tool(config.paths.yt_dlp.as_deref(), "yt-dlp", "--version", 0).await;

    print!("ffmpeg:          ");
    all_ok &= check_tool(config.paths.ffmpeg.as_deref(), "ffmpeg", "-version", 2).await;

    let shown = config.redacted();

    print!("Sonauto key:     ");
    all_ok &= check_key(
        config.sonauto_api_key().is_ok(),
        shown.sonauto.api_key.as_deref(),
        "SONAUTO_API_KEY",
    );

    print!("Lemon Slice key: ");
    all_ok &= check_key(
        config.lemonslice_api_key().is_ok(),
        shown.lemonslice.api_key.as_deref(),
        "LEMON_SLICE_API_KEY",
    );

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}

/// Print the tool's version, taking the `word`-th word of its first output line
async fn check_tool(configured: Option<&Path>, name: &str, version_flag: &str, word: usize) -> bool {
    let path: PathBuf = match configured {
        Some(p) => p.to_path_buf(),
        None => match which(name) {
            Ok(p) => p,
            Err(_) => {
                println!("NOT FOUND");
                println!("                Install with: brew install {}", name);
                return false;
            }
        },
    };

    match Command::new(&path).arg(version_flag).output().await {
        Ok(out) if out.status.success() => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            let version = stdout
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(word))
                .unwrap_or("unknown");
            println!("OK ({})", version);
            true
        }
        _ => {
            println!("FOUND at {} but failed to get version", path.display());
            false
        }
    }
}

fn check_key(usable: bool, masked: Option<&str>, env: &str) -> bool {
    if usable {
        println!("OK ({})", masked.unwrap_or_default());
    } else {
        println!("NOT SET");
        println!("                Set {} in the environment or a .env file", env);
    }
    usable
}
