use anyhow::Result;
use songsmith_core::SongOptions;

use super::{load_config, with_progress};
use crate::args::{GlobalArgs, SongArgs};

pub async fn run(args: &SongArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let options = SongOptions {
        prompt: args.prompt.clone(),
        output: args.output.clone(),
    };

    let outcome = with_progress(config, |pipeline| async move {
        pipeline.generate_song(&options).await
    })
    .await?;

    let song = &outcome.song;
    println!("\nSong: {}", outcome.path.display());
    println!("Task: {}", song.task_id);
    if let Some(seed) = song.seed {
        println!("Seed: {}", seed);
    }
    if !song.tags.is_empty() {
        println!("Tags: {}", song.tags.join(", "));
    }
    if let Some(lyrics) = song.lyrics.as_deref().filter(|l| !l.trim().is_empty()) {
        println!("\nLyrics:\n{}", lyrics);
    }

    Ok(())
}
