use anyhow::Result;
use songsmith_core::TelegramOrder;

use super::{load_config, with_progress};
use crate::args::{GlobalArgs, TelegramArgs};

pub async fn run(args: &TelegramArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;

    let mut order = TelegramOrder::new(&args.recipient, &args.occasion, &args.message);
    order.style = args.style.clone();
    order.image_url = args.image_url.clone();
    order.resolution = args.resolution.clone();

    println!("Prompt: {}\n", order.prompt());

    let outcome = with_progress(config, |pipeline| async move {
        pipeline.singing_telegram(&order).await
    })
    .await?;

    println!("\nSong:  {}", outcome.song_path.display());
    println!("Video: {}", outcome.video_path.display());
    println!("Video URL: {}", outcome.video.url);

    Ok(())
}
