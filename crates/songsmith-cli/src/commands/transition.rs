use anyhow::Result;
use songsmith_core::splicer::SpliceSettings;
use songsmith_core::TransitionOptions;

use super::{load_config, with_progress};
use crate::args::{GlobalArgs, TransitionArgs};

pub async fn run(args: &TransitionArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;

    let settings = SpliceSettings {
        song_duration: args
            .song_duration
            .unwrap_or(config.transition.song_duration_secs),
        silence: args.silence.unwrap_or(config.transition.silence_secs),
        trim_from_end: args.trim_from_end,
        trim_to_start: args.trim_to_start,
    };

    let mut options = TransitionOptions::new(&args.first, &args.second);
    options.settings = settings;
    options.output = args.output.clone();
    options.pre_inpaint_output = args.pre_inpaint_output.clone();

    let outcome = with_progress(config, |pipeline| async move {
        pipeline.transition(&options).await
    })
    .await?;

    let (start, end) = outcome.plan.inpaint_section();
    println!("\nPre-inpaint: {}", outcome.pre_inpaint_path.display());
    println!("Inpainted:   {:.2}s - {:.2}s", start, end);
    println!("Transition:  {}", outcome.path.display());

    Ok(())
}
