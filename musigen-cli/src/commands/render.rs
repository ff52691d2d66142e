//! Headless rendering through the manually pulled device.

use clap::Args;
use musigen_engine::{Engine, ManualDevice, SourceKind};

use super::common::{meter_line, parse_source, EngineArgs};

#[derive(Args)]
pub struct RenderArgs {
    /// Source to render: sine, fm, wavetable or stop
    #[arg(short, long, default_value = "sine", value_parser = parse_source)]
    source: SourceKind,

    /// Number of blocks to pull
    #[arg(long, default_value_t = 16)]
    blocks: usize,

    /// Frames per pulled block (overrides --block-size and the config file)
    #[arg(long)]
    frames: Option<u32>,

    #[command(flatten)]
    engine: EngineArgs,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = args.engine.load()?;
    if let Some(frames) = args.frames {
        cfg.block_size = Some(frames);
        cfg.validate()?;
    }
    let frames = cfg.block_size.unwrap_or(512) as usize;
    let channels = usize::from(cfg.channels);

    let (device, driver) = ManualDevice::new();
    let mut engine = Engine::new(device, cfg)?;
    engine.select_source(args.source)?;

    let mut rendered = Vec::with_capacity(args.blocks * frames * channels);
    for _ in 0..args.blocks {
        match driver.pull(frames) {
            Some(block) => rendered.extend_from_slice(&block),
            // stop keeps no stream open
            None => rendered.resize(rendered.len() + frames * channels, 0.0),
        }
    }

    println!(
        "{}: {} blocks x {} frames x {} ch",
        args.source, args.blocks, frames, channels
    );
    println!("output  : {}", meter_line(&rendered));
    println!("monitor : {}", meter_line(&engine.snapshot()));
    println!("faults  : {}", engine.render_faults());

    engine.teardown()?;
    Ok(())
}
