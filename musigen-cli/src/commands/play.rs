//! Real-time playback with source switching from stdin.
//!
//! Commands, one per line: `sine`, `fm`, `wavetable`, `stop`, `quit`.
//! A level meter from the monitor snapshot is logged while a source plays.

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use musigen_engine::{Engine, SourceKind};

use super::common::{meter_line, parse_source, EngineArgs};

const METER_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Args)]
pub struct PlayArgs {
    /// Source to start with: sine, fm, wavetable or stop
    #[arg(short, long, default_value = "sine", value_parser = parse_source)]
    source: SourceKind,

    /// Stop after this many seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Output device (substring of its name)
    #[arg(long)]
    device: Option<String>,

    /// Do not log the level meter
    #[arg(long)]
    quiet: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

enum Control {
    Select(SourceKind),
    Quit,
    /// stdin closed
    Eof,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut cfg = args.engine.load()?;
    if args.device.is_some() {
        cfg.device_name = args.device.clone();
    }

    let mut engine = Engine::with_cpal(cfg)?;
    println!("Using device: {}", engine.device_name());
    println!("Commands: sine | fm | wavetable | stop | quit  (Ctrl+C quits)\n");

    let (tx, rx) = mpsc::channel();
    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Control::Quit);
    })?;
    spawn_stdin_reader(tx);

    engine.select_source(args.source)?;

    let deadline = args
        .duration
        .and_then(|secs| Duration::try_from_secs_f64(secs.max(0.0)).ok())
        .map(|d| Instant::now() + d);

    loop {
        let wait = match deadline {
            Some(d) => match d.checked_duration_since(Instant::now()) {
                Some(left) => left.min(METER_INTERVAL),
                None => break,
            },
            None => METER_INTERVAL,
        };

        match rx.recv_timeout(wait) {
            Ok(Control::Select(kind)) => {
                if let Err(err) = engine.select_source(kind) {
                    // The engine is stopped; the user may pick again.
                    tracing::warn!(error = %err, "switch failed");
                }
            }
            Ok(Control::Quit) => break,
            // Without a deadline, closing stdin ends playback.
            Ok(Control::Eof) if deadline.is_none() => break,
            Ok(Control::Eof) => {}
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if !args.quiet && engine.is_playing() {
                    tracing::info!(source = %engine.active_source(), "{}", meter_line(&engine.snapshot()));
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) if deadline.is_none() => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => thread::sleep(wait),
        }
    }

    engine.teardown()?;
    println!("Stopped.");
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::Sender<Control>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let word = line.trim();
            if word.is_empty() {
                continue;
            }
            let msg = match word.to_ascii_lowercase().as_str() {
                "quit" | "exit" | "q" => Control::Quit,
                other => match other.parse::<SourceKind>() {
                    Ok(kind) => Control::Select(kind),
                    Err(err) => {
                        eprintln!("{err}");
                        continue;
                    }
                },
            };
            if tx.send(msg).is_err() {
                return;
            }
        }
        let _ = tx.send(Control::Eof);
    });
}
