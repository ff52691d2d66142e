//! Output device listing.

use clap::Args;
use musigen_engine::cpal_device::{default_output_device_name, list_output_devices};

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_output_devices()?;
    if devices.is_empty() {
        println!("No output devices found.");
        return Ok(());
    }

    let default = default_output_device_name();
    println!("Output devices:");
    for (idx, name) in devices.iter().enumerate() {
        let marker = if default.as_deref() == Some(name.as_str()) { " (default)" } else { "" };
        println!("  [{idx}] {name}{marker}");
    }
    Ok(())
}
