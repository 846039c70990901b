//! Output device listing.

use patchwork_io::list_output_devices;

pub fn run() -> anyhow::Result<()> {
    let devices = list_output_devices()?;
    if devices.is_empty() {
        println!("No output devices found.");
        return Ok(());
    }
    println!("Output devices:");
    for (index, name) in devices.iter().enumerate() {
        println!("  [{index}] {name}");
    }
    Ok(())
}
