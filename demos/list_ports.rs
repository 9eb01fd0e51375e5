// Serial port discovery example
//
// This example lists the serial ports on this host that can currently be opened.

use sensor_core_rs::{list_available_ports, list_available_ports_for};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (optional)
    env_logger::init();

    println!("Serial Port Discovery Example");
    println!("=============================\n");

    // An explicit platform identifier can be passed as the first argument
    let ports = match std::env::args().nth(1) {
        Some(platform) => list_available_ports_for(&platform)?,
        None => list_available_ports()?,
    };

    if ports.is_empty() {
        println!("No openable serial ports found.");
        return Ok(());
    }

    println!("Found {} port(s):", ports.len());
    for (i, port) in ports.iter().enumerate() {
        println!("  {}. {}", i + 1, port);
    }

    Ok(())
}
