//! Interactive device menu.

use crate::app::{build_controller, report_outcome};
use agent_core::Config;
use agent_readings::{ReadingSource, SimulatedSource};
use std::io::Write;

fn print_menu() {
    println!();
    println!("========================================");
    println!("FieldSense Telemetry Agent");
    println!("========================================");
    println!("Select mode:");
    println!("1. Take reading");
    println!("2. Take picture");
    println!("3. Real-time mode");
    println!("4. Exit");
    println!("========================================");
    print!("Enter your choice (1-4): ");
    let _ = std::io::stdout().flush();
}

/// Run the interactive menu until the operator exits.
pub async fn run_menu(config: Config) -> anyhow::Result<()> {
    let controller = build_controller(&config)?;
    let mut source = SimulatedSource::new(&config.serial_number);

    loop {
        print_menu();

        // Keep the blocking stdin read off the async worker threads
        let (bytes_read, line) = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let n = std::io::stdin().read_line(&mut line)?;
            Ok::<_, std::io::Error>((n, line))
        })
        .await??;

        if bytes_read == 0 {
            break;
        }

        match line.trim() {
            "1" => {
                println!("Taking sensor readings...");
                let reading = source.next_reading();
                for (name, value) in reading.metrics() {
                    println!("  - {name}: {value}");
                }
                let result = controller.send(&reading).await;
                report_outcome(&result);
            }
            "2" => {
                println!("Image capture is not available on this build.");
            }
            "3" => {
                println!("Real-time mode runs as a service: use `fieldsense-agent run`.");
            }
            "4" => {
                println!("Exiting...");
                break;
            }
            _ => {
                println!("Invalid choice. Please try again.");
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}
