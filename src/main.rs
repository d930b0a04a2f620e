//! simforge - deploy .app bundles and decrypted .ipa packages to the iOS Simulator.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match simforge::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("  {}", hint);
            }
            1
        }
    };

    process::exit(exit_code);
}
