/// Example program to print the loaded configuration
///
/// Run with: cargo run -p between-config --example print_config

fn main() {
    // Load configuration from between.toml
    let config = between_config::BetweenConfig::load();

    println!("=== Between Configuration ===\n");

    println!("Transition Defaults:");
    println!("  Easing: {}", config.transition.easing);
    println!("  Duration: {}ms", config.transition.duration_ms);
    println!(
        "  Override Incoming Opacity: {}",
        config.transition.override_incoming_opacity
    );
    println!();

    println!("Logging:");
    println!("  Filter: {:?}", config.logging.filter);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
