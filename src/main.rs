use clap::Parser;
use htmlzip2pdf::{exit_code_for, Cli, Converter, OutputFormatter, UserFriendlyError};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();
    setup_logging(&cli);

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let Some(archive) = cli.archive.clone() else {
        eprintln!("No archive given. Run with --help for usage.");
        return 2;
    };

    let mut converter = match Converter::from_cli(&cli) {
        Ok(converter) => converter,
        Err(e) => {
            let formatter = OutputFormatter::new(cli.output_mode(), 0, false);
            formatter.print_user_friendly_error(&e);
            return exit_code_for(&e);
        }
    };

    match converter.process_selection(&[archive]) {
        Some(Ok(_)) | None => 0,
        Some(Err(e)) => exit_code_for(&e),
    }
}

fn setup_logging(cli: &Cli) {
    let filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli.generated_config_path();

    match Converter::generate_sample_config(&config_path) {
        Ok(()) => {
            println!(
                "Generated sample configuration file: {}",
                config_path.display()
            );
            println!("\nTo use this configuration:");
            println!(
                "  htmlzip2pdf <archive.zip> --config {}",
                config_path.display()
            );
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            exit_code_for(&e)
        }
    }
}
