//! Standalone validator for user data files.
//!
//! Checks that the bot's JSON state file parses and that every record is
//! consistent.

use std::process::ExitCode;

use clap::Parser;

use weather_forecast_bot::storage::{
    JsonFileStore, UserStore, example_users, validate_records,
};

/// User data file validator.
#[derive(Parser, Debug)]
#[command(name = "validate_user_data")]
#[command(about = "Validates the user data file of the Telegram weather bot")]
#[command(version)]
struct Args {
    /// Path to the JSON user data file to validate.
    #[arg(short, long, default_value = "user_data.json")]
    file: String,

    /// Generate an example user data file at the specified path.
    #[arg(long)]
    generate_example: Option<String>,

    /// Show every record.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(output_path) = args.generate_example {
        return generate_example(&output_path);
    }

    validate_file(&args.file, args.verbose)
}

fn generate_example(output_path: &str) -> ExitCode {
    let users = example_users();

    match JsonFileStore::new(output_path).save(&users) {
        Ok(()) => {
            println!("✓ Example user data written to: {output_path}");
            println!("\nThe file contains {} example users.", users.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write example file: {e}");
            ExitCode::FAILURE
        }
    }
}

fn validate_file(path: &str, verbose: bool) -> ExitCode {
    println!("Validating: {path}\n");

    let users = match JsonFileStore::new(path).load_strict() {
        Ok(users) => users,
        Err(e) => {
            eprintln!("✗ Failed to load user data: {e}");
            return ExitCode::FAILURE;
        }
    };

    if verbose {
        for (user_id, record) in &users {
            println!(
                "[{}] city: {}, subscribed: {}",
                user_id,
                record.city.as_deref().unwrap_or("-"),
                record.subscribed
            );
        }
        println!();
    }

    let issues = validate_records(&users);
    let subscribed = users.values().filter(|record| record.subscribed).count();

    if issues.is_empty() {
        println!("✓ All {} records are valid!", users.len());
        println!("  Subscribed: {subscribed}/{}", users.len());
        ExitCode::SUCCESS
    } else {
        for issue in &issues {
            println!("  ✗ Error: {issue}");
        }
        println!();
        println!(
            "✗ Validation failed: {} issue(s) in {} records",
            issues.len(),
            users.len()
        );
        ExitCode::FAILURE
    }
}
