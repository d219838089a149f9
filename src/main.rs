use clap::Parser;
use tracing_subscriber::EnvFilter;

use vulnverify::cli::{self, Cli, Commands};
use vulnverify::errors::VerifyError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();

    let result = match cli.command {
        Commands::Verify(args) => match cli::verify::handle_verify(args).await {
            // Exit status reflects whether anything was confirmed, not
            // whether the dismissal side effects succeeded.
            Ok(summary) if summary.confirmed > 0 => std::process::exit(1),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        },
        Commands::List(args) => cli::list::handle_list(args).await,
        Commands::Query(args) => cli::query::handle_query(args).await,
        Commands::Serve(args) => cli::serve::handle_serve(args).await,
        Commands::Validate(args) => handle_validate(args).await,
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            let exit_code = match &e {
                VerifyError::Config(_) => 2,
                VerifyError::Catalog(_) => 2,
                VerifyError::Authentication(_) => 4,
                VerifyError::QueryApi(_) => 5,
                _ => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn handle_validate(args: cli::commands::ValidateArgs) -> Result<(), VerifyError> {
    let path = std::path::PathBuf::from(&args.catalog);
    let records = vulnverify::config::load_catalog(&path).await?;
    println!("Catalog is valid: {} ({} entries)", args.catalog, records.len());
    Ok(())
}
