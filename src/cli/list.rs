use std::path::PathBuf;

use tracing::info;

use crate::cli::commands::ListArgs;
use crate::config::Settings;
use crate::dynatrace::{vulnerability_report_query, DynatraceClient, QueryOutcome, ReportQueryOptions, SecurityBackend};
use crate::errors::VerifyError;
use crate::reporting::{format_vulnerability_listing, ListFormat};

pub async fn handle_list(args: ListArgs) -> Result<(), VerifyError> {
    let format = ListFormat::parse(&args.format)?;
    let settings = Settings::from_env(args.gateway)?;

    let opts = ReportQueryOptions {
        days: args.days,
        severities: args
            .severity
            .as_deref()
            .map(|s| s.split(',').map(|p| p.trim().to_uppercase()).collect())
            .unwrap_or_default(),
        function_in_use: args.function_in_use,
        cve: args.cve.clone(),
        entity_id: args.entity.clone(),
    };

    let backend = DynatraceClient::new(reqwest::Client::new(), &settings);
    let records = match backend.execute(&vulnerability_report_query(&opts)).await {
        QueryOutcome::Records(records) => records,
        QueryOutcome::Empty => Vec::new(),
        QueryOutcome::Error(detail) => return Err(VerifyError::QueryApi(detail)),
    };

    info!(count = records.len(), "Retrieved vulnerability report");

    let rendered = format_vulnerability_listing(&records, format)?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(PathBuf::from(path), &rendered).await?;
            println!("Wrote {} records to {}", records.len(), path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
