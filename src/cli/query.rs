use crate::cli::commands::QueryArgs;
use crate::config::Settings;
use crate::dynatrace::{DynatraceClient, QueryOutcome, SecurityBackend};
use crate::errors::VerifyError;

pub async fn handle_query(args: QueryArgs) -> Result<(), VerifyError> {
    let settings = Settings::from_env(args.gateway)?;
    let backend = DynatraceClient::new(reqwest::Client::new(), &settings);

    match backend.execute(&args.query).await {
        QueryOutcome::Records(records) => {
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        QueryOutcome::Empty => {
            println!("[]");
            Ok(())
        }
        QueryOutcome::Error(detail) => Err(VerifyError::QueryApi(detail)),
    }
}
