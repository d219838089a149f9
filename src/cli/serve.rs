use tracing::info;

use crate::cli::commands::ServeArgs;
use crate::errors::VerifyError;
use crate::relay;

pub async fn handle_serve(args: ServeArgs) -> Result<(), VerifyError> {
    info!(host = %args.host, port = args.port, "Starting MCP relay");

    let state = relay::create_app_state(reqwest::Client::new())?;
    let app = relay::build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| VerifyError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
