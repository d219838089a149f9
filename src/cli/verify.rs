use std::path::PathBuf;

use tracing::info;

use crate::cli::commands::VerifyArgs;
use crate::config::{self, Settings};
use crate::dynatrace::DynatraceClient;
use crate::errors::VerifyError;
use crate::github::GithubClient;
use crate::models::RunSummary;
use crate::reporting::print_run_summary;
use crate::verifier::Verifier;

pub async fn handle_verify(args: VerifyArgs) -> Result<RunSummary, VerifyError> {
    let mut settings = Settings::from_env(args.gateway)?;
    apply_overrides(&mut settings, &args);

    info!(environment = %settings.backend_environment, "Dynatrace environment");

    let catalog = match &args.catalog {
        Some(path) => config::load_catalog(&PathBuf::from(path)).await?,
        None => config::builtin_catalog(),
    };
    config::validate_catalog(&catalog)?;

    let http = reqwest::Client::new();
    let backend = DynatraceClient::new(http.clone(), &settings);

    let github = settings
        .github_token
        .as_ref()
        .map(|token| {
            GithubClient::new(
                http.clone(),
                token.clone(),
                &settings.repo_owner,
                &settings.repo_name,
            )
        });

    let verifier = Verifier::new(&backend, github.as_ref(), &settings, args.dry_run);
    let (results, summary) = verifier.run(&catalog).await?;

    print_run_summary(&results, &summary);
    Ok(summary)
}

fn apply_overrides(settings: &mut Settings, args: &VerifyArgs) {
    if let Some(owner) = &args.owner {
        settings.repo_owner = owner.clone();
    }
    if let Some(repo) = &args.repo {
        settings.repo_name = repo.clone();
    }
    if let Some(issue) = args.issue {
        settings.report_issue = issue;
    }
    if let Some(results) = &args.results {
        settings.results_path = results.clone();
    }
    if let Some(prefix) = &args.prefix {
        settings.image_prefix = prefix.clone();
    }
}
