use console::style;

use crate::models::{Classification, RunSummary, VerificationResult};

/// Print the end-of-run summary to the terminal.
pub fn print_run_summary(results: &[VerificationResult], summary: &RunSummary) {
    println!("\n{}", style("=== VERIFICATION SUMMARY ===").bold());
    println!("Total vulnerabilities checked: {}", summary.total);
    println!(
        "Confirmed vulnerabilities: {}",
        style(summary.confirmed).red().bold()
    );
    println!(
        "Not-confirmed vulnerabilities: {}",
        style(summary.not_confirmed).green()
    );
    if summary.dismissed > 0 || summary.dismiss_failures > 0 {
        println!(
            "Alerts dismissed: {} ({} failed)",
            summary.dismissed, summary.dismiss_failures
        );
    }

    for result in results {
        let marker = match result.status {
            Classification::Confirmed => style("✗").red(),
            Classification::NotConfirmed => style("✓").green(),
        };
        println!(
            "  {} {} ({}) in {} — {}",
            marker,
            style(&result.cve).cyan(),
            result.package,
            result.service,
            result.reason
        );
    }

    if summary.confirmed > 0 {
        println!(
            "\n{}",
            style(format!(
                "Found {} confirmed vulnerabilities that need fixing.",
                summary.confirmed
            ))
            .red()
        );
    } else {
        println!("\n{}", style("No confirmed vulnerabilities found.").green());
    }
}
