use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vulnverify", version, about = "Runtime verification of dependency alerts against Dynatrace security events")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify catalog entries against runtime security events
    Verify(VerifyArgs),
    /// List open vulnerabilities reported for the environment
    List(ListArgs),
    /// Execute a raw DQL query and print the records
    Query(QueryArgs),
    /// Start the MCP relay HTTP server
    Serve(ServeArgs),
    /// Validate a catalog file without making network calls
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct VerifyArgs {
    /// YAML catalog file (defaults to the built-in catalog)
    #[arg(short, long)]
    pub catalog: Option<String>,

    /// Repository owner for alert dismissal and comments
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long)]
    pub repo: Option<String>,

    /// Issue number the verification report is posted to
    #[arg(long)]
    pub issue: Option<u64>,

    /// Path for the JSON results file
    #[arg(long)]
    pub results: Option<String>,

    /// Container image path prefix for the presence check
    #[arg(long)]
    pub prefix: Option<String>,

    /// Use the unauthenticated gateway execute endpoint
    #[arg(long)]
    pub gateway: bool,

    /// Classify and write results but skip GitHub side effects
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Clone)]
pub struct ListArgs {
    /// Lookback window in days
    #[arg(long, default_value = "7")]
    pub days: u32,

    /// Comma-separated severities (CRITICAL,HIGH,MEDIUM,LOW)
    #[arg(long)]
    pub severity: Option<String>,

    /// Only vulnerabilities whose function is observed in use
    #[arg(long)]
    pub function_in_use: bool,

    /// Restrict to a single CVE
    #[arg(long)]
    pub cve: Option<String>,

    /// Restrict to a single affected entity id
    #[arg(long)]
    pub entity: Option<String>,

    /// Output format: json, csv, markdown
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Use the unauthenticated gateway execute endpoint
    #[arg(long)]
    pub gateway: bool,
}

#[derive(Args, Clone)]
pub struct QueryArgs {
    /// DQL query string
    pub query: String,

    /// Use the unauthenticated gateway execute endpoint
    #[arg(long)]
    pub gateway: bool,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen port
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Listen address
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Catalog file to validate
    pub catalog: String,
}
