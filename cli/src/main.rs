//! Command-line interface for the OpenEval API.
//!
//! Commands:
//! - request-quote: Submit a quote request with an API key
//! - clio-quotes: List, show and assign matters to Clio quotes
//! - download: Fetch the Clio document behind a quote
//! - upload-evaluation: File a finished evaluation in the quote's Clio matter
//! - api-keys: Create, list and revoke API keys
//! - gen-key: Print a new TOKEN_ENCRYPTION_KEY
//!
//! Configuration via environment:
//! - OPENEVAL_URL: Base URL of the server (default: http://localhost:3000)
//! - OPENEVAL_TOKEN: Supabase session token for bearer-authenticated commands
//! - OPENEVAL_API_KEY: API key for request-quote

mod commands;

use clap::{Parser, Subcommand};

use commands::{
    api_keys::ApiKeysArgs,
    clio_quotes::ClioQuotesArgs,
    documents::{DownloadArgs, UploadEvaluationArgs},
    request_quote::RequestQuoteArgs,
};

/// OpenEval CLI
///
/// Prints JSON by default; pass --human for formatted output.
#[derive(Parser)]
#[command(name = "openeval")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output human-readable formatted text instead of JSON
    #[arg(long, global = true)]
    human: bool,

    /// OpenEval server URL
    #[arg(
        long,
        env = "OPENEVAL_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    url: String,

    /// Supabase session token
    #[arg(long, env = "OPENEVAL_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a quote request (API key auth)
    RequestQuote(RequestQuoteArgs),

    /// Work with quotes created from Clio
    ClioQuotes(ClioQuotesArgs),

    /// Download the Clio document a quote was created from
    Download(DownloadArgs),

    /// Upload an evaluation into the quote's Clio matter
    UploadEvaluation(UploadEvaluationArgs),

    /// Manage API keys
    ApiKeys(ApiKeysArgs),

    /// Generate a token encryption key
    GenKey,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let base_url = cli.url.trim_end_matches('/').to_string();

    let client = match commands::build_client(cli.token.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::RequestQuote(args) => {
            commands::request_quote::execute(&client, &base_url, cli.human, args).await
        }
        Commands::ClioQuotes(args) => {
            commands::clio_quotes::execute(&client, &base_url, cli.human, args).await
        }
        Commands::Download(args) => {
            commands::documents::download(&client, &base_url, cli.human, args).await
        }
        Commands::UploadEvaluation(args) => {
            commands::documents::upload_evaluation(&client, &base_url, cli.human, args).await
        }
        Commands::ApiKeys(args) => {
            commands::api_keys::execute(&client, &base_url, cli.human, args).await
        }
        Commands::GenKey => commands::gen_key::execute(cli.human),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
