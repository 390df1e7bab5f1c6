//! API-KEYS command - Manage keys for the quote ingestion API.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{HumanReadable, confirm, format_timestamp, make_request, output, send};

#[derive(Args)]
pub struct ApiKeysArgs {
    #[command(subcommand)]
    pub action: ApiKeysAction,
}

#[derive(Subcommand)]
pub enum ApiKeysAction {
    /// Create a key. The raw key is printed once.
    Create {
        /// Label to recognise the key by
        name: String,
    },

    /// List your keys
    List,

    /// Revoke a key
    Revoke {
        id: Uuid,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiKeySummary {
    pub id: Uuid,
    pub name: String,
    pub key_prefix: String,
    pub revoked: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatedApiKey {
    pub key: String,
    #[serde(flatten)]
    pub summary: ApiKeySummary,
}

impl HumanReadable for CreatedApiKey {
    fn print_human(&self) {
        println!("{}", "API key created".green().bold());
        println!();
        println!("  {} {}", "ID:".cyan(), self.summary.id);
        println!("  {} {}", "Name:".cyan(), self.summary.name);
        println!("  {} {}", "Key:".cyan(), self.key.bold());
        println!();
        println!("  {}", "Store this key now; it will not be shown again.".yellow());
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiKeyList {
    pub keys: Vec<ApiKeySummary>,
}

impl HumanReadable for ApiKeyList {
    fn print_human(&self) {
        println!("{}", "API Keys".green().bold());
        println!("{}", "=".repeat(80));
        println!();

        if self.keys.is_empty() {
            println!("  {}", "(No keys)".dimmed());
            return;
        }

        for key in &self.keys {
            let state = if key.revoked {
                "revoked".red()
            } else {
                "active".green()
            };
            println!("  {} sk_{}... [{}]", key.name.bold(), key.key_prefix, state);
            println!("    {} {}", "ID:".cyan(), key.id);
            println!("    {} {}", "Created:".cyan(), format_timestamp(&key.created_at));
            match &key.last_used_at {
                Some(ts) => println!("    {} {}", "Last used:".cyan(), format_timestamp(ts)),
                None => println!("    {} {}", "Last used:".cyan(), "never".dimmed()),
            }
            println!();
        }
    }
}

#[derive(Serialize)]
struct CreateApiKeyRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct RevokedKey {
    id: Uuid,
    revoked: bool,
}

impl HumanReadable for RevokedKey {
    fn print_human(&self) {
        println!("{} {}", "Revoked API key".green().bold(), self.id);
    }
}

/// Execute the api-keys command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: ApiKeysArgs,
) -> Result<()> {
    let url = format!("{}/api/api-keys", base_url);

    match args.action {
        ApiKeysAction::Create { name } => {
            let response: CreatedApiKey =
                make_request(client.post(&url).json(&CreateApiKeyRequest { name: &name })).await?;
            output(&response, human)
        }
        ApiKeysAction::List => {
            let response: ApiKeyList = make_request(client.get(&url)).await?;
            output(&response, human)
        }
        ApiKeysAction::Revoke { id, yes } => {
            if human && !yes && !confirm(&format!("Revoke API key {}?", id))? {
                eprintln!("Aborted.");
                return Ok(());
            }
            send(client.delete(format!("{}/{}", url, id))).await?;
            output(&RevokedKey { id, revoked: true }, human)
        }
    }
}
