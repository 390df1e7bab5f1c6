//! REQUEST-QUOTE command - Submit a quote request with an API key.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CliError, HumanReadable, format_timestamp, make_request, output};

#[derive(Debug, Clone, Copy, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Translation,
    Evaluation,
}

/// Arguments for the request-quote command.
#[derive(Args)]
pub struct RequestQuoteArgs {
    /// API key (`sk_...`)
    #[arg(long, env = "OPENEVAL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Client's full name
    #[arg(long)]
    pub name: String,

    /// Client's email address
    #[arg(long)]
    pub email: String,

    #[arg(long, value_enum, default_value = "translation")]
    pub service: Service,

    /// Source language
    #[arg(long)]
    pub from: Option<String>,

    /// Target language
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
struct QuoteRequest<'a> {
    client_name: &'a str,
    client_email: &'a str,
    service_type: Service,
    source_language: Option<&'a str>,
    target_language: Option<&'a str>,
    notes: Option<&'a str>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QuoteResponse {
    pub id: Uuid,
    pub source: String,
    pub client_name: String,
    pub client_email: String,
    pub service_type: String,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl HumanReadable for QuoteResponse {
    fn print_human(&self) {
        println!("{}", "Quote request submitted".green().bold());
        println!();
        println!("  {} {}", "ID:".cyan(), self.id);
        println!(
            "  {} {} <{}>",
            "Client:".cyan(),
            self.client_name,
            self.client_email
        );
        println!("  {} {}", "Service:".cyan(), self.service_type);
        if let (Some(from), Some(to)) = (&self.source_language, &self.target_language) {
            println!("  {} {} -> {}", "Languages:".cyan(), from, to);
        }
        println!("  {} {}", "Status:".cyan(), self.status);
        println!("  {} {}", "Created:".cyan(), format_timestamp(&self.created_at));
    }
}

/// Execute the request-quote command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: RequestQuoteArgs,
) -> Result<()> {
    let api_key = args
        .api_key
        .as_deref()
        .ok_or(CliError::MissingCredential("--api-key or OPENEVAL_API_KEY"))?;

    let body = QuoteRequest {
        client_name: &args.name,
        client_email: &args.email,
        service_type: args.service,
        source_language: args.from.as_deref(),
        target_language: args.to.as_deref(),
        notes: args.notes.as_deref(),
    };

    let url = format!("{}/api/v1/quote-requests", base_url);
    let response: QuoteResponse =
        make_request(client.post(&url).bearer_auth(api_key).json(&body)).await?;

    output(&response, human)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = QuoteRequest {
            client_name: "Ana",
            client_email: "ana@example.com",
            service_type: Service::Evaluation,
            source_language: Some("Spanish"),
            target_language: None,
            notes: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["service_type"], "evaluation");
        assert_eq!(json["source_language"], "Spanish");
        assert_eq!(json["target_language"], serde_json::Value::Null);
    }
}
