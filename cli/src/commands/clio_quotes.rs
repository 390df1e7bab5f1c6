//! CLIO-QUOTES command - Back-office view of quotes created from Clio.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{HumanReadable, format_timestamp, make_request, output, truncate};

#[derive(Args)]
pub struct ClioQuotesArgs {
    #[command(subcommand)]
    pub action: ClioQuotesAction,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Pending,
    Completed,
}

impl StatusFilter {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

#[derive(Subcommand)]
pub enum ClioQuotesAction {
    /// List Clio quotes (admin)
    List {
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,

        #[arg(long, default_value = "50")]
        limit: i64,

        #[arg(long, default_value = "0")]
        offset: i64,
    },

    /// Show one Clio quote
    Show { id: Uuid },

    /// Assign the Clio matter an evaluation should be filed under
    AssignMatter {
        id: Uuid,

        /// Numeric Clio matter id
        matter_id: i64,
    },
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ClioQuote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clio_subject_id: i64,
    pub clio_subject_type: String,
    pub clio_matter_id: Option<i64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub subject_description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClioQuote {
    fn status_label(&self) -> colored::ColoredString {
        match self.status.as_str() {
            "completed" => self.status.green(),
            _ => self.status.yellow(),
        }
    }

    fn matter_label(&self) -> String {
        self.clio_matter_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "(none)".to_string())
    }
}

impl HumanReadable for ClioQuote {
    fn print_human(&self) {
        println!("{} {}", "Clio quote".green().bold(), self.id);
        println!();
        println!("  {} {}", "Status:".cyan(), self.status_label());
        println!(
            "  {} {} {}",
            "Subject:".cyan(),
            self.clio_subject_type,
            self.clio_subject_id
        );
        println!("  {} {}", "Matter:".cyan(), self.matter_label());
        if let Some(description) = &self.subject_description {
            println!("  {} {}", "Description:".cyan(), description);
        }
        match (&self.client_name, &self.client_email) {
            (Some(name), Some(email)) => println!("  {} {} <{}>", "Client:".cyan(), name, email),
            (Some(name), None) => println!("  {} {}", "Client:".cyan(), name),
            (None, Some(email)) => println!("  {} <{}>", "Client:".cyan(), email),
            (None, None) => {}
        }
        println!("  {} {}", "Owner:".cyan(), self.user_id);
        println!("  {} {}", "Created:".cyan(), format_timestamp(&self.created_at));
        println!("  {} {}", "Updated:".cyan(), format_timestamp(&self.updated_at));
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ClioQuoteList {
    pub quotes: Vec<ClioQuote>,
    pub limit: i64,
    pub offset: i64,
}

impl HumanReadable for ClioQuoteList {
    fn print_human(&self) {
        println!("{}", "Clio Quotes".green().bold());
        println!("{}", "=".repeat(80));
        println!();

        if self.quotes.is_empty() {
            println!("  {}", "(No quotes)".dimmed());
            return;
        }

        for quote in &self.quotes {
            let description = quote
                .subject_description
                .as_deref()
                .map(|d| truncate(d, 50))
                .unwrap_or_default();
            println!(
                "  {} [{}] {} {}",
                quote.id,
                quote.status_label(),
                quote.clio_subject_type,
                description.bold()
            );
            println!(
                "    {} {}  {} {}",
                "Matter:".cyan(),
                quote.matter_label(),
                "Created:".cyan(),
                format_timestamp(&quote.created_at)
            );
        }

        println!();
        println!(
            "  {} {} (offset {})",
            "Shown:".cyan(),
            self.quotes.len(),
            self.offset
        );
    }
}

#[derive(Serialize)]
struct AssignMatterRequest {
    matter_id: i64,
}

/// Execute the clio-quotes command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: ClioQuotesArgs,
) -> Result<()> {
    match args.action {
        ClioQuotesAction::List {
            status,
            limit,
            offset,
        } => {
            let url = format!("{}/api/admin/clio-quotes", base_url);
            let mut query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
            if let Some(status) = status {
                query.push(("status", status.as_str().to_string()));
            }
            let response: ClioQuoteList = make_request(client.get(&url).query(&query)).await?;
            output(&response, human)
        }
        ClioQuotesAction::Show { id } => {
            let url = format!("{}/api/admin/clio-quotes/{}", base_url, id);
            let response: ClioQuote = make_request(client.get(&url)).await?;
            output(&response, human)
        }
        ClioQuotesAction::AssignMatter { id, matter_id } => {
            if matter_id <= 0 {
                anyhow::bail!("matter_id must be a positive integer");
            }
            let url = format!("{}/api/admin/clio-quotes/{}/matter", base_url, id);
            let response: ClioQuote =
                make_request(client.patch(&url).json(&AssignMatterRequest { matter_id })).await?;
            output(&response, human)
        }
    }
}
