//! DOWNLOAD and UPLOAD-EVALUATION commands - Move documents between Clio
//! and the local machine through the OpenEval document bridge.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clio_quotes::ClioQuote;
use super::{HumanReadable, make_request, output, send};

#[derive(Args)]
pub struct DownloadArgs {
    /// Clio quote whose source document to fetch
    pub id: Uuid,

    /// Where to write the file (default: the document's own name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct UploadEvaluationArgs {
    /// Clio quote to complete
    pub id: Uuid,

    /// Evaluation file to file under the quote's Clio matter
    pub file: PathBuf,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UploadEvaluationResponse {
    pub quote: ClioQuote,
    pub clio_document_id: i64,
    pub clio_document_uuid: String,
}

impl HumanReadable for UploadEvaluationResponse {
    fn print_human(&self) {
        println!("{}", "Evaluation uploaded to Clio".green().bold());
        println!();
        println!("  {} {}", "Quote:".cyan(), self.quote.id);
        println!("  {} {}", "Status:".cyan(), self.quote.status);
        println!("  {} {}", "Clio document:".cyan(), self.clio_document_id);
    }
}

#[derive(Debug, Serialize)]
struct DownloadResult {
    path: String,
    bytes: usize,
}

impl HumanReadable for DownloadResult {
    fn print_human(&self) {
        println!(
            "{} {} ({} bytes)",
            "Saved".green().bold(),
            self.path,
            self.bytes
        );
    }
}

/// Filename from a `Content-Disposition` header, preferring the encoded
/// `filename*` form. Path components are stripped.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let params: Vec<(&str, &str)> = header
        .split(';')
        .filter_map(|p| p.trim().split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let encoded = params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("filename*"))
        .and_then(|(_, v)| v.split_once("''"))
        .and_then(|(_, v)| urlencoding::decode(v).ok())
        .map(|v| v.into_owned());
    let plain = || {
        params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("filename"))
            .map(|(_, v)| v.trim_matches('"').to_string())
    };

    encoded
        .or_else(plain)
        .and_then(|name| {
            Path::new(&name)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .filter(|name| !name.is_empty())
}

/// Content type for an upload, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Execute the download command.
pub async fn download(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: DownloadArgs,
) -> Result<()> {
    let url = format!("{}/api/admin/clio-quotes/{}/document", base_url, args.id);
    let response = send(client.get(&url)).await?;

    let suggested = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_disposition);
    let path = args
        .output
        .or_else(|| suggested.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(format!("{}.bin", args.id)));

    let bytes = response.bytes().await?;
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    output(
        &DownloadResult {
            path: path.display().to_string(),
            bytes: bytes.len(),
        },
        human,
    )
}

/// Execute the upload-evaluation command.
pub async fn upload_evaluation(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: UploadEvaluationArgs,
) -> Result<()> {
    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "evaluation.pdf".to_string());

    let part = Part::bytes(bytes)
        .file_name(filename)
        .mime_str(content_type_for(&args.file))?;
    let form = Form::new().part("file", part);

    let url = format!("{}/api/admin/clio-quotes/{}/evaluation", base_url, args.id);
    let response: UploadEvaluationResponse =
        make_request(client.post(&url).multipart(form)).await?;

    output(&response, human)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_prefers_encoded_form() {
        let header =
            "attachment; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf";
        assert_eq!(filename_from_disposition(header).as_deref(), Some("résumé.pdf"));
    }

    #[test]
    fn test_filename_plain() {
        assert_eq!(
            filename_from_disposition("attachment; filename=\"intake form.pdf\"").as_deref(),
            Some("intake form.pdf")
        );
        assert_eq!(filename_from_disposition("attachment"), None);
    }

    #[test]
    fn test_filename_strips_directories() {
        assert_eq!(
            filename_from_disposition("attachment; filename=\"../../etc/passwd\"").as_deref(),
            Some("passwd")
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("eval.PDF")), "application/pdf");
        assert_eq!(content_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }
}
