//! Plain-text emails for quote requests.

use openeval_integrations::EmailMessage;
use openeval_store::QuoteRow;

use crate::state::AppState;

fn language_pair(quote: &QuoteRow) -> Option<String> {
    match (&quote.source_language, &quote.target_language) {
        (Some(from), Some(to)) => Some(format!("{} to {}", from, to)),
        (Some(from), None) => Some(from.clone()),
        (None, Some(to)) => Some(to.clone()),
        (None, None) => None,
    }
}

/// Confirmation sent to the client who requested a quote.
pub fn quote_confirmation(quote: &QuoteRow) -> EmailMessage {
    let mut text = format!(
        "Hello {},\n\nWe received your {} request (reference {}).\n",
        quote.client_name, quote.service_type, quote.id
    );
    if let Some(languages) = language_pair(quote) {
        text.push_str(&format!("Languages: {}\n", languages));
    }
    if let Some(amount) = quote.amount_cents {
        text.push_str(&format!("Quoted amount: {}.{:02}\n", amount / 100, amount % 100));
    }
    text.push_str("\nWe will be in touch shortly.\n\nOpenEval\n");

    EmailMessage {
        to: vec![quote.client_email.clone()],
        subject: format!("Your OpenEval quote request {}", quote.id),
        text,
    }
}

/// Heads-up to the back office about a new quote request.
pub fn admin_notification(quote: &QuoteRow, to: &str) -> EmailMessage {
    let mut text = format!(
        "New {} quote request via {}.\n\nClient: {} <{}>\nQuote: {}\n",
        quote.service_type, quote.source, quote.client_name, quote.client_email, quote.id
    );
    if let Some(languages) = language_pair(quote) {
        text.push_str(&format!("Languages: {}\n", languages));
    }
    if let Some(notes) = quote.notes.as_deref().filter(|n| !n.is_empty()) {
        text.push_str(&format!("\nNotes:\n{}\n", notes));
    }

    EmailMessage {
        to: vec![to.to_string()],
        subject: format!("New quote request from {}", quote.client_name),
        text,
    }
}

/// Notify the back office about a new quote. Failures are logged only.
pub async fn notify_admin(state: &AppState, quote: &QuoteRow) {
    let Some(to) = state.config().admin_notification_email.as_deref() else {
        return;
    };
    let Some(resend) = state.resend() else {
        tracing::debug!(quote_id = %quote.id, "Email not configured, skipping admin notification");
        return;
    };

    if let Err(e) = resend.send(&admin_notification(quote, to)).await {
        tracing::warn!(quote_id = %quote.id, error = %e, "Failed to send admin notification");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) fn quote() -> QuoteRow {
        QuoteRow {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            source: "api".to_string(),
            client_name: "Ana Smith".to_string(),
            client_email: "ana@example.com".to_string(),
            service_type: "translation".to_string(),
            source_language: Some("Spanish".to_string()),
            target_language: Some("English".to_string()),
            notes: Some("Birth certificate".to_string()),
            status: "pending".to_string(),
            amount_cents: None,
            invoice_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_confirmation_goes_to_client() {
        let mut quote = quote();
        quote.amount_cents = Some(12_505);

        let message = quote_confirmation(&quote);
        assert_eq!(message.to, vec!["ana@example.com".to_string()]);
        assert!(message.text.contains("Hello Ana Smith"));
        assert!(message.text.contains("Spanish to English"));
        assert!(message.text.contains("125.05"));
        assert!(message.subject.contains(&quote.id.to_string()));
    }

    #[test]
    fn test_admin_notification() {
        let quote = quote();
        let message = admin_notification(&quote, "ops@openeval.app");
        assert_eq!(message.to, vec!["ops@openeval.app".to_string()]);
        assert!(message.text.contains("via api"));
        assert!(message.text.contains("Birth certificate"));
    }
}
