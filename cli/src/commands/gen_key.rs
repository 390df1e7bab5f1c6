//! GEN-KEY command - Print a fresh `TOKEN_ENCRYPTION_KEY`.

use anyhow::Result;
use colored::Colorize;
use openeval_core::TokenVault;
use serde::Serialize;

use super::{HumanReadable, output};

#[derive(Debug, Serialize)]
pub struct GeneratedKey {
    pub token_encryption_key: String,
}

impl HumanReadable for GeneratedKey {
    fn print_human(&self) {
        println!("{}", "New token encryption key".green().bold());
        println!();
        println!("  TOKEN_ENCRYPTION_KEY={}", self.token_encryption_key);
        println!();
        println!(
            "  {}",
            "Rotating this key makes every stored provider token unreadable.".dimmed()
        );
    }
}

/// Execute the gen-key command. Runs locally; no server is contacted.
pub fn execute(human: bool) -> Result<()> {
    output(
        &GeneratedKey {
            token_encryption_key: TokenVault::generate_key_hex(),
        },
        human,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_loads_into_vault() {
        let key = TokenVault::generate_key_hex();
        assert_eq!(key.len(), 64);
        assert!(TokenVault::from_hex(&key).is_ok());
    }
}
