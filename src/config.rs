use std::collections::HashMap;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Directory the animated-capture bytes are written to.
    pub media_dir: String,
    /// From address used by the notification relay.
    pub mail_sender: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_starttls: bool,
    /// External login page anonymous visitors are redirected to.
    pub login_url: String,
    /// Maps session token → display name for admin identities.
    /// Format: `"token1:Name One,token2:Name Two"`.
    pub admin_tokens: HashMap<String, String>,
    /// Same format, for authenticated non-admin identities.
    pub viewer_tokens: HashMap<String, String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            media_dir: optional("MEDIA_DIR", "media"),
            mail_sender: required("MAIL_SENDER")?,
            smtp_host: required("SMTP_HOST")?,
            smtp_port: optional("SMTP_PORT", "587")
                .parse()
                .context("SMTP_PORT must be a valid port number")?,
            smtp_username: optional("SMTP_USERNAME", ""),
            smtp_password: optional("SMTP_PASSWORD", ""),
            smtp_starttls: optional("SMTP_STARTTLS", "true")
                .parse()
                .context("SMTP_STARTTLS must be 'true' or 'false'")?,
            login_url: optional("LOGIN_URL", "/login"),
            admin_tokens: parse_tokens(&optional("ADMIN_TOKENS", ""))
                .context("invalid ADMIN_TOKENS")?,
            viewer_tokens: parse_tokens(&optional("VIEWER_TOKENS", ""))
                .context("invalid VIEWER_TOKENS")?,
        })
    }
}

/// Parse `"token1:Name One,token2:Name Two"` into a token → name map.
///
/// Returns an error immediately if any entry lacks the colon separator or
/// has an empty token.
fn parse_tokens(raw: &str) -> Result<HashMap<String, String>> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (token, name) = entry
                .split_once(':')
                .with_context(|| format!("token entry must be 'token:name', got: {entry:?}"))?;
            let token = token.trim();
            if token.is_empty() {
                anyhow::bail!("empty token in entry {entry:?}");
            }
            Ok((token.to_owned(), name.trim().to_owned()))
        })
        .collect()
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tokens_empty() {
        let m = parse_tokens("").unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn parse_tokens_two_entries() {
        let m = parse_tokens("abc:Alice,def:Bob B").unwrap();
        assert_eq!(m["abc"], "Alice");
        assert_eq!(m["def"], "Bob B");
    }

    #[test]
    fn parse_tokens_trims_whitespace() {
        let m = parse_tokens(" abc : Alice ").unwrap();
        assert_eq!(m["abc"], "Alice");
    }

    #[test]
    fn parse_tokens_missing_colon_errors() {
        let err = parse_tokens("abc").unwrap_err();
        assert!(err.to_string().contains("token:name"));
    }

    #[test]
    fn parse_tokens_empty_token_errors() {
        let err = parse_tokens(":Alice").unwrap_err();
        assert!(err.to_string().contains("empty token"));
    }
}
