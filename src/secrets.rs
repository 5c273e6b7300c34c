// src/secrets.rs
// API token resolution for snitch
// Sources, in order: environment, token file, interactive prompt

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use std::fmt;
use std::path::Path;

/// Environment variable checked before any token file.
pub const TOKEN_ENV_VAR: &str = "SLACK_API_TOKEN";

// ============================================
// Public API
// ============================================

/// Opaque Slack API token
///
/// Never printed: `Debug` is redacted so the token cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(raw: &str) -> Result<Self> {
        let token = raw.trim();
        if token.is_empty() {
            bail!("API token is empty");
        }
        Ok(Self(token.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// Resolve the API token for this run
///
/// Checks `SLACK_API_TOKEN`, then `token_file`, then prompts when stdin is a
/// terminal. Fails if none of them yields a non-empty token.
pub fn resolve_token(token_file: Option<&Path>) -> Result<ApiToken> {
    let from_env = std::env::var(TOKEN_ENV_VAR).ok();
    let interactive = std::io::stdin().is_terminal();
    resolve_token_from(from_env, token_file, interactive)
}

// ============================================
// Internal Implementation
// ============================================

fn resolve_token_from(
    from_env: Option<String>,
    token_file: Option<&Path>,
    interactive: bool,
) -> Result<ApiToken> {
    if let Some(raw) = from_env.filter(|v| !v.trim().is_empty()) {
        tracing::debug!("Using API token from {}", TOKEN_ENV_VAR);
        return ApiToken::new(&raw);
    }

    if let Some(path) = token_file {
        return read_token_file(path);
    }

    if interactive {
        let raw = rpassword::prompt_password("Slack API token: ")
            .context("Failed to read API token")?;
        return ApiToken::new(&raw);
    }

    bail!(
        "No API token found. Set {} or pass --token-file",
        TOKEN_ENV_VAR
    )
}

fn read_token_file(path: &Path) -> Result<ApiToken> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token from {}", path.display()))?;
    ApiToken::new(&content).with_context(|| format!("Invalid token file {}", path.display()))
}
