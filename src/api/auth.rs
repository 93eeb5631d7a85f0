// ABOUTME: Credential source backed by the environment or a shell command.
// ABOUTME: The command form lets a profile delegate to an external helper.

use super::{ApiError, Token, TokenSource};
use crate::config::LaunchConfig;
use async_trait::async_trait;

/// Fetches credentials from `CONDUCTO_TOKEN_COMMAND` (a shell command whose
/// stdout is the token) or, failing that, the `CONDUCTO_TOKEN` variable.
pub struct ShellTokenSource {
    command: Option<String>,
    env_token: Option<String>,
}

impl ShellTokenSource {
    pub fn from_config(config: &LaunchConfig) -> Self {
        Self {
            command: config.env_var("CONDUCTO_TOKEN_COMMAND").map(str::to_string),
            env_token: config.env_var("CONDUCTO_TOKEN").map(str::to_string),
        }
    }
}

#[async_trait]
impl TokenSource for ShellTokenSource {
    async fn refresh(&self) -> Result<Token, ApiError> {
        if let Some(command) = &self.command {
            let output = tokio::process::Command::new("sh")
                .arg("-c")
                .arg(command)
                .output()
                .await
                .map_err(|e| ApiError::Transport(format!("token command failed to run: {e}")))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ApiError::Unauthorized(format!(
                    "token command exited with {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }

            let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if token.is_empty() {
                return Err(ApiError::Unauthorized(
                    "token command produced no output".to_string(),
                ));
            }
            return Ok(Token::new(token));
        }

        match &self.env_token {
            Some(token) if !token.is_empty() => Ok(Token::new(token.clone())),
            _ => Err(ApiError::Unauthorized(
                "no credential configured; set CONDUCTO_TOKEN or CONDUCTO_TOKEN_COMMAND"
                    .to_string(),
            )),
        }
    }
}
