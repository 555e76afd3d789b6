// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS authentication

use md5::compute as md5_compute;
use tokio::io::{AsyncRead, AsyncWrite};

use super::RouterOsConnection;
use crate::error::{AppError, Result};

impl<S> RouterOsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Logs in, preferring the plain method (RouterOS 6.43+) and falling
    /// back to the MD5 challenge when the router answers with one.
    pub(crate) async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        tracing::trace!("Attempting login for user: {}", username);
        let sentences = self
            .raw_command(vec![
                "/login".to_string(),
                format!("=name={username}"),
                format!("=password={password}"),
            ])
            .await
            .map_err(login_failure)?;

        // Pre-6.43 routers ignore the password and reply with a challenge
        let challenge = sentences.iter().find_map(|s| s.get("ret").cloned());
        let Some(challenge_hex) = challenge else {
            tracing::debug!("Login successful (plain method)");
            return Ok(());
        };

        tracing::trace!("Challenge received, length: {}", challenge_hex.len());
        let response = challenge_response(password, &challenge_hex)?;
        self.raw_command(vec![
            "/login".to_string(),
            format!("=name={username}"),
            format!("=response={response}"),
        ])
        .await
        .map_err(login_failure)?;
        tracing::debug!("Login successful (legacy challenge method)");
        Ok(())
    }
}

/// A rejected login is a connection failure, not a command failure
fn login_failure(err: AppError) -> AppError {
    match err {
        AppError::Command(msg) => AppError::Connection(format!("Login failed: {msg}")),
        other => other,
    }
}

/// Builds `00` + hex(MD5(0x00 + password + challenge))
fn challenge_response(password: &str, challenge_hex: &str) -> Result<String> {
    let challenge = hex::decode(challenge_hex)
        .map_err(|e| AppError::Connection(format!("Invalid login challenge: {e}")))?;
    let mut data = Vec::with_capacity(1 + password.len() + challenge.len());
    data.push(0u8);
    data.extend_from_slice(password.as_bytes());
    data.extend_from_slice(&challenge);
    let digest = md5_compute(&data);
    let mut response = String::from("00");
    response.push_str(&hex::encode(digest.0));
    Ok(response)
}
