// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Low-level RouterOS API connection handling

mod auth;
mod parse;
mod protocol;

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{AppError, Result};
use crate::mikrotik::types::Row;

pub(crate) use parse::{
    parse_firewall_rules, parse_identity, parse_interfaces, parse_routes, parse_system,
};
pub use protocol::{encode_length, encode_sentence};
use protocol::read_length;

/// Longest word accepted from the router before the session is dropped
pub(crate) const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Low-level RouterOS API connection
///
/// Generic over the byte stream so the codec can run against an in-memory
/// pipe in tests; production code always uses [`TcpStream`].
pub(crate) struct RouterOsConnection<S = TcpStream> {
    stream: S,
    read_timeout: Duration,
}

impl RouterOsConnection<TcpStream> {
    pub(crate) async fn connect(addr: &str, connect_timeout: Duration) -> Result<Self> {
        tracing::trace!("Attempting TCP connection to: {}", addr);
        let stream = timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                AppError::Connection(format!(
                    "Timed out connecting to {addr} after {}ms",
                    connect_timeout.as_millis()
                ))
            })?
            .map_err(|e| AppError::Connection(format!("Failed to connect to {addr}: {e}")))?;
        stream.set_nodelay(true).ok();
        tracing::trace!("TCP connection established to: {}", addr);
        Ok(Self::from_stream(stream, connect_timeout))
    }
}

impl<S> RouterOsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn from_stream(stream: S, read_timeout: Duration) -> Self {
        Self {
            stream,
            read_timeout,
        }
    }

    pub(crate) async fn command(&mut self, path: &str, args: &[String]) -> Result<Vec<Row>> {
        let mut words: Vec<String> = Vec::with_capacity(1 + args.len());
        words.push(path.to_string());
        words.extend(args.iter().cloned());
        self.raw_command(words).await
    }

    pub(crate) async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn raw_command(&mut self, words: Vec<String>) -> Result<Vec<Row>> {
        self.send_words(&words).await?;
        self.read_sentences().await
    }

    async fn send_words(&mut self, words: &[String]) -> Result<()> {
        self.stream
            .write_all(&encode_sentence(words))
            .await
            .map_err(|e| AppError::Connection(format!("Write failed: {e}")))?;
        self.stream
            .flush()
            .await
            .map_err(|e| AppError::Connection(format!("Flush failed: {e}")))?;
        Ok(())
    }

    async fn read_sentences(&mut self) -> Result<Vec<Row>> {
        let limit = self.read_timeout;
        // Wrap the entire read operation in a timeout to prevent hanging on slow/dead connections
        timeout(limit, async {
            let mut sentences: Vec<Row> = Vec::new();
            let mut current: Option<Row> = None;
            loop {
                let word = self.read_word().await?;
                if word.is_empty() {
                    continue;
                }
                tracing::trace!("Received word: {}", word);
                match word.as_str() {
                    "!done" => {
                        // !done may carry attributes such as =ret=
                        let done = self.read_attributes().await?;
                        if let Some(s) = current.take() {
                            sentences.push(s);
                        }
                        if !done.is_empty() {
                            sentences.push(done);
                        }
                        tracing::trace!(
                            "Command complete, {} sentences received",
                            sentences.len()
                        );
                        return Ok(sentences);
                    }
                    "!trap" => {
                        tracing::trace!("Trap received, reading trap details");
                        let trap = self.read_attributes().await?;
                        // a trap is always followed by its own !done
                        self.drain_until_done().await?;
                        let msg = trap
                            .get("message")
                            .cloned()
                            .unwrap_or_else(|| "trap".to_string());
                        return Err(AppError::Command(msg));
                    }
                    "!fatal" => {
                        let reason = self.read_fatal_reason().await?;
                        return Err(AppError::Connection(format!(
                            "RouterOS closed the session: {reason}"
                        )));
                    }
                    "!re" => {
                        if let Some(s) = current.take() {
                            sentences.push(s);
                        }
                        current = Some(self.read_attributes().await?);
                    }
                    // ignore other headers (!empty, .tag without reply)
                    _ => {}
                }
            }
        })
        .await
        .map_err(|_| {
            AppError::Connection(format!(
                "Read timeout: RouterOS did not respond within {}ms",
                limit.as_millis()
            ))
        })?
    }

    /// Reads `=key=value` words up to the end of the current sentence
    async fn read_attributes(&mut self) -> Result<Row> {
        let mut row = Row::new();
        loop {
            let word = self.read_word().await?;
            if word.is_empty() {
                return Ok(row);
            }
            if let Some(stripped) = word.strip_prefix('=') {
                if let Some((k, v)) = stripped.split_once('=') {
                    row.insert(k.to_string(), v.to_string());
                }
            }
        }
    }

    async fn drain_until_done(&mut self) -> Result<()> {
        loop {
            let word = self.read_word().await?;
            if word == "!done" {
                self.read_attributes().await?;
                return Ok(());
            }
        }
    }

    async fn read_fatal_reason(&mut self) -> Result<String> {
        let mut parts = Vec::new();
        loop {
            let word = self.read_word().await?;
            if word.is_empty() {
                return Ok(parts.join(" "));
            }
            parts.push(word);
        }
    }

    async fn read_word(&mut self) -> Result<String> {
        let len = read_length(&mut self.stream)
            .await
            .map_err(|e| AppError::Connection(format!("Read failed: {e}")))?;
        if len == 0 {
            return Ok(String::new());
        }
        if len > MAX_WORD_LEN {
            return Err(AppError::Connection(format!(
                "Word of {len} bytes exceeds the {MAX_WORD_LEN} byte limit"
            )));
        }
        let mut buf = vec![0u8; len];
        self.stream
            .read_exact(&mut buf)
            .await
            .map_err(|e| AppError::Connection(format!("Read failed: {e}")))?;
        Ok(String::from_utf8_lossy(&buf).into())
    }
}
