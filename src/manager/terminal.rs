// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Terminal (CLI-style) command conversion and reply formatting
//!
//! Turns `/ip address print where disabled=no` into the API path
//! `/ip/address/print` plus the parameter tail ` where disabled=no`, and the
//! tail into API words (`?disabled=no`).

use crate::error::{AppError, Result};
use crate::mikrotik::Row;

const PARAM_KEYWORDS: [&str; 3] = ["where", "from", "to"];

/// Output for a command that produced no rows
pub const EMPTY_OUTPUT: &str = "Command executed successfully (no output)";

/// A terminal command split into its API path and verbatim parameter tail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCommand {
    pub path: String,
    /// Everything from the first parameter on, leading whitespace included
    pub params: String,
}

impl TerminalCommand {
    /// Splits a CLI-style command into path and parameters
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Parse`] when the command does not start with `/`
    /// or names no path segment.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if !input.starts_with('/') {
            return Err(AppError::Parse(format!(
                "Command must start with '/': '{input}'"
            )));
        }

        let mut segments: Vec<&str> = Vec::new();
        let mut path_end = 0;
        for (start, token) in tokens_with_offsets(input) {
            if is_param_start(token) {
                break;
            }
            segments.extend(token.split('/').filter(|s| !s.is_empty()));
            path_end = start + token.len();
        }

        if segments.is_empty() {
            return Err(AppError::Parse(format!(
                "Command has no path: '{input}'"
            )));
        }

        Ok(Self {
            path: format!("/{}", segments.join("/")),
            params: input[path_end..].to_string(),
        })
    }

    /// Translates the parameter tail into RouterOS API words
    ///
    /// `key=value` becomes an attribute word `=key=value`, `from X`/`to X`
    /// become `=from=X`/`=to=X`, and after `where` every condition becomes a
    /// query word (`?key=value`, `?key`, `?>key=value`, `?<key=value`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Parse`] on unterminated quotes, a keyword without
    /// its value, a bare word outside a `where` clause, or a condition using
    /// `>=`, `<=`, `!=` or `~`.
    pub fn api_words(&self) -> Result<Vec<String>> {
        let tokens = split_quoted(&self.params)?;
        let mut words = Vec::with_capacity(tokens.len());
        let mut in_query = false;
        let mut iter = tokens.into_iter();

        while let Some(token) = iter.next() {
            match token.as_str() {
                "where" => in_query = true,
                "and" if in_query => {}
                kw @ ("from" | "to") => {
                    let value = iter.next().ok_or_else(|| {
                        AppError::Parse(format!("'{kw}' requires a value"))
                    })?;
                    words.push(format!("={kw}={value}"));
                }
                _ if in_query => words.push(query_word(&token)?),
                _ => match token.split_once('=') {
                    Some((key, value)) if !key.is_empty() => {
                        words.push(format!("={key}={value}"));
                    }
                    _ => {
                        return Err(AppError::Parse(format!(
                            "Unexpected argument '{token}'"
                        )));
                    }
                },
            }
        }
        Ok(words)
    }
}

fn is_param_start(token: &str) -> bool {
    PARAM_KEYWORDS.contains(&token) || token.contains('=')
}

/// Comparisons the API query syntax has no word for
const UNSUPPORTED_OPERATORS: [&str; 4] = [">=", "<=", "!=", "~"];

fn query_word(token: &str) -> Result<String> {
    let Some(pos) = token.find(['=', '>', '<', '!', '~']) else {
        return Ok(format!("?{token}"));
    };
    let (key, rest) = token.split_at(pos);
    if key.is_empty() {
        return Err(AppError::Parse(format!("Missing property name in '{token}'")));
    }
    if let Some(op) = UNSUPPORTED_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
        return Err(AppError::Parse(format!(
            "Unsupported query operator '{op}' in '{token}'"
        )));
    }

    let prefix = match rest.chars().next() {
        Some('=') => "?",
        Some('>') => "?>",
        Some('<') => "?<",
        _ => {
            return Err(AppError::Parse(format!(
                "Unsupported query operator in '{token}'"
            )));
        }
    };
    Ok(format!("{prefix}{key}={}", &rest[1..]))
}

/// Whitespace-separated tokens with their byte offsets
fn tokens_with_offsets(input: &str) -> impl Iterator<Item = (usize, &str)> {
    input
        .split_whitespace()
        .map(move |token| (token.as_ptr() as usize - input.as_ptr() as usize, token))
}

/// Splits on whitespace, keeping double-quoted runs together and dropping the quotes
fn split_quoted(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(AppError::Parse("Unterminated quote".to_string()));
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Renders rows as `key: value` lines, one blank-line separated paragraph
/// per row, leaving out dot-prefixed internal fields
#[must_use]
pub fn format_rows(rows: &[Row]) -> String {
    let paragraphs: Vec<String> = rows
        .iter()
        .map(|row| {
            row.iter()
                .filter(|(key, _)| !key.starts_with('.'))
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        EMPTY_OUTPUT.to_string()
    } else {
        paragraphs.join("\n\n")
    }
}
