//! Reading and editing `server.properties`.
//!
//! The file is line oriented: `key=value` pairs, `#` comments, blank lines.
//! Edits keep every comment and the original ordering; keys that are not yet
//! present are appended at the end.

use crate::core::StewardError;
use crate::utils::fs::safe_write;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry { key: String, value: String },
    /// Comments, blank lines and anything else that is not a pair.
    Other(String),
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Other(raw.to_string());
    }
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Line::Entry {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        },
        _ => Line::Other(raw.to_string()),
    }
}

/// An editable view of a properties file.
#[derive(Debug, Clone)]
pub struct ServerProperties {
    path: PathBuf,
    lines: Vec<Line>,
}

impl ServerProperties {
    /// Load `path`; a missing file yields an empty document.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", path.display());
                String::new()
            }
            Err(e) => return Err(StewardError::filesystem("read", path, e).into()),
        };

        Ok(Self::parse(path, &content))
    }

    fn parse(path: &Path, content: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: content.lines().map(parse_line).collect(),
        }
    }

    /// Value of the last occurrence of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// All pairs; later duplicates win.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                Line::Entry { key, value } => Some((key.clone(), value.clone())),
                Line::Other(_) => None,
            })
            .collect()
    }

    /// Set `key` in place, or append it when absent.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() || key.contains('=') || key.starts_with('#') {
            return Err(StewardError::Parse(format!("invalid property key '{key}'")).into());
        }
        if value.contains('\n') || value.contains('\r') {
            return Err(StewardError::Parse(format!("value for '{key}' spans lines")).into());
        }

        let mut found = false;
        for line in &mut self.lines {
            if let Line::Entry { key: k, value: v } = line
                && k.as_str() == key
            {
                *v = value.to_string();
                found = true;
            }
        }
        if !found {
            self.lines.push(Line::Entry {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
                Line::Other(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }

    /// Write the document back atomically.
    pub async fn save(&self) -> Result<()> {
        let content = self.render();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || safe_write(&path, &content))
            .await
            .context("Properties write task panicked")??;
        Ok(())
    }
}

/// Key/value pairs of the properties file at `path`.
pub async fn read_properties(path: &Path) -> Result<BTreeMap<String, String>> {
    Ok(ServerProperties::load(path).await?.to_map())
}

/// Apply `updates` to the file at `path`, keeping unrelated lines untouched.
pub async fn write_properties<'a, I>(path: &Path, updates: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut properties = ServerProperties::load(path).await?;
    for (key, value) in updates {
        properties.set(key, value)?;
    }
    properties.save().await
}
