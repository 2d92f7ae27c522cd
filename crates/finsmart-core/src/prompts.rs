//! Prompt library for the AI collaborator
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/finsmart/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Prompt files are markdown with YAML frontmatter and two sections,
//! `# System` and `# User`. Templates support `{{var}}` substitution and
//! `{{#if var}}...{{/if}}` blocks that are kept only when `var` is set
//! and non-empty.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

mod defaults {
    pub const PARSE_TRANSACTIONS: &str = include_str!("../../../prompts/parse_transactions.md");
    pub const FINANCIAL_INSIGHTS: &str = include_str!("../../../prompts/financial_insights.md");
    pub const RECOMMENDATIONS: &str = include_str!("../../../prompts/recommendations.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Receipt text to a JSON array of purchased items
    ParseTransactions,
    /// Spending summary to a JSON array of insights
    FinancialInsights,
    /// Category breakdown to a JSON array of recommendations
    Recommendations,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseTransactions => "parse_transactions",
            Self::FinancialInsights => "financial_insights",
            Self::Recommendations => "recommendations",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[
            Self::ParseTransactions,
            Self::FinancialInsights,
            Self::Recommendations,
        ]
    }

    fn embedded(&self) -> &'static str {
        match self {
            Self::ParseTransactions => defaults::PARSE_TRANSACTIONS,
            Self::FinancialInsights => defaults::FINANCIAL_INSIGHTS,
            Self::Recommendations => defaults::RECOMMENDATIONS,
        }
    }

    fn file_name(&self) -> String {
        format!("{}.md", self.as_str())
    }
}

impl std::str::FromStr for PromptId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PromptId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("Unknown prompt: {}", s))
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    /// Free-form description of the expected output
    #[serde(default)]
    pub output: String,
}

/// A loaded prompt
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub body: String,
    /// Path of the override file, when one was used
    pub source: Option<PathBuf>,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        section(&self.body, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        section(&self.body, "# User")
    }

    /// Rendered system section, if the prompt has one
    pub fn render_system(&self, vars: &HashMap<&str, String>) -> Option<String> {
        self.system_section().map(|s| render_template(s, vars))
    }

    /// Rendered user section (or the whole body when there are no sections)
    pub fn render_user(&self, vars: &HashMap<&str, String>) -> String {
        render_template(self.user_section().unwrap_or(&self.body), vars)
    }

    pub fn is_override(&self) -> bool {
        self.source.is_some()
    }
}

/// Listing entry for the `prompts` command
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: &'static str,
    pub version: Option<u32>,
    pub override_path: Option<PathBuf>,
}

/// Loads prompts from the override directory or the embedded defaults
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
        }
    }

    pub fn with_override_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(path.into()),
        }
    }

    pub fn embedded_only() -> Self {
        Self { override_dir: None }
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Override file for `id`, if one exists
    pub fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|dir| dir.join(id.file_name()))
            .filter(|p| p.exists())
    }

    /// Load a prompt; override files are re-read on every call
    pub fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(path) = self.override_path(id) {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::InvalidData(format!("Failed to read prompt override {}: {}", path.display(), e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            return Ok(Prompt {
                metadata,
                body,
                source: Some(path),
            });
        }

        let (metadata, body) = parse_prompt(id.embedded())?;
        Ok(Prompt {
            metadata,
            body,
            source: None,
        })
    }

    pub fn list(&self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| PromptInfo {
                id: id.as_str(),
                version: self.load(id).ok().map(|p| p.metadata.version),
                override_path: self.override_path(id),
            })
            .collect()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finsmart").join("prompts").join("overrides"))
}

fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim_start();
    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;
    let end = rest.find("\n---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let metadata: PromptMetadata = serde_yaml::from_str(&rest[..end])
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;
    let body = rest[end + 4..].trim().to_string();
    Ok((metadata, body))
}

fn section<'a>(body: &'a str, header: &str) -> Option<&'a str> {
    let start = body.find(header)?;
    let after = &body[start + header.len()..];
    let end = after.find("\n# ").unwrap_or(after.len());
    Some(after[..end].trim())
}

/// Resolve `{{#if}}` blocks, then substitute `{{var}}` in a single pass so
/// substituted values are never re-scanned
pub fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let resolved = resolve_conditionals(template, vars);

    let mut out = String::with_capacity(resolved.len());
    let mut rest = resolved.as_str();
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let name = after[..close].trim();
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_conditionals(template: &str, vars: &HashMap<&str, String>) -> String {
    const OPEN: &str = "{{#if ";
    const CLOSE: &str = "{{/if}}";

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let (Some(name_end), Some(close)) = (after_open.find("}}"), after_open.find(CLOSE)) else {
            out.push_str(&rest[start..]);
            return out;
        };
        if name_end > close {
            out.push_str(&rest[start..]);
            return out;
        }
        let name = after_open[..name_end].trim();
        let inner = &after_open[name_end + 2..close];
        if vars.get(name).is_some_and(|v| !v.trim().is_empty()) {
            out.push_str(inner);
        }
        rest = &after_open[close + CLOSE.len()..];
    }
    out.push_str(rest);
    out
}
