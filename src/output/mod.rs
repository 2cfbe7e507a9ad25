//! Output module for rendering operation results
//!
//! This module handles:
//! - JSON rendering (camelCase, pretty-printed)
//! - Markdown reports for human reading
//! - Writing to stdout or a file

mod markdown;

pub use markdown::MarkdownReport;

use crate::Result;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Format of rendered output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Markdown => f.write_str("markdown"),
        }
    }
}

/// Renders a result in the requested format
pub fn render<T>(value: &T, format: OutputFormat) -> Result<String>
where
    T: Serialize + MarkdownReport,
{
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Markdown => Ok(value.to_markdown()),
    }
}

/// Writes rendered output to `path`, or to stdout when no path is given
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                file.write_all(b"\n")?;
            }
            tracing::info!("Output written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                handle.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{DiscoveryResult, DiscoverySource};
    use tempfile::tempdir;

    fn sample() -> DiscoveryResult {
        DiscoveryResult {
            root: "https://example.com/".to_string(),
            count: 0,
            urls: vec![],
            source: DiscoverySource::Sitemap,
        }
    }

    #[test]
    fn test_render_json() {
        let json = render(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "sitemap");
        assert_eq!(value["urls"], serde_json::json!([]));
    }

    #[test]
    fn test_render_markdown() {
        let md = render(&sample(), OutputFormat::Markdown).unwrap();
        assert!(md.contains("*None*"));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_output("{}", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
