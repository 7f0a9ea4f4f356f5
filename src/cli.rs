//! CLI definitions for keyhints.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use keyhints_protocols::LinkHintMode;

/// keyhints CLI.
#[derive(Parser)]
#[command(name = "keyhints")]
#[command(about = "Keyboard-driven link hints and omnibar completion")]
#[command(version)]
pub(crate) struct Cli {
    /// Settings file (default: ~/.keyhints/config.toml when it exists)
    #[arg(short, long, global = true, env = "KEYHINTS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Rank omnibar suggestions for a query
    Complete {
        /// History export: JSON array of {url, title, last_visit_time}
        #[arg(long)]
        history: Option<PathBuf>,

        /// Bookmark tree: JSON array of {title, url?, children?}
        #[arg(long)]
        bookmarks: Option<PathBuf>,

        /// Open tabs: JSON array of {id, url, title}, least recent first
        #[arg(long)]
        tabs: Option<PathBuf>,

        /// Completer set: omni, bookmarks or tabs
        #[arg(long, default_value = "omni")]
        name: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Query words
        query: Vec<String>,
    },

    /// Show link hints for a document and optionally select one
    Hints {
        /// Document description (JSON)
        #[arg(long)]
        document: PathBuf,

        /// Keys to type once hints are shown, e.g. "sa" or "rust<Enter>"
        #[arg(long)]
        keys: Option<String>,

        /// Use filtered (text-matching) hints
        #[arg(long)]
        filter: bool,

        /// Hint mode
        #[arg(long, default_value = "open-in-current-tab", value_parser = parse_mode)]
        mode: LinkHintMode,

        /// Print markers and activations as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in completion engines
    Engines {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate the settings file
    CheckConfig,
}

fn parse_mode(value: &str) -> Result<LinkHintMode, String> {
    LinkHintMode::ALL
        .into_iter()
        .find(|mode| mode.to_string() == value)
        .ok_or_else(|| {
            let names: Vec<String> = LinkHintMode::ALL.iter().map(ToString::to_string).collect();
            format!("unknown mode '{}', expected one of: {}", value, names.join(", "))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("copy-link-url"), Ok(LinkHintMode::CopyLinkUrl));
        assert!(parse_mode("open").unwrap_err().contains("open-in-current-tab"));
    }

    #[test]
    fn test_parse_hints_command() {
        let cli = Cli::parse_from([
            "keyhints", "hints", "--document", "page.json", "--keys", "sa", "--mode", "hover-link",
        ]);
        match cli.command {
            Commands::Hints { keys, mode, filter, .. } => {
                assert_eq!(keys.as_deref(), Some("sa"));
                assert_eq!(mode, LinkHintMode::HoverLink);
                assert!(!filter);
            }
            _ => panic!("expected hints command"),
        }
    }

    #[test]
    fn test_parse_complete_command() {
        let cli = Cli::parse_from(["keyhints", "--config", "k.toml", "complete", "rust", "book"]);
        assert_eq!(cli.config, Some(PathBuf::from("k.toml")));
        match cli.command {
            Commands::Complete { query, name, .. } => {
                assert_eq!(query, ["rust", "book"]);
                assert_eq!(name, "omni");
            }
            _ => panic!("expected complete command"),
        }
    }
}
