//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Output format for command results.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON (same as --json)
    Json,
}

/// nsync - incremental Notion database to Markdown sync
#[derive(Parser, Debug)]
#[command(name = "nsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./notion.json)
    #[arg(short, long, global = true, env = "NOTIONSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Offset file (overrides the config file)
    #[arg(long, global = true)]
    pub offsets: Option<PathBuf>,

    /// Output directory for documents (overrides the config file)
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Notion integration token
    #[arg(long, global = true, env = "NOTION_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Notion API base URL
    #[arg(long, global = true, env = "NOTION_API_BASE", hide = true)]
    pub api_base: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (text, json)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull new and changed pages into documents
    Sync {
        /// Report what would change without exporting or writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show local sync state (offsets and documents)
    Status,

    /// Show version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nsync", "sync", "--dry-run", "--config", "blog/notion.json", "-vv", "--json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Sync { dry_run: true }));
        assert_eq!(cli.config, Some(PathBuf::from("blog/notion.json")));
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
    }
}
