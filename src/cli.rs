//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::services::MAX_WINDOW_DAYS;

/// sharelink - token-bearing share links with expiry and access analytics
#[derive(Parser)]
#[command(name = "sharelink")]
#[command(version)]
#[command(about = "Share link lifecycle, validation and analytics service", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the access-log worker and the cleanup scheduler until Ctrl-C (default)
    Serve,

    /// Run a single cleanup sweep and exit
    Cleanup,

    /// Print the access analytics report of a share link as JSON
    Analytics {
        /// Share link id
        share_link_id: String,

        /// Window size in days
        #[arg(
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS))
        )]
        days: u32,
    },

    /// Generate an example configuration file
    ConfigGen {
        /// Output path (default: stdout)
        output_path: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["sharelink"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_analytics_args() {
        let cli = Cli::parse_from(["sharelink", "analytics", "link-1", "--days", "30"]);
        assert_eq!(
            cli.command,
            Some(Commands::Analytics {
                share_link_id: "link-1".to_string(),
                days: 30
            })
        );
    }

    #[test]
    fn test_analytics_days_out_of_range_rejected() {
        for days in ["0", "367", "4294967295"] {
            let result = Cli::try_parse_from(["sharelink", "analytics", "link-1", "--days", days]);
            assert!(result.is_err(), "--days {} should be rejected", days);
        }
    }

    #[test]
    fn test_config_gen_with_global_config_flag() {
        let cli = Cli::parse_from(["sharelink", "config-gen", "out.toml", "-c", "other.toml"]);
        assert_eq!(cli.config, "other.toml");
        assert_eq!(
            cli.command,
            Some(Commands::ConfigGen {
                output_path: Some("out.toml".to_string())
            })
        );
    }
}
