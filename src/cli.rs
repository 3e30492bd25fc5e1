use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::constants::{DEFAULT_CLIENT_ID_FILE, DEFAULT_SECRET_FILE};

/// Reply once to every sender still waiting for an answer in matching Gmail threads.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Gmail search expression selecting the threads to reply to
    #[arg(long)]
    pub query: Option<String>,

    /// Message body to send in reply
    #[arg(long)]
    pub message: Option<String>,

    /// Only consider threads after this date (YYYY/MM/DD)
    #[arg(long = "start-date", alias = "start_date")]
    pub start_date: Option<String>,

    /// Only consider threads before this date (YYYY/MM/DD)
    #[arg(long = "end-date", alias = "end_date")]
    pub end_date: Option<String>,

    /// Prompt y/n before sending each reply
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub prompt: Option<bool>,

    /// OAuth client ID; overrides --client-id-file when non-empty
    #[arg(long = "client-id", alias = "clientid", default_value = "")]
    pub client_id: String,

    /// File containing just the OAuth client ID
    #[arg(long = "client-id-file", alias = "clientid_file", default_value = DEFAULT_CLIENT_ID_FILE)]
    pub client_id_file: PathBuf,

    /// OAuth client secret; overrides --secret-file when non-empty
    #[arg(long, default_value = "")]
    pub secret: String,

    /// File containing just the OAuth client secret
    #[arg(long = "secret-file", alias = "secret_file", default_value = DEFAULT_SECRET_FILE)]
    pub secret_file: PathBuf,

    /// Cache the OAuth refresh token between runs
    #[arg(
        long = "cache-token",
        alias = "cachetoken",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub cache_token: bool,

    /// Config file (default: <config dir>/autoreply/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["autoreply"]).unwrap();
        assert_eq!(args.query, None);
        assert_eq!(args.prompt, None);
        assert!(args.cache_token);
        assert!(args.client_id.is_empty());
        assert_eq!(args.client_id_file, PathBuf::from("clientid.dat"));
        assert_eq!(args.secret_file, PathBuf::from("clientsecret.dat"));
    }

    #[test]
    fn test_boolean_flags_take_values() {
        let args =
            Args::try_parse_from(["autoreply", "--prompt", "false", "--cache-token", "false"]).unwrap();
        assert_eq!(args.prompt, Some(false));
        assert!(!args.cache_token);
    }

    #[test]
    fn test_bare_boolean_flags_mean_true() {
        let args = Args::try_parse_from(["autoreply", "--prompt", "--cache-token"]).unwrap();
        assert_eq!(args.prompt, Some(true));
        assert!(args.cache_token);

        let args = Args::try_parse_from(["autoreply", "--cache-token", "false", "--prompt"]).unwrap();
        assert_eq!(args.prompt, Some(true));
        assert!(!args.cache_token);
    }

    #[test]
    fn test_legacy_flag_spellings() {
        let args = Args::try_parse_from([
            "autoreply",
            "--start_date",
            "2024/01/02",
            "--end_date",
            "2024/02/03",
            "--clientid",
            "abc",
        ])
        .unwrap();
        assert_eq!(args.start_date.as_deref(), Some("2024/01/02"));
        assert_eq!(args.end_date.as_deref(), Some("2024/02/03"));
        assert_eq!(args.client_id, "abc");
    }
}
