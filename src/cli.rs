//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download a single resource over HTTP(S) into a local directory.
///
/// Prints the stored object's URI, byte length, status code and response
/// headers as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "fetcher")]
#[command(author, version, about)]
pub struct Args {
    /// URI to download (absolute http or https)
    pub uri: String,

    /// Directory the body is stored in
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Extra request header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Store error responses (4xx/5xx) instead of failing
    #[arg(long)]
    pub allow_failed: bool,

    /// Store empty success responses instead of failing
    #[arg(long)]
    pub allow_empty: bool,

    /// Connect timeout in seconds (1-86400)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub connect_timeout: Option<u64>,

    /// Total request timeout in seconds, including the body (1-86400)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub timeout: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_minimal_args() {
        let args = Args::try_parse_from(["fetcher", "https://example.com/a.csv"]).unwrap();
        assert_eq!(args.uri, "https://example.com/a.csv");
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(args.headers.is_empty());
        assert!(!args.allow_failed);
        assert!(!args.allow_empty);
        assert_eq!(args.connect_timeout, None);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_cli_requires_uri() {
        let err = Args::try_parse_from(["fetcher"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_repeated_headers() {
        let args = Args::try_parse_from([
            "fetcher",
            "https://example.com/",
            "-H",
            "Accept: text/csv",
            "--header",
            "Authorization: Bearer a:b",
        ])
        .unwrap();
        assert_eq!(
            args.headers,
            vec![
                ("Accept".to_string(), "text/csv".to_string()),
                ("Authorization".to_string(), "Bearer a:b".to_string()),
            ]
        );
    }

    #[test]
    fn test_cli_rejects_malformed_header() {
        let err = Args::try_parse_from(["fetcher", "https://example.com/", "-H", "no-colon"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_flags_and_timeouts() {
        let args = Args::try_parse_from([
            "fetcher",
            "https://example.com/",
            "--allow-failed",
            "--allow-empty",
            "--connect-timeout",
            "5",
            "--timeout",
            "60",
            "-vv",
        ])
        .unwrap();
        assert!(args.allow_failed);
        assert!(args.allow_empty);
        assert_eq!(args.connect_timeout, Some(5));
        assert_eq!(args.timeout, Some(60));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        let result = Args::try_parse_from(["fetcher", "https://example.com/", "--timeout", "0"]);
        assert!(result.is_err());
    }
}
