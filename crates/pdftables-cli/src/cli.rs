use std::path::PathBuf;

use clap::{ArgAction, Parser};
use pdftables::PageSelection;

/// Extract the ruled tables of a PDF as JSON row records.
///
/// Prints one JSON document: an array of tables (each an array of row
/// objects keyed by header) on success, or a string describing the failure.
#[derive(Debug, Parser)]
#[command(name = "pdftables", about, version)]
pub struct Cli {
    /// Path to the PDF file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Page range (e.g. '1,3-5' or 'all'). Default: all pages
    #[arg(long, value_name = "RANGE")]
    pub pages: Option<PageSelection>,

    /// Merge every detected table into one, under the first table's header
    #[arg(long)]
    pub single_table: bool,

    /// Do not treat the first row as a header; key columns by index
    #[arg(long)]
    pub no_header: bool,

    /// Convert all-numeric columns to JSON numbers
    #[arg(long)]
    pub infer_types: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Snap tolerance for aligning nearby edges (default: 3.0)
    #[arg(long, default_value_t = 3.0, value_parser = parse_tolerance)]
    pub snap_tolerance: f64,

    /// Join tolerance for merging collinear edges (default: 3.0)
    #[arg(long, default_value_t = 3.0, value_parser = parse_tolerance)]
    pub join_tolerance: f64,

    /// Text tolerance for assembling cell text (default: 3.0)
    #[arg(long, default_value_t = 3.0, value_parser = parse_tolerance)]
    pub text_tolerance: f64,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Tolerances are distances in points: finite and non-negative.
fn parse_tolerance(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("tolerance must be a finite number >= 0, got {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_file_only() {
        let cli = Cli::parse_from(["pdftables", "test.pdf"]);
        assert_eq!(cli.file, PathBuf::from("test.pdf"));
        assert!(cli.pages.is_none());
        assert!(!cli.single_table);
        assert!(!cli.no_header);
        assert!(!cli.infer_types);
        assert!(!cli.pretty);
        assert_eq!(cli.snap_tolerance, 3.0);
        assert_eq!(cli.join_tolerance, 3.0);
        assert_eq!(cli.text_tolerance, 3.0);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_with_all_options() {
        let cli = Cli::parse_from([
            "pdftables",
            "doc.pdf",
            "--pages",
            "2-4",
            "--single-table",
            "--no-header",
            "--infer-types",
            "--pretty",
            "--snap-tolerance",
            "5.0",
            "--join-tolerance",
            "4.0",
            "--text-tolerance",
            "2.0",
            "-vv",
        ]);
        assert_eq!(cli.file, PathBuf::from("doc.pdf"));
        assert_eq!(cli.pages, Some(PageSelection::Spans(vec![(2, 4)])));
        assert!(cli.single_table && cli.no_header && cli.infer_types && cli.pretty);
        assert_eq!(cli.snap_tolerance, 5.0);
        assert_eq!(cli.join_tolerance, 4.0);
        assert_eq!(cli.text_tolerance, 2.0);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn invalid_page_range_is_a_usage_error() {
        let err = Cli::try_parse_from(["pdftables", "doc.pdf", "--pages", "3-1"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let err = Cli::try_parse_from(["pdftables"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn tolerances_reject_negative_and_non_finite() {
        for bad in ["-1", "NaN", "inf", "wide"] {
            let arg = format!("--snap-tolerance={bad}");
            assert!(Cli::try_parse_from(["pdftables", "doc.pdf", arg.as_str()]).is_err());
        }
        let cli = Cli::try_parse_from(["pdftables", "doc.pdf", "--text-tolerance=0"]).unwrap();
        assert_eq!(cli.text_tolerance, 0.0);
    }
}
