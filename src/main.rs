//! Command line interface for the exchange set signature checker.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;

use s63check::{
    check_exchange_set, load_pub_file, CheckError, CheckReport, CheckResult, OutputDetail,
    Reporter, RootTrustAnchor,
};

#[derive(Parser)]
#[command(name = "s63check")]
#[command(about = "Signature checker for S-63 ENC exchange sets")]
#[command(long_about = "
Checks the S-63 data protection signature chain of an exchange set:
every cell file against its signature record, every manifest-listed file
against the data server certificates, all rooted at the scheme
administrator key.

EXAMPLES:
    # Check a DVD image
    s63check AVCS_DVD.iso --sa-key IHO.PUB \\
        --sa-not-before 2013-08-26 --sa-not-after 2033-08-26

    # Check an adhoc exchange set folder, listing every file
    s63check ./exchange_set --sa-key IHO.PUB \\
        --sa-not-before 2013-08-26 --sa-not-after 2033-08-26 --verbose

EXIT CODES:
    0   signatures are good
    1   signature check failed
    2   an error occurred

ENVIRONMENT VARIABLES:
    RUST_LOG    Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Exchange set folder, .iso image or .zip archive
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Scheme administrator public key file (four-block IHO.PUB format)
    #[arg(long, value_name = "FILE")]
    sa_key: PathBuf,

    /// First day of the SA certificate validity window
    #[arg(long, value_name = "YYYY-MM-DD")]
    sa_not_before: NaiveDate,

    /// Last day of the SA certificate validity window
    #[arg(long, value_name = "YYYY-MM-DD")]
    sa_not_after: NaiveDate,

    /// Print every file checked, not just failures
    #[arg(long, short)]
    verbose: bool,

    /// Print nothing; the exit code is the verdict
    #[arg(long, short)]
    silent: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let reporter = Reporter::new(OutputDetail::from_flags(cli.silent, cli.verbose));

    match run(&cli, &reporter) {
        Ok(report) => {
            render(&report, &reporter);
            if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(error) => {
            if reporter.detail() != OutputDetail::Silent {
                eprintln!("{:?}", miette::Report::new(error));
            }
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli, reporter: &Reporter) -> CheckResult<CheckReport> {
    ensure_path_exists(&cli.path)?;

    let key = load_pub_file(&cli.sa_key)?;
    let anchor = RootTrustAnchor::new(key, cli.sa_not_before, cli.sa_not_after);

    reporter.verbose(&format!("checking {}", cli.path.display()));
    check_exchange_set(&cli.path, &anchor)
}

/// Refuse obviously wrong inputs before opening anything: image and
/// archive paths must name files, anything else a directory.
fn ensure_path_exists(path: &Path) -> CheckResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("iso") | Some("zip") => {
            if !path.is_file() {
                return Err(CheckError::InvalidInput(format!(
                    "could not find file {}",
                    path.display()
                )));
            }
        }
        _ => {
            if !path.is_dir() {
                return Err(CheckError::InvalidInput(format!(
                    "could not find exchange set directory {}",
                    path.display()
                )));
            }
        }
    }
    Ok(())
}

fn render(report: &CheckReport, reporter: &Reporter) {
    for (path, outcome) in report.outcomes() {
        if outcome.passed() {
            reporter.verbose(&format!("PASS: {path}"));
        } else {
            reporter.verbose(&format!("FAIL: {path} {outcome}"));
        }
    }
    reporter.verbose("");

    for advisory in report.advisories() {
        reporter.line(&format!("note: {advisory}"));
    }

    if report.passed() {
        reporter.line("Check passed");
    } else {
        reporter.line("Check failed on following files");
        for (path, outcome) in report.failures() {
            reporter.line(&format!("\t{path} ({outcome})"));
        }
    }
}
