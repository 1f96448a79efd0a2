//! folio - magazine export importer

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use folio::{Config, ImportReport, Outcome};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Reconstruct articles from a per-page HTML magazine export", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio export/                   Summarize the articles found
    folio export/ --json > out.json Write the full report as JSON
    folio export/ -c folio.toml     Use custom markers and keywords")]
struct Cli {
    /// Export directory (pages plus <name>-web-resources/)
    #[arg(value_name = "DIR")]
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome, String> {
    let config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => Config::default(),
    };

    let report = folio::process_directory(&cli.input, &config).map_err(|e| e.to_string())?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print_summary(&report);
    }
    Ok(report.outcome)
}

fn print_summary(report: &ImportReport) {
    let edition = &report.edition;
    if let Some(number) = edition.issue_number {
        print!("Issue {number}");
        if let Some(volume) = edition.volume {
            print!(", volume {volume}");
        }
        if let Some(date) = edition.issue_date {
            print!(", {date}");
        }
        println!();
    }
    if let Some(ref headline) = edition.cover_headline {
        println!("Cover: {headline}");
    }

    for article in &report.articles {
        let pages = if article.page_start == article.page_end {
            format!("p. {}", article.page_start)
        } else {
            format!("p. {}-{}", article.page_start, article.page_end)
        };
        let category = article
            .category
            .as_deref()
            .map(|c| format!("[{c}] "))
            .unwrap_or_default();
        println!("{pages:>10}  {category}{}", article.title);
        if !article.authors.is_empty() {
            println!("{:>10}  by {}", "", article.authors.join(", "));
        }
    }

    println!(
        "{} articles, {} authors, {} images, {} warnings ({:?})",
        report.articles.len(),
        report.authors.len(),
        report.images.len(),
        report.warnings.len() + report.errors.len(),
        report.outcome
    );
}
