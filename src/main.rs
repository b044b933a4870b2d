use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use paperscan::cache::SearchCache;
use paperscan::search::{self, Arxiv, LiteratureSearch, PaperSearch, SemanticScholar};
use paperscan::{InferSniffer, PaperAnalysis, pdf};

#[derive(Parser)]
#[command(name = "paperscan", about = "Extract sections, references and keywords from academic papers")]
struct Cli {
    /// PDF file to process
    file: PathBuf,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Look up related papers for the extracted keywords
    #[arg(long)]
    search: bool,

    /// Don't read or write the search result cache
    #[arg(long)]
    no_cache: bool,

    /// Timeout for each search request, in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Semantic Scholar API key
    #[arg(long, env = "SEMANTIC_SCHOLAR_API_KEY")]
    semantic_scholar_key: Option<String>,

    /// Override pdfium library path
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_path: Option<String>,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let pdfium = pdf::bind_pdfium(cli.pdfium_path.as_deref())?;
    let bytes = std::fs::read(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let mut analysis = paperscan::analyze_pdf(&pdfium, &bytes, &InferSniffer)
        .with_context(|| format!("Failed to analyze {}", cli.file.display()))?;

    if cli.search {
        let literature = build_search(&cli);
        analysis.related_papers = literature.related_papers(&analysis.keywords);
    }
    print_output(&analysis, cli.pretty)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_search(cli: &Cli) -> LiteratureSearch {
    let agent = search::http_agent(Duration::from_secs(cli.timeout));
    let backends: Vec<Box<dyn PaperSearch>> = vec![
        Box::new(SemanticScholar::new(agent.clone(), cli.semantic_scholar_key.clone())),
        Box::new(Arxiv::new(agent)),
    ];
    let cache = if cli.no_cache {
        None
    } else {
        SearchCache::open_default()
            .inspect_err(|e| warn!("search cache unavailable: {e:#}"))
            .ok()
    };
    LiteratureSearch::new(backends, cache)
}

fn print_output(analysis: &PaperAnalysis, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(analysis)?
    } else {
        serde_json::to_string(analysis)?
    };
    println!("{json}");
    Ok(())
}
