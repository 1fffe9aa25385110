use clap::{Parser, ValueEnum};
use depthcrawl::Backend;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "depthcrawl")]
#[command(about = "Depth-bounded crawler that follows links through a headless browser")]
#[command(version)]
pub struct Args {
    /// URL to start crawling from
    pub url: Option<String>,

    /// Maximum number of link hops from the start URL
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Number of pages fetched at the same time
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Per-page navigation timeout in seconds
    #[arg(long)]
    pub page_timeout: Option<u64>,

    /// Total timeout in seconds; partial results are kept
    #[arg(long)]
    pub total_timeout: Option<u64>,

    /// Browser backend
    #[arg(short, long, value_enum)]
    pub backend: Option<BackendArg>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the crawl result as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Webdriver,
    Http,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Webdriver => Backend::WebDriver,
            BackendArg::Http => Backend::Http,
        }
    }
}
