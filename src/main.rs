use clap::Parser;
use depthcrawl::{Backend, CancellationToken, CrawlResult, CrawlerConfig};
use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.browser.backend == Backend::WebDriver {
        println!("Note: the webdriver backend requires a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
        );
    }

    // Ctrl-C stops the crawl but keeps what was fetched
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::info!("Interrupted, finishing in-flight pages");
            ctrl_c.cancel();
        }
    });

    let start_time = std::time::Instant::now();
    let result = match depthcrawl::crawl_with_cancel(&config, cancel).await {
        Ok(result) => result,
        Err(e) => {
            ::log::error!("Crawl failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!(
        "Crawling complete - visited {} pages in {:.2} seconds",
        result.len(),
        start_time.elapsed().as_secs_f64()
    );
    print_summary(&result);

    if let Some(path) = &args.output {
        let written = File::create(path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                serde_json::to_writer_pretty(BufWriter::new(file), &result)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = written {
            ::log::error!("Failed to write {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        ::log::info!("Wrote results to {}", path.display());
    }

    ExitCode::SUCCESS
}

fn build_config(args: &Args) -> Result<CrawlerConfig, depthcrawl::error::ConfigError> {
    let mut config = match &args.config {
        Some(path) => CrawlerConfig::from_file(path)?,
        None => CrawlerConfig::default(),
    };
    config.apply_env();

    if let Some(url) = &args.url {
        config.start_url = Some(url.clone());
    }
    if let Some(depth) = args.depth {
        config.max_depth = depth;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(page_timeout) = args.page_timeout {
        config.page_timeout_secs = page_timeout;
    }
    if let Some(total_timeout) = args.total_timeout {
        config.total_timeout_secs = Some(total_timeout);
    }
    if let Some(backend) = args.backend {
        config.browser.backend = backend.into();
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(result: &CrawlResult) {
    for (url, page) in result.iter() {
        println!("\nURL: {}", url);
        println!("Title: {}", if page.title.is_empty() { "N/A" } else { page.title.as_str() });
        println!("Content length: {} characters", page.content.len());
        if let Some(error) = &page.error {
            println!("Error: {}", error);
        }
        println!("Found {} links", page.links.len());
    }
}
