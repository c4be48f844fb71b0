mod echo;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use pagesense_core::{
    Document, DocumentSource, Embedder, FetchConfig, HashingEmbedder, JsonConfig, LiveDocument, OpenAiEmbedder,
    PageAnalysis, Report, SemanticAnalyzer, SemanticConfig, SemanticResult, StabilityConfig, StabilityMonitor,
    TextConfig, convert_to_json, convert_to_text, load_page,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the page report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Wait for a page to settle, then report its content, headings, readability and thesis
#[derive(Parser, Debug)]
#[command(name = "pagesense")]
#[command(author = "Pagesense Contributors")]
#[command(version)]
#[command(about = "Analyze the settled content of a web page", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// List every link in text output
    #[arg(long)]
    links: bool,

    /// Print section text under each heading in text output
    #[arg(long)]
    sections: bool,

    /// Quiet period before the page counts as stable
    #[arg(long, default_value = "800", value_name = "MS")]
    debounce_ms: u64,

    /// Hard limit on watching, in milliseconds
    #[arg(long, default_value = "5000", value_name = "MS")]
    kill_switch_ms: u64,

    /// Embed the page and select its thesis sentence
    #[arg(long)]
    semantic: bool,

    /// Similarity a sentence must exceed to be chosen over the fallback
    #[arg(long, default_value = "0.65", value_name = "SCORE")]
    threshold: f32,

    /// OpenAI-compatible embeddings API root; the offline hashing embedder is used when unset
    #[arg(long, env = "PAGESENSE_EMBED_ENDPOINT", value_name = "URL")]
    embed_endpoint: Option<String>,

    /// Embedding model name for the remote endpoint
    #[arg(long, default_value = "text-embedding-3-small", value_name = "MODEL")]
    embed_model: String,

    /// Requested embedding dimensions for the remote endpoint
    #[arg(long, value_name = "NUM")]
    embed_dimensions: Option<usize>,

    /// API key for the remote endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, value_name = "KEY")]
    api_key: Option<String>,

    /// Include the document vector in JSON output
    #[arg(long)]
    include_vector: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose { EnvFilter::new("pagesense_core=debug,pagesense=debug") } else { EnvFilter::new("warn") }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn build_embedder(args: &Args) -> anyhow::Result<Arc<dyn Embedder>> {
    match &args.embed_endpoint {
        Some(endpoint) => {
            let embedder = OpenAiEmbedder::new(
                args.api_key.as_deref(),
                endpoint,
                &args.embed_model,
                args.embed_dimensions,
                Duration::from_secs(args.timeout),
            )
            .context("Failed to configure embedder")?;
            tracing::debug!(endpoint = embedder.endpoint(), model = %args.embed_model, "using remote embedder");
            Ok(Arc::new(embedder))
        }
        None => Ok(Arc::new(HashingEmbedder::default())),
    }
}

async fn summarize(args: &Args, snapshot: &str, analysis: &PageAnalysis) -> anyhow::Result<Option<SemanticResult>> {
    let embedder = build_embedder(args)?;
    let analyzer = SemanticAnalyzer::with_config(
        Arc::clone(&embedder),
        SemanticConfig::default().with_similarity_threshold(args.threshold),
    );

    let payload = {
        let doc = Document::parse(snapshot).context("Failed to parse settled page")?;
        analyzer.payload(&doc)
    };

    if args.verbose {
        eprintln!("  {} {}", "Model:".dimmed(), embedder.model_name().bright_white());
    }

    embedder.init().await.context("Failed to initialize embedder")?;
    let result = analyzer
        .summarize(&payload, &analysis.main_text, &analysis.alignment_targets())
        .await;
    if let Err(e) = embedder.teardown().await {
        tracing::warn!(error = %e, "embedder teardown failed");
    }

    Ok(result)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let total_steps = if args.semantic { 4 } else { 3 };
    let started = Instant::now();
    let mut timings = Vec::new();

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
        echo::print_step(1, total_steps, &format!("Loading {}", args.input.bright_white()));
    }

    let fetch_config = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    let step = Instant::now();
    let page = load_page(&args.input, &fetch_config)
        .await
        .with_context(|| format!("Failed to load {}", args.input))?;
    timings.push(("Load".to_string(), step.elapsed()));

    if args.verbose {
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(page.html.len()).bright_white());
        eprintln!();
        echo::print_step(2, total_steps, "Waiting for content to settle");
    }

    let stability = StabilityConfig::default()
        .with_debounce(Duration::from_millis(args.debounce_ms))
        .with_kill_switch(Duration::from_millis(args.kill_switch_ms));
    let doc = LiveDocument::new(page.html, page.url);
    let step = Instant::now();
    let handle = StabilityMonitor::new(Arc::new(doc.clone()), stability).start();
    let analysis = handle
        .wait_for_stable()
        .await
        .context("Stability monitor stopped before delivering an analysis")?;
    let reason = handle.reason();
    timings.push(("Stability".to_string(), step.elapsed()));

    if args.verbose {
        echo::print_stability(reason, &analysis);
        eprintln!();
    }

    let semantic = if args.semantic {
        if args.verbose {
            echo::print_step(3, total_steps, "Selecting thesis sentence");
        }
        let step = Instant::now();
        let result = summarize(&args, &doc.snapshot(), &analysis).await?;
        timings.push(("Semantic".to_string(), step.elapsed()));
        if result.is_none() {
            echo::print_warning("Semantic summary unavailable");
        }
        result
    } else {
        None
    };

    if args.verbose {
        echo::print_step(total_steps, total_steps, "Writing report");
        eprintln!("  {} {}", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
        eprintln!();
    }

    let report = Report::new(&analysis)
        .with_stable_reason(reason)
        .with_semantic(semantic.as_ref());
    let output = match args.format {
        OutputFormat::Text => {
            let config = TextConfig { include_links: args.links, include_sections: args.sections, ..Default::default() };
            convert_to_text(&report, &config).context("Failed to render text report")?
        }
        OutputFormat::Json => {
            let config = JsonConfig { include_vector: args.include_vector, pretty: true };
            convert_to_json(&report, &config).context("Failed to render JSON report")?
        }
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", output),
    }

    if args.verbose {
        echo::print_timing_summary(started.elapsed(), &timings);
    }

    Ok(())
}
