use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use tripwright::config::Config;
use tripwright::output::{self, pdf};
use tripwright::trip::{TripRequest, parse_day_count};
use tripwright::{LlmOverride, build_planner, llm, web};

fn make_llm_override(provider: Option<String>, models: Vec<String>) -> Result<LlmOverride> {
    let provider = match provider {
        Some(name) => match llm::Provider::parse(&name) {
            Some(p) => Some(p),
            None => bail!("unknown provider {name:?}: expected openai, openrouter or anthropic"),
        },
        None => None,
    };
    Ok(LlmOverride { provider, models })
}

fn load_config(path: &Path, provider: Option<String>, models: Vec<String>) -> Result<Config> {
    let mut cfg = Config::load_or_default(path)?;
    make_llm_override(provider, models)?.apply(&mut cfg.llm);
    Ok(cfg)
}

#[derive(Parser)]
#[command(
    name = "tripwright",
    about = "Day-by-day travel itineraries from a language model, as a web page and a PDF"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Generate an itinerary and write markdown, HTML and PDF files
    Plan {
        /// Destination, e.g. "Tokyo, Japan"
        #[arg(short, long)]
        destination: String,

        /// Number of days, e.g. "7" or "7 days"
        #[arg(long)]
        days: String,

        /// Special interests
        #[arg(short, long, default_value = "")]
        interests: String,

        /// Guardrails / constraints
        #[arg(short, long, default_value = "")]
        guardrails: String,

        /// Directory for the generated files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Path to config file
        #[arg(short, long, default_value = "tripwright.toml")]
        config: PathBuf,

        /// LLM provider override: openai, openrouter, anthropic
        #[arg(long)]
        provider: Option<String>,

        /// Candidate model override, tried in the order given (repeatable)
        #[arg(long = "model")]
        models: Vec<String>,
    },

    /// Serve the input form and plan pages over HTTP
    Serve {
        /// Path to config file
        #[arg(short, long, default_value = "tripwright.toml")]
        config: PathBuf,

        /// Bind address override
        #[arg(long)]
        host: Option<String>,

        /// Port override
        #[arg(short, long)]
        port: Option<u16>,

        /// LLM provider override: openai, openrouter, anthropic
        #[arg(long)]
        provider: Option<String>,

        /// Candidate model override (repeatable)
        #[arg(long = "model")]
        models: Vec<String>,
    },

    /// Send a one-word prompt to the first candidate model
    Selftest {
        /// Path to config file
        #[arg(short, long, default_value = "tripwright.toml")]
        config: PathBuf,

        /// LLM provider override: openai, openrouter, anthropic
        #[arg(long)]
        provider: Option<String>,

        /// Candidate model override (repeatable)
        #[arg(long = "model")]
        models: Vec<String>,
    },

    /// Render a PDF from an existing markdown itinerary (no LLM calls)
    Export {
        /// Markdown itinerary file
        #[arg(short, long)]
        input: PathBuf,

        /// Destination shown in the PDF header
        #[arg(short, long)]
        destination: String,

        /// Output PDF path (defaults to travel_guide_<destination>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripwright=info,tower_http=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Plan {
            destination,
            days,
            interests,
            guardrails,
            output_dir,
            config,
            provider,
            models,
        } => {
            let request =
                TripRequest::new(destination, parse_day_count(&days)?, interests, guardrails)?;
            let cfg = load_config(&config, provider, models)?;
            let planner = build_planner(&cfg)?;
            run_plan(&planner, request, &output_dir).await
        }
        Command::Serve {
            config,
            host,
            port,
            provider,
            models,
        } => {
            let cfg = load_config(&config, provider, models)?;
            let planner = build_planner(&cfg)?;
            let host = host.unwrap_or_else(|| cfg.server.host.clone());
            let port = port.unwrap_or(cfg.server.port);
            web::run(planner, &host, port).await
        }
        Command::Selftest {
            config,
            provider,
            models,
        } => {
            let cfg = load_config(&config, provider, models)?;
            let planner = build_planner(&cfg)?;
            let completion = planner.self_test().await.context("self-test failed")?;
            println!("{}: {}", completion.model, completion.text.trim());
            Ok(())
        }
        Command::Export {
            input,
            destination,
            output,
        } => export_from_file(&input, &destination, output),
    }
}

async fn run_plan(
    planner: &tripwright::planner::Planner,
    request: TripRequest,
    output_dir: &Path,
) -> Result<()> {
    let result = planner.plan(request).await?;
    std::fs::create_dir_all(output_dir)?;

    let md_path = output_dir.join("travel_plan.md");
    std::fs::write(&md_path, &result.markdown)?;

    let html_path = output_dir.join("travel_plan.html");
    std::fs::write(&html_path, output::render_plan_page(&result)?)?;

    println!("Model: {}", result.model);
    if let Some(usage) = result.usage {
        println!("Usage: {usage}");
    }
    println!("Plan: {}", md_path.display());
    println!("Page: {}", html_path.display());

    let destination = result.request.destination();
    match pdf::export_pdf(destination, &result.markdown, result.generated_at) {
        Ok(bytes) => {
            let pdf_path = output_dir.join(output::download_file_name(destination));
            std::fs::write(&pdf_path, bytes)?;
            println!("PDF:  {}", pdf_path.display());
        }
        Err(e) => {
            tracing::error!("PDF export failed: {e}");
            eprintln!("PDF generation error: {e}. The markdown plan above is still available.");
        }
    }
    Ok(())
}

fn export_from_file(input: &Path, destination: &str, output: Option<PathBuf>) -> Result<()> {
    let markdown = std::fs::read_to_string(input)
        .with_context(|| format!("read {}", input.display()))?;
    let bytes = pdf::export_pdf(destination, &markdown, chrono::Utc::now())?;
    let output = output.unwrap_or_else(|| PathBuf::from(output::download_file_name(destination)));
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, bytes)?;
    println!("PDF rendered: {}", output.display());
    Ok(())
}
