use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use top_langs::config::{ChartArgs, Config, DEFAULT_OUTPUT};
use top_langs::svg::{Layout, Theme};
use top_langs::{GithubClient, LanguageTotals, output, placeholder, svg};

#[derive(Parser)]
#[command(
    name = "top-langs",
    version,
    about = "Render a GitHub account's language mix as an SVG chart"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[command(flatten)]
    chart: ChartFlags,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the "coming soon" activity and WakaTime cards.
    Placeholders {
        /// Directory the cards are written into.
        #[arg(long, default_value = "assets")]
        out_dir: PathBuf,
    },
}

#[derive(Args)]
struct ChartFlags {
    /// Account whose repositories are counted [env: GITHUB_USERNAME, GITHUB_ACTOR]
    #[arg(short, long)]
    user: Option<String>,
    /// Where the chart is written.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// REST API root [env: GITHUB_API_URL]
    #[arg(long)]
    api_url: Option<String>,
    /// Chart layout: donut or bar.
    #[arg(long, default_value = "donut")]
    layout: Layout,
    /// Color theme: dark or light.
    #[arg(long, default_value = "dark")]
    theme: Theme,
    /// Languages shown before the rest is grouped as "Other".
    #[arg(long, default_value_t = 5)]
    top: usize,
    /// Fold one language into another, e.g. TypeScript=JavaScript. Repeatable.
    #[arg(long, value_name = "FROM=TO")]
    merge: Vec<String>,
    /// Skip repositories whose languages cannot be fetched instead of failing.
    #[arg(long)]
    skip_failed: bool,
}

impl From<ChartFlags> for ChartArgs {
    fn from(f: ChartFlags) -> Self {
        ChartArgs {
            user: f.user,
            output: Some(f.output),
            api_url: f.api_url,
            layout: f.layout,
            theme: f.theme,
            top: f.top,
            merge: f.merge,
            skip_failed: f.skip_failed,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run().await {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Placeholders { out_dir }) => write_placeholders(&out_dir),
        None => run_chart(Config::from_env(cli.chart.into())?).await,
    }
}

async fn run_chart(config: Config) -> Result<()> {
    info!(user = %config.user, api = %config.api_url, "collecting language totals");
    if config.token.is_none() {
        warn!("no GitHub token found; unauthenticated rate limits apply");
    }

    let client = GithubClient::new(&config.api_url, config.token.clone())?;
    let mut totals = LanguageTotals::with_aliases(config.aliases.clone());
    top_langs::collect_totals(&client, &config.user, config.policy, &mut totals).await?;

    let chart = svg::generate_svg(&totals, config.chart);
    output::write_atomic(&config.output, &chart)?;

    info!(path = %config.output.display(), "generated language chart");
    Ok(())
}

fn write_placeholders(out_dir: &std::path::Path) -> Result<()> {
    for (name, contents) in placeholder::all_cards(Utc::now()) {
        let path = out_dir.join(name);
        output::write_atomic(&path, &contents)?;
        info!(path = %path.display(), "wrote placeholder card");
    }
    Ok(())
}
