//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use contentagent_core::{ContentAgent, ProgressReporter};
use contentagent_gateway::{GeminiClient, GeminiConfig};
use contentagent_shared::{
    AppConfig, Envelope, Stage, init_config, load_config, resolve_api_key,
};
use contentagent_storage::ArtifactStore;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::menu;
use crate::render::{self, Summary};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ContentAgent: plan and write content with Gemini.
#[derive(Parser)]
#[command(
    name = "contentagent",
    version,
    about = "Analyze topics, plan content calendars, and generate content with Gemini.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory for analyses, plans, content and debug artifacts.
    #[arg(long, env = "CONTENTAGENT_OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Print the raw result envelope as JSON instead of a summary.
    #[arg(long, global = true)]
    pub json: bool,

    /// Defaults to the interactive menu.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the interactive numbered menu.
    Menu,

    /// Analyze a topic and industry for content opportunities.
    Analyze {
        /// Topic to analyze (e.g. "time tracking").
        #[arg(short, long)]
        topic: String,

        /// Industry the topic belongs to (e.g. "freelancing").
        #[arg(short, long)]
        industry: String,
    },

    /// Generate a three-month content plan from the saved analysis.
    Plan,

    /// Create content for one calendar entry of the saved plan.
    Create {
        /// 1-based calendar entry number.
        #[arg(short = 'n', long)]
        index: usize,
    },

    /// Recommend improvements for content from its performance metrics.
    Optimize {
        /// Content JSON file (e.g. a generated content_*.json).
        #[arg(long)]
        content: PathBuf,

        /// Metrics JSON file.
        #[arg(long)]
        metrics: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contentagent=info",
        1 => "contentagent=debug",
        _ => "contentagent=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let command = cli.command.unwrap_or(Command::Menu);

    if let Command::Config { action } = &command {
        match action {
            ConfigAction::Init => cmd_config_init()?,
            ConfigAction::Show => cmd_config_show()?,
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config()?;
    let agent = build_agent(&config, cli.output_dir)?;
    let output = Output { json: cli.json };

    match command {
        Command::Menu => {
            cmd_menu(&agent).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Analyze { topic, industry } => {
            info!(%topic, %industry, "analyzing topic");
            let env = agent.analyze_topic(&topic, &industry, &CliProgress::new()).await;
            output.emit(Summary::Analysis, &env)
        }
        Command::Plan => {
            info!("generating content plan");
            let env = agent.generate_content_plan(&CliProgress::new()).await;
            output.emit(Summary::Plan, &env)
        }
        Command::Create { index } => {
            info!(index, "creating content");
            let env = agent.create_content(index, &CliProgress::new()).await;
            output.emit(Summary::Content, &env)
        }
        Command::Optimize { content, metrics } => {
            info!(content = %content.display(), metrics = %metrics.display(), "optimizing content");
            let env = agent
                .optimize_files(&content, &metrics, &CliProgress::new())
                .await;
            output.emit(Summary::Optimization, &env)
        }
        Command::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Resolve the API key and output directory. A missing key is fatal here,
/// before any task runs.
fn build_agent(config: &AppConfig, output_dir: Option<PathBuf>) -> Result<ContentAgent<GeminiClient>> {
    let api_key = resolve_api_key(config)?;
    let client = GeminiClient::new(GeminiConfig::from_settings(&config.gemini, api_key))?;

    let root = output_dir.unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));
    std::fs::create_dir_all(&root)
        .wrap_err_with(|| format!("cannot create output directory {}", root.display()))?;

    info!(
        model = client.model(),
        output_dir = %root.display(),
        "agent ready"
    );
    Ok(ContentAgent::new(client, ArtifactStore::new(root)))
}

/// How task results reach stdout.
struct Output {
    json: bool,
}

impl Output {
    fn emit(&self, summary: Summary, envelope: &Envelope) -> Result<ExitCode> {
        let mut stdout = std::io::stdout().lock();
        if self.json {
            use std::io::Write;
            serde_json::to_writer_pretty(&mut stdout, envelope)?;
            writeln!(stdout)?;
        } else {
            render::envelope(&mut stdout, summary, envelope)?;
        }

        Ok(if envelope.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}

async fn cmd_menu(agent: &ContentAgent<GeminiClient>) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    menu::run(agent, &mut input, &mut out, &CliProgress::new()).await
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner, one per task.
struct CliProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn set_message(&self, msg: String) {
        let Ok(mut slot) = self.spinner.lock() else {
            return;
        };
        let spinner = slot.get_or_insert_with(|| {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
                spinner.set_style(
                    style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
                );
            }
            spinner.enable_steady_tick(std::time::Duration::from_millis(80));
            spinner
        });
        spinner.set_message(msg);
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, task: &str, stage: Stage) {
        let label = match stage {
            Stage::Load => "Loading inputs",
            Stage::Build => "Building prompt",
            Stage::Send => "Waiting for Gemini",
            Stage::Normalize => "Cleaning response",
            Stage::Decode => "Decoding JSON",
            Stage::Validate => "Checking structure",
            Stage::Persist => "Saving",
        };
        self.set_message(format!("{task}: {label}"));
    }

    fn batch(&self, current: usize, total: usize) {
        self.set_message(format!("Calendar batch [{current}/{total}]"));
    }

    fn done(&self, _task: &str, _envelope: &Envelope) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                spinner.finish_and_clear();
            }
        }
    }
}
