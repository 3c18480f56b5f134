//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use patentdraft_core::assembler::{DraftStyle, assemble_case};
use patentdraft_core::claims::{DelimiterRule, split_file};
use patentdraft_core::convert::{CommandHtmlSource, convert_document};
use patentdraft_core::draft::{DraftPreview, DraftRequest, dry_run_preview, generate_section};
use patentdraft_generation::MessagesClient;
use patentdraft_shared::{AppConfig, discover_api_key, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// patentdraft: assemble patent application drafts from section fragments.
#[derive(Parser)]
#[command(
    name = "patentdraft",
    version,
    about = "Generate, split and assemble patent application draft sections.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
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
    /// Assemble a filing-order draft with placeholder titles and error markers.
    Render {
        /// Case directory holding the section files.
        dir: PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Concatenate the section files under plain titles.
    Merge {
        /// Case directory holding the section files.
        dir: PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a .docx document to markdown.
    Convert {
        /// Input .docx file.
        input: PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate one section from a prompt template and context files.
    Generate {
        /// Prompt template file.
        #[arg(short, long)]
        prompt: PathBuf,

        /// Context file, appended in order (repeatable).
        #[arg(short, long)]
        context: Vec<PathBuf>,

        /// Output file for the generated section.
        #[arg(short, long)]
        output: PathBuf,

        /// Model name (defaults to the configured model).
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature, 0.0 - 1.0 (defaults to the configured value).
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Upper bound on generated tokens.
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Only split claims at a `---` standing as its own paragraph.
        #[arg(long)]
        strict: bool,

        /// Show what would be sent without calling the API.
        #[arg(long)]
        dry_run: bool,
    },

    /// Split the explanation off an existing claims file.
    Split {
        /// Claims file to rewrite in place.
        claims: PathBuf,

        /// Only split at a `---` standing as its own paragraph.
        #[arg(long)]
        strict: bool,
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

/// Crates whose events the default filter lets through.
const LOG_TARGETS: [&str; 5] = [
    "patentdraft",
    "patentdraft_core",
    "patentdraft_shared",
    "patentdraft_markdown",
    "patentdraft_generation",
];

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// documents.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let directives = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

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
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render { dir, output } => {
            cmd_assemble(&dir, DraftStyle::Placeholder, output.as_deref())
        }
        Command::Merge { dir, output } => cmd_assemble(&dir, DraftStyle::Plain, output.as_deref()),
        Command::Convert { input, output } => cmd_convert(&input, output.as_deref()),
        Command::Generate {
            prompt,
            context,
            output,
            model,
            temperature,
            max_tokens,
            strict,
            dry_run,
        } => {
            let config = load_config()?;
            let request = DraftRequest {
                prompt,
                contexts: context,
                output,
                model: model.unwrap_or_else(|| config.generation.model.clone()),
                temperature: temperature.unwrap_or(config.generation.temperature),
                max_tokens: max_tokens.unwrap_or(config.generation.max_tokens),
                delimiter: DelimiterRule::from_strict(strict || config.claims.strict_delimiter),
            };
            cmd_generate(&config, &request, dry_run).await
        }
        Command::Split { claims, strict } => cmd_split(&claims, strict),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_assemble(dir: &Path, style: DraftStyle, output: Option<&Path>) -> Result<()> {
    info!(dir = %dir.display(), ?style, "assembling draft");

    let document = assemble_case(dir, style)?;
    if !document.is_complete() {
        warn!(missing = ?document.missing, "draft is incomplete");
    }

    emit(&document.render(), output)
}

fn cmd_convert(input: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let source = CommandHtmlSource::from_config(&config.convert);

    let markdown = convert_document(&source, input)?;
    emit(&format!("{markdown}\n"), output)
}

async fn cmd_generate(config: &AppConfig, request: &DraftRequest, dry_run: bool) -> Result<()> {
    if dry_run {
        let preview = dry_run_preview(request, &config.generation.base_url)?;
        print_preview(&preview);
        return Ok(());
    }

    request.validate()?;
    config.generation.validate()?;

    let cwd =
        std::env::current_dir().map_err(|e| eyre!("cannot determine working directory: {e}"))?;
    let api_key = discover_api_key(&config.generation, &cwd, |name| std::env::var(name).ok())?;
    let client = MessagesClient::new(
        &config.generation.base_url,
        api_key,
        config.generation.timeout_secs,
    )?;

    let spinner = spinner(format!("Generating {} with {}", request.output.display(), request.model))?;
    let result = generate_section(&client, request).await;
    spinner.finish_and_clear();
    let outcome = result?;

    println!();
    println!("  Section generated!");
    println!("  Model:       {}", outcome.model);
    if let Some(tokens) = outcome.output_tokens {
        println!("  Tokens out:  {tokens}");
    }
    println!("  Output:      {}", outcome.output.display());
    if let Some(explanation) = &outcome.explanation {
        println!("  Explanation: {}", explanation.display());
    }
    println!();

    Ok(())
}

fn cmd_split(claims: &Path, strict: bool) -> Result<()> {
    let config = load_config()?;
    let rule = DelimiterRule::from_strict(strict || config.claims.strict_delimiter);

    let outcome = split_file(claims, rule)?;
    match &outcome.explanation_path {
        Some(path) => println!("Explanation split off to: {}", path.display()),
        None => println!("No delimiter found; {} left as claims only", claims.display()),
    }
    Ok(())
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
// Output helpers
// ---------------------------------------------------------------------------

/// Write `text` to `output` (creating parent dirs) or to stdout.
fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    let Some(path) = output else {
        print!("{text}");
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| eyre!("cannot create {}: {e}", parent.display()))?;
    }
    std::fs::write(path, text).map_err(|e| eyre!("cannot write {}: {e}", path.display()))?;

    info!(path = %path.display(), bytes = text.len(), "document written");
    println!("Saved to: {}", path.display());
    Ok(())
}

fn print_preview(preview: &DraftPreview) {
    let contexts: Vec<String> = preview
        .contexts
        .iter()
        .map(|c| c.display().to_string())
        .collect();

    println!("=== Dry run ===");
    println!("Model:       {}", preview.model);
    println!("Endpoint:    {}", preview.endpoint);
    println!("Temperature: {}", preview.temperature);
    println!("Prompt:      {}", preview.prompt.display());
    println!("Contexts:    [{}]", contexts.join(", "));
    println!("Output:      {}", preview.output.display());
    println!("Est. tokens: {}", preview.estimated_tokens);
    println!();
    println!("=== Message excerpt ===");
    println!("{}...", preview.excerpt);
}

/// Steady-ticking spinner on stderr.
fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_collects_repeated_contexts() {
        let cli = Cli::try_parse_from([
            "patentdraft",
            "generate",
            "-p",
            "prompt.md",
            "-c",
            "a.md",
            "-c",
            "b.md",
            "-o",
            "out/02_权利要求书.md",
            "--temperature",
            "0.3",
        ])
        .unwrap();

        match cli.command {
            Command::Generate {
                context,
                temperature,
                model,
                dry_run,
                ..
            } => {
                assert_eq!(context, [PathBuf::from("a.md"), PathBuf::from("b.md")]);
                assert_eq!(temperature, Some(0.3));
                assert!(model.is_none());
                assert!(!dry_run);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["patentdraft", "render", "case", "-vv", "--log-format", "json"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(cli.command, Command::Render { output: None, .. }));
    }

    #[test]
    fn emit_creates_parent_dirs() {
        let tmp = std::env::temp_dir().join(format!("pd-cli-test-{}", uuid::Uuid::now_v7()));
        let out = tmp.join("nested").join("draft.md");

        emit("# 专利申请文件\n", Some(&out)).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "# 专利申请文件\n");

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
