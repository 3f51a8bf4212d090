use anyhow::{bail, Context};
use clap::Parser;
use llm_comply::{
    ComplianceResult, Config, Notification, Pipeline, SystemClipboard, TemplateDraft, TemplateKind,
};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "llm-comply",
    version,
    author,
    about = "Reformat AI-generated text against a template and flag risky words",
    long_about = "Reformat AI-generated text against a template and flag risky words.\n\n\
    The text is (optionally) stripped of chat-model preambles, sent to an \
    OpenAI-compatible API together with the template's formatting \
    instructions, and the result is scanned for the template's warning words.\n\n\
    USAGE EXAMPLES:\n  \
      # Scan a file locally with a starter template\n  \
      llm-comply draft.txt --preset marketing-copy --scan-only\n\n  \
      # Verify and convert clipboard contents with a custom template\n  \
      llm-comply --paste --name Formal --instructions 'Dear [Name], ...' --warn urgent --warn asap --convert\n\n  \
      # Read from stdin, clean preambles, JSON output\n  \
      cat reply.txt | llm-comply - --preset customer-service-email --clean --json"
)]
struct Cli {
    /// File to read content from ("-" for stdin)
    #[arg(value_name = "FILE", conflicts_with_all = ["text", "paste"])]
    input: Option<PathBuf>,

    /// Content given inline
    #[arg(short, long, conflicts_with = "paste")]
    text: Option<String>,

    /// Read content from the system clipboard
    #[arg(long)]
    paste: bool,

    /// Starter template to use
    #[arg(short, long, value_enum, conflicts_with_all = ["name", "instructions"])]
    preset: Option<CliPreset>,

    /// Template name (custom template)
    #[arg(long, requires = "instructions")]
    name: Option<String>,

    /// Template formatting instructions (custom template)
    #[arg(long, requires = "name")]
    instructions: Option<String>,

    /// Warning word to flag (can be used multiple times)
    #[arg(short, long = "warn", value_name = "WORD")]
    warn: Vec<String>,

    /// Strip AI preamble phrases before processing
    #[arg(long)]
    clean: bool,

    /// Convert after a successful verify
    #[arg(long, conflicts_with = "scan_only")]
    convert: bool,

    /// Only scan the content locally, never call the API
    #[arg(long)]
    scan_only: bool,

    /// API key (stored for later runs after a successful call)
    #[arg(long, env = "LLM_COMPLY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat completions endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Do not read or store the API key on disk
    #[arg(long)]
    no_store: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliPreset {
    /// Reply to a customer inquiry
    CustomerServiceEmail,
    /// Promotional copy
    MarketingCopy,
    /// Memo to colleagues
    InternalCommunication,
    /// Pitch to a prospect
    SalesPitch,
    /// Catalogue or store listing
    ProductDescription,
}

impl From<CliPreset> for TemplateKind {
    fn from(p: CliPreset) -> Self {
        match p {
            CliPreset::CustomerServiceEmail => Self::CustomerServiceEmail,
            CliPreset::MarketingCopy => Self::MarketingCopy,
            CliPreset::InternalCommunication => Self::InternalCommunication,
            CliPreset::SalesPitch => Self::SalesPitch,
            CliPreset::ProductDescription => Self::ProductDescription,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    template: &'a str,
    content: &'a str,
    verified: bool,
    converted: Option<&'a str>,
    compliance: Option<&'a ComplianceResult>,
    notifications: &'a [Notification],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let config = build_config(&cli).context("Failed to build configuration")?;
    let mut pipeline = Pipeline::from_config(config).context("Failed to create pipeline")?;

    if let Some(ref key) = cli.api_key {
        pipeline.set_credential(key.as_str());
    }

    let template_name = install_template(&mut pipeline, &cli)?;
    pipeline.select_template(Some(&template_name));

    if cli.paste {
        let mut clipboard = SystemClipboard::new()?;
        let pasted = pipeline.paste(&mut clipboard);
        let notes = pipeline.take_notifications();
        report_notifications(&notes);
        pasted?;
    } else {
        pipeline.set_content(read_content(&cli)?);
    }

    if cli.clean {
        pipeline.clean_boilerplate();
    }

    let mut notifications = pipeline.take_notifications();
    let outcome = if cli.scan_only {
        pipeline.check_compliance().map(|_| ())
    } else {
        run_remote(&mut pipeline, cli.convert).await
    };
    notifications.extend(pipeline.take_notifications());

    let session = pipeline.session();
    let converted = Some(session.converted_content()).filter(|c| !c.is_empty());

    if cli.json {
        let report = Report {
            template: &template_name,
            content: session.content(),
            verified: session.gate() == llm_comply::GateState::Verified,
            converted,
            compliance: session.compliance(),
            notifications: &notifications,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report_notifications(&notifications);
        if let Some(result) = session.compliance() {
            print_compliance(result);
        }
        if let Some(text) = converted {
            println!("{text}");
        }
    }

    outcome.context("Processing failed")?;
    Ok(())
}

async fn run_remote(pipeline: &mut Pipeline, convert: bool) -> llm_comply::Result<()> {
    pipeline.verify().await?;
    if convert {
        pipeline.convert().await?;
    }
    Ok(())
}

fn build_config(cli: &Cli) -> llm_comply::Result<Config> {
    let mut builder = Config::builder().require_credential(!cli.scan_only);

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.as_str());
    }

    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }

    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout(std::time::Duration::from_secs(secs));
    }

    if !cli.no_store {
        if let Some(path) = Config::default_credential_path() {
            builder = builder.credential_path(path);
        }
    }

    builder.build()
}

/// Saves the template described on the command line and returns its name.
fn install_template(pipeline: &mut Pipeline, cli: &Cli) -> anyhow::Result<String> {
    let name = if let Some(preset) = cli.preset {
        let kind = TemplateKind::from(preset);
        let mut draft = kind.draft();
        for word in &cli.warn {
            draft.add_warning_word(word);
        }
        pipeline.replace_draft(draft);
        kind.display_name().to_string()
    } else if let (Some(name), Some(instructions)) = (&cli.name, &cli.instructions) {
        pipeline.replace_draft(TemplateDraft::new(name.as_str(), instructions.as_str()));
        for word in &cli.warn {
            pipeline.add_warning_word(word);
        }
        name.clone()
    } else {
        bail!("A template is required: use --preset, or --name together with --instructions");
    };

    let saved = pipeline.save_template();
    let notes = pipeline.take_notifications();
    if saved.is_err() {
        report_notifications(&notes);
    }
    saved.context("Failed to save template")?;
    Ok(name)
}

fn read_content(cli: &Cli) -> anyhow::Result<String> {
    if let Some(ref text) = cli.text {
        return Ok(text.clone());
    }

    match cli.input {
        Some(ref path) if path.as_os_str() == "-" => read_stdin(),
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => read_stdin(),
    }
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}

fn report_notifications(notifications: &[Notification]) {
    for notification in notifications {
        eprintln!("{notification}");
    }
}

fn print_compliance(result: &ComplianceResult) {
    if result.is_compliant {
        eprintln!("✓ Compliant: no warning words found");
        return;
    }

    eprintln!("⚠ {} warning word(s) found:", result.warnings.len());
    for warning in &result.warnings {
        eprintln!("  - {}", warning.message);
    }
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("llm_comply=info"),
        1 => EnvFilter::new("llm_comply=debug"),
        _ => EnvFilter::new("llm_comply=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    Ok(())
}
