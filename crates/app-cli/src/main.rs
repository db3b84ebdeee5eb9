mod runner;
mod wizard;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use app_engine::memory::{LoggingCollaborators, MemoryStore, StaticCompletion};
use app_engine::{
    CollaboratorError, Collaborators, Engine, EngineConfig, GenerateRequest, GenerateResponse,
    SubmitError, SubmitRequest,
};
use app_spec::values::format_number;
use app_spec::{
    Document, Environment, GenerationError, Values, build_prompt, build_render_payload,
    evaluate_formula, evaluate_guard, lint, render_json_ui, render_text, validate_document,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use runner::Runner;
use wizard::Verbosity;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "App definition toolkit",
    long_about = "Checks, renders, runs and submits JSON app definitions, and drafts new ones from a generator response"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a document and report authoring problems.
    Check {
        /// Path to the document JSON.
        #[arg(long, value_name = "DOC")]
        doc: PathBuf,
    },
    /// Evaluate every section against a set of values.
    Render {
        #[arg(long, value_name = "DOC")]
        doc: PathBuf,
        /// Optional JSON object of field values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderFormat::Text)]
        format: RenderFormat,
    },
    /// Evaluate a single formula, or a guard with --guard.
    Eval {
        #[arg(long, value_name = "EXPR")]
        expr: String,
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Evaluate as a show-if guard instead of a formula.
        #[arg(long)]
        guard: bool,
    },
    /// Run a document interactively in the terminal, then submit it.
    Run {
        #[arg(long, value_name = "DOC")]
        doc: PathBuf,
        /// Optional JSON file with values that should not be asked for.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Show collected values, hidden sections and side-effect failures.
        #[arg(long, alias = "debug")]
        verbose: bool,
    },
    /// Push values through the submission pipeline and print the response.
    Submit {
        #[arg(long, value_name = "DOC")]
        doc: PathBuf,
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the generation prompt for a request.
    Prompt {
        #[arg(long, value_name = "TEXT")]
        input: String,
    },
    /// Turn a saved generator response into a validated document.
    Generate {
        #[arg(long, value_name = "TEXT")]
        input: String,
        /// File holding the raw generator response.
        #[arg(long, value_name = "RESPONSE")]
        response: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match dispatch(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Check { doc } => run_check(&doc),
        Command::Render {
            doc,
            values,
            format,
        } => run_render(&doc, values.as_deref(), format),
        Command::Eval {
            expr,
            values,
            guard,
        } => run_eval(&expr, values.as_deref(), guard),
        Command::Run {
            doc,
            values,
            config,
            verbose,
        } => run_app(&doc, values.as_deref(), config.as_deref(), verbose).await,
        Command::Submit {
            doc,
            values,
            config,
        } => run_submit(&doc, &values, config.as_deref()).await,
        Command::Prompt { input } => run_prompt(&input),
        Command::Generate { input, response } => run_generate(&input, &response).await,
    }
}

fn load_raw(path: &Path) -> CliResult<Value> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    Ok(serde_json::from_str(&contents)?)
}

fn load_document(path: &Path) -> CliResult<Document> {
    let document = validate_document(&load_raw(path)?)?;
    debug!(slug = %document.slug(), sections = document.sections.len(), "document loaded");
    Ok(document)
}

fn load_values(path: Option<&Path>) -> CliResult<Values> {
    match path {
        Some(path) => Ok(serde_json::from_value(load_raw(path)?)
            .map_err(|err| format!("values must be a JSON object: {}", err))?),
        None => Ok(Values::new()),
    }
}

fn logging_collaborators() -> Collaborators {
    let sink = Arc::new(LoggingCollaborators);
    Collaborators::new(sink.clone(), sink.clone(), sink)
}

fn offline_engine(store: MemoryStore, completion: StaticCompletion, config: EngineConfig) -> Engine {
    Engine::new(
        Arc::new(store),
        logging_collaborators(),
        Arc::new(completion),
        config,
    )
}

fn run_check(doc_path: &Path) -> CliResult<()> {
    let document = load_document(doc_path)?;
    let issues = lint(&document);
    println!(
        "{}: valid ({} sections)",
        document.slug(),
        document.sections.len()
    );
    for issue in &issues {
        println!(
            "warning: {} [{}] {}",
            issue.location,
            issue.code.as_str(),
            issue.message
        );
    }
    Ok(())
}

fn run_render(doc_path: &Path, values_path: Option<&Path>, format: RenderFormat) -> CliResult<()> {
    let document = load_document(doc_path)?;
    let values = load_values(values_path)?;
    let payload = build_render_payload(&document, &values);
    match format {
        RenderFormat::Text => println!("{}", render_text(&payload)),
        RenderFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json_ui(&payload))?),
    }
    Ok(())
}

fn run_eval(expression: &str, values_path: Option<&Path>, guard: bool) -> CliResult<()> {
    let values = load_values(values_path)?;
    let env = Environment::from_values(&values);
    if guard {
        println!("{}", evaluate_guard(expression, &env)?);
    } else {
        println!("{}", format_number(evaluate_formula(expression, &env)?));
    }
    Ok(())
}

async fn run_app(
    doc_path: &Path,
    values_path: Option<&Path>,
    config_path: Option<&Path>,
    verbose: bool,
) -> CliResult<()> {
    let document = load_document(doc_path)?;
    let values = load_values(values_path)?;
    let config = EngineConfig::load(config_path)?;
    let engine = offline_engine(MemoryStore::new(), no_generator(), config);

    let stdin = io::stdin();
    let mut runner = Runner::new(
        &document,
        values,
        stdin.lock(),
        Verbosity::from_verbose(verbose),
    );
    runner.run()?;

    loop {
        let outcome = engine.pipeline().submit(&document, runner.values()).await;
        match outcome {
            Ok(report) => {
                if verbose {
                    println!("Values:\n{}", serde_json::to_string_pretty(runner.values())?);
                }
                let settings = document.settings_or_default();
                runner
                    .presenter()
                    .show_completion(&settings.success_message, &report);
                return Ok(());
            }
            Err(SubmitError::Validation(result)) => {
                runner.presenter().show_field_errors(&result.errors);
                runner.reask(&result.failing_fields())?;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn no_generator() -> StaticCompletion {
    StaticCompletion::failing(CollaboratorError::Unavailable("generator".into()))
}

async fn run_submit(
    doc_path: &Path,
    values_path: &Path,
    config_path: Option<&Path>,
) -> CliResult<()> {
    let raw = load_raw(doc_path)?;
    let document = validate_document(&raw)?;
    let values = load_values(Some(values_path))?;
    let config = EngineConfig::load(config_path)?;

    let store = MemoryStore::new();
    store.insert(&config.store_status, raw).await;
    let engine = offline_engine(store, no_generator(), config);

    let response = engine
        .submit_request(&SubmitRequest {
            slug: document.slug().to_string(),
            values,
        })
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.is_accepted() {
        Ok(())
    } else {
        Err("submission rejected".into())
    }
}

fn run_prompt(input: &str) -> CliResult<()> {
    if input.trim().is_empty() {
        return Err(GenerationError::EmptyInput.into());
    }
    println!("{}", build_prompt(input));
    Ok(())
}

async fn run_generate(input: &str, response_path: &Path) -> CliResult<()> {
    let raw = fs::read_to_string(response_path)
        .map_err(|err| format!("failed to read {}: {}", response_path.display(), err))?;
    let engine = offline_engine(
        MemoryStore::new(),
        StaticCompletion::new(raw),
        EngineConfig::default(),
    );

    let response = engine
        .generate_request(&GenerateRequest {
            input: input.to_string(),
        })
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    match response {
        GenerateResponse::Generated { .. } => Ok(()),
        GenerateResponse::Failed { .. } => Err("generation failed".into()),
    }
}
