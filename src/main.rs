//! Command-line interface for the nrdash binary.
//!
//! The CLI compiles dashboard configuration documents and either pushes the
//! result to New Relic (`build`), validates documents only (`lint`) or prints
//! the request bodies that would be submitted (`render`).

use std::{io, path::PathBuf, process};

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use nrdash::{
    ClientConfig, CompiledDocument, DEFAULT_BASE_URL, Error, NewRelicClient, build_payload,
    load_document, reconcile_dashboards,
};
use tracing_subscriber::EnvFilter;

/// Command line interface for compiling and publishing dashboards.
#[derive(Debug, Parser,)]
#[command(name = "nrdash", version, about = "Compile YAML dashboards and sync them with New Relic")]
struct Cli
{
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// Compile a configuration file and create or update its dashboards.
    Build(BuildArgs,),
    /// Validate configuration files without contacting New Relic.
    Lint(LintArgs,),
    /// Print the request bodies `build` would submit.
    Render(RenderArgs,),
}

#[derive(Debug, Args,)]
/// Arguments accepted by the `build` subcommand.
struct BuildArgs
{
    /// Path to the YAML configuration file describing dashboards.
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// New Relic API key.
    #[arg(long = "api-key", env = "NEW_RELIC_API_KEY", hide_env_values = true)]
    api_key: String,

    /// New Relic account id attached to every widget.
    #[arg(long = "account-id", env = "NEW_RELIC_ACCOUNT_ID")]
    account_id: u64,

    /// Root of the New Relic v2 API.
    #[arg(long = "api-url", env = "NEW_RELIC_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,
}

#[derive(Debug, Args,)]
/// Arguments accepted by the `lint` subcommand.
struct LintArgs
{
    /// Configuration files to validate.
    #[arg(value_name = "CONFIG", required = true)]
    configs: Vec<PathBuf,>,
}

#[derive(Debug, Args,)]
/// Arguments accepted by the `render` subcommand.
struct RenderArgs
{
    /// Path to the YAML configuration file describing dashboards.
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// New Relic account id attached to every widget.
    #[arg(long = "account-id", env = "NEW_RELIC_ACCOUNT_ID")]
    account_id: u64,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main(flavor = "current_thread")]
async fn main()
{
    init_tracing();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn",),);
    tracing_subscriber::fmt().with_env_filter(filter,).with_writer(io::stderr,).init();
}

/// Executes the parsed command.
///
/// # Errors
///
/// Propagates errors from document compilation, the API client and output
/// serialization.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    match cli.command {
        Command::Build(args,) => run_build(args,).await,
        Command::Lint(args,) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            run_lint(&mut handle, &args.configs,)
        }
        Command::Render(args,) => run_render(args,),
    }
}

async fn run_build(args: BuildArgs,) -> Result<(), Error,>
{
    let pb = spinner();
    pb.set_message(format!("Compiling {}...", args.config.display()),);
    let document = load_document(&args.config,)?;

    let config = ClientConfig::new(args.api_key, args.account_id,).with_base_url(args.api_url,);
    let client = NewRelicClient::new(config,);
    let synced = reconcile_dashboards(&client, &document.dashboards, &pb,).await?;

    for sync in synced {
        println!("{sync}");
    }

    Ok((),)
}

fn spinner() -> ProgressBar
{
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.yellow} [{elapsed_precise}] {msg}",)
        .unwrap_or_else(|_| ProgressStyle::default_spinner(),);
    pb.set_style(style,);
    pb
}

/// Validates every file, reporting `ok` or the error per file.
///
/// # Errors
///
/// Returns [`Error::Lint`] when at least one file fails, and I/O errors
/// raised while writing the report.
fn run_lint<W: io::Write,>(writer: &mut W, configs: &[PathBuf],) -> Result<(), Error,>
{
    let mut failed = 0;

    for path in configs {
        let status = match load_document(path,) {
            Ok(_,) => "ok".to_owned(),
            Err(error,) => {
                failed += 1;
                format!("error: {}", error.to_display_string())
            }
        };
        writeln!(writer, "{}: {status}", path.display())
            .map_err(|source| nrdash::io_error(path, source,),)?;
    }

    if failed > 0 {
        return Err(Error::Lint {
            failed,
            total: configs.len(),
        },);
    }

    Ok((),)
}

fn run_render(args: RenderArgs,) -> Result<(), Error,>
{
    let document = load_document(&args.config,)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_payloads(&mut handle, &document, args.account_id, args.pretty,)
}

fn write_payloads<W: io::Write,>(
    writer: &mut W,
    document: &CompiledDocument,
    account_id: u64,
    pretty: bool,
) -> Result<(), Error,>
{
    let payloads = document
        .dashboards
        .values()
        .map(|dashboard| build_payload(dashboard, account_id,),)
        .collect::<Result<Vec<_,>, _,>>()?;

    if pretty {
        serde_json::to_writer_pretty(writer, &payloads,)?;
    } else {
        serde_json::to_writer(writer, &payloads,)?;
    }

    Ok((),)
}
