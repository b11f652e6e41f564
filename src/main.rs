//! Polymath - multi-agent question answering from the terminal
//!
//! Reads a question (and optionally an attached file), runs it through the
//! agent graph one step at a time, and prints the final answer. Ctrl-C stops
//! the run between steps; the checkpoint can be resumed with `--resume`.

mod ingest;

use anyhow::{bail, Context};
use polymath_core::{
    config::sample_config, load_config, Execution, QuestionAnswering, RunId, SharedState,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const USAGE: &str = "\
Usage: polymath [OPTIONS] QUESTION...

Options:
  -f, --file PATH     Attach a .py, .png, .mp3, .xlsx or .csv file
      --run-id ID     Use ID for the new run
      --resume ID     Continue a checkpointed run
  -v, --verbose       Print each step and the transcript
      --sample-config Print a commented configuration template
      --serve [PORT]  Start the HTTP/WebSocket server (default port 8080)
  -h, --help          Show this help";

/// Command-line arguments
#[derive(Debug, Default)]
struct Args {
    /// Question words, joined with spaces
    question: Vec<String>,
    /// File to attach
    file: Option<PathBuf>,
    run_id: Option<String>,
    resume: Option<String>,
    verbose: bool,
    sample_config: bool,
    serve: Option<u16>,
    help: bool,
}

impl Args {
    /// Parse command-line arguments
    fn parse() -> anyhow::Result<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter().peekable();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" | "-f" => {
                    parsed.file = Some(PathBuf::from(args.next().context("--file needs a path")?));
                }
                "--run-id" => {
                    parsed.run_id = Some(args.next().context("--run-id needs an ID")?);
                }
                "--resume" => {
                    parsed.resume = Some(args.next().context("--resume needs a run ID")?);
                }
                "--verbose" | "-v" => parsed.verbose = true,
                "--sample-config" => parsed.sample_config = true,
                "--serve" => {
                    let port = match args.peek().and_then(|p| p.parse().ok()) {
                        Some(port) => {
                            args.next();
                            port
                        }
                        None => 8080,
                    };
                    parsed.serve = Some(port);
                }
                "--help" | "-h" => parsed.help = true,
                "--" => parsed.question.extend(args.by_ref()),
                _ if arg.starts_with('-') => bail!("unknown option '{}'\n\n{}", arg, USAGE),
                _ => parsed.question.push(arg),
            }
        }

        Ok(parsed)
    }

    fn question(&self) -> String {
        self.question.join(" ")
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "polymath=debug,polymath_core=debug"
    } else {
        "polymath=warn,polymath_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse()?;

    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }
    if args.sample_config {
        print!("{}", sample_config());
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd).context("failed to load configuration")?;

    if let Some(port) = args.serve {
        return serve(&config, port);
    }

    init_tracing(args.verbose);

    let service = QuestionAnswering::from_config(&config)?;
    let execution = start(&service, &args)?;
    let run_id = execution.run_id();

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || cancelled.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let state = drive(execution, &cancelled, args.verbose)?;

    if args.verbose {
        eprintln!("{}", state.transcript());
    }
    println!("{}", state.final_answer());
    tracing::info!(run_id = %run_id, "run finished");

    Ok(())
}

/// Build the execution for a new or resumed run
fn start<'a>(service: &'a QuestionAnswering, args: &Args) -> anyhow::Result<Execution<'a>> {
    let orchestrator = service.orchestrator();

    if let Some(id) = &args.resume {
        let run_id = id
            .parse::<RunId>()
            .with_context(|| format!("invalid run ID '{}'", id))?;
        return Ok(orchestrator.resume(run_id)?);
    }

    let question = args.question();
    if question.trim().is_empty() {
        bail!("no question given\n\n{}", USAGE);
    }

    let state = match &args.file {
        Some(path) => {
            let attachment = ingest::ingest(path)
                .with_context(|| format!("cannot attach {}", path.display()))?;
            SharedState::with_attachment(&question, &attachment)
        }
        None => SharedState::new(&question),
    };

    let run_id = match &args.run_id {
        Some(id) => id
            .parse::<RunId>()
            .with_context(|| format!("invalid run ID '{}'", id))?,
        None => RunId::new(),
    };

    Ok(orchestrator.start_with_id(run_id, state)?)
}

/// Step the run to the end, stopping early on Ctrl-C
fn drive(
    mut execution: Execution<'_>,
    cancelled: &AtomicBool,
    verbose: bool,
) -> anyhow::Result<SharedState> {
    let run_id = execution.run_id();

    loop {
        if cancelled.load(Ordering::SeqCst) {
            bail!("cancelled; continue with: polymath --resume {}", run_id);
        }

        match execution.step() {
            Ok(Some(record)) => {
                if verbose {
                    eprintln!("[{}] {} -> {}", record.step, record.role, record.next);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "run failed");
                bail!("{}; continue with: polymath --resume {}", e, run_id);
            }
        }
    }

    Ok(execution.into_state())
}

#[cfg(feature = "web")]
fn serve(config: &polymath_core::PolymathConfig, port: u16) -> anyhow::Result<()> {
    polymath_server::init_tracing();
    let state = polymath_server::AppState::from_config(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(polymath_server::serve(state, port))
}

#[cfg(not(feature = "web"))]
fn serve(_config: &polymath_core::PolymathConfig, _port: u16) -> anyhow::Result<()> {
    bail!("this build has no web server; rebuild with --features web")
}
