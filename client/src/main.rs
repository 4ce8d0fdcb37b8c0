//! `team-sync` entry point: load settings, connect, and run the shell.

use std::env;
use std::io::{self, BufReader, Stdin, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use team_sync::domain::ports::ConfirmPrompt;
use team_sync::inbound::shell::{Shell, ShellError, StdinConfirm};
use team_sync::outbound::supabase::SupabaseClient;
use team_sync::telemetry::init_tracing;
use team_sync::{BoardPorts, ClientSettings, ConfigError, TeamBoard};
use thiserror::Error;
use tracing::info;

/// Failures that end the process before or while the shell runs.
#[derive(Debug, Error)]
enum CliError {
    #[error("could not load settings: {0}")]
    Settings(#[from] Arc<OrthoError>),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not start runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("shell stopped: {0}")]
    Shell(#[from] ShellError),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "{err}") {
                drop(write_err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), CliError> {
    let settings = ClientSettings::load_from_iter(env::args_os())?;
    let config = settings.validate()?;
    init_tracing(config.log_format);

    let backend = Arc::new(SupabaseClient::new(config.backend)?);
    let confirm: Arc<dyn ConfirmPrompt> = Arc::new(StdinConfirm);
    let board = TeamBoard::new(BoardPorts::from_backend(&backend, confirm));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let mut shell = Shell::new(board, shell_input(), io::stdout());
    runtime.block_on(shell.run())?;
    info!("shell closed");
    Ok(())
}

/// Shell input that never buffers past the current line.
///
/// [`StdinConfirm`] answers prompts from the process-wide stdin buffer. A
/// larger private buffer here would swallow piped answers before the prompt
/// asks, and holding a [`std::io::StdinLock`] for the session would block
/// the prompt.
fn shell_input() -> BufReader<Stdin> {
    BufReader::with_capacity(1, io::stdin())
}
