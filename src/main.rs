use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use emmet_language_server::logging::init_logger;
use emmet_language_server::lsp::backend::EmmetBackend;

/// Emmet-style abbreviation expansion over the Language Server Protocol.
#[derive(Debug, Parser)]
#[command(name = "emmet-language-server", version, about)]
struct Args {
    /// Log level for stderr output (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Disable the session log file in the user cache directory
    #[arg(long)]
    no_file_log: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_log)?;

    info!(
        "Starting emmet-language-server {}",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(EmmetBackend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
