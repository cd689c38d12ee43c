//! Parley CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use parley::cli::{commands, repl, Cli, Commands};
use parley::context::SessionContext;
use parley::runner::RunOptions;
use parley::session::ChatSession;
use parley::trace::TraceSink;
use parley::ui::ConsoleUi;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parley=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let store = Arc::new(cli.open_config());
    let ctx = SessionContext::new(store.clone());

    let result = match cli.command {
        Commands::Chat(args) => {
            let ctx = ctx
                .with_ui(Arc::new(ConsoleUi::default()))
                .with_tracer(Arc::new(TraceSink::new(args.trace_file)));
            let session = ChatSession::new(ctx)
                .with_options(RunOptions::builder().max_turns(args.max_turns).build());
            repl::run(session).await
        }
        Commands::Config(args) => commands::handle_config(&store, args.command),
        Commands::Models(args) => commands::handle_models(&ctx, args.tool_capable).await,
        Commands::Check => commands::handle_check(&ctx).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
