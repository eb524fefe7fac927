use anyhow::{Context, Result};

use tui_figma_overlay::internal::ui::app::App;
use tui_figma_overlay::launch::{Launch, USAGE, bootstrap_subscriber};
use tui_figma_overlay::tui;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }

    // Config and inputs are resolved before touching the terminal, logging to stderr
    let Launch {
        config,
        source,
        live,
        credential,
    } = tracing::subscriber::with_default(bootstrap_subscriber(), || Launch::prepare(&args))?;

    // While the TUI is running logs go to a rotating file; stderr would corrupt the UI.
    match tui::init() {
        Ok(terminal) => {
            let log_dir = config.logging.log_directory.as_deref().unwrap_or("logs");
            let file_appender =
                tracing_appender::rolling::daily(log_dir, "tui-figma-overlay.log");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            // RUST_LOG takes precedence over the config file
            let env_filter = match std::env::var("RUST_LOG") {
                Ok(_) => tracing_subscriber::EnvFilter::from_default_env(),
                Err(_) => tracing_subscriber::EnvFilter::new(config.logging.filter_directives()),
            };

            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .compact()
                .init();

            let mut app = App::new(config, live, source, credential);
            let res = app.run(terminal).await;

            tui::restore().context("failed to restore terminal")?;

            if let Err(err) = res {
                eprintln!("{err:?}");
            }

            Ok(())
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .init();

            eprintln!("Failed to initialize TUI: {e:?}");
            Err(e.into())
        }
    }
}
