//! Startup inputs, gathered before the terminal is taken over.

use anyhow::Result;
use image::RgbaImage;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ReferenceConfig};
use crate::internal::live::{DEMO_FRAME_HEIGHT, DEMO_FRAME_WIDTH, demo_frame, load_live_frame};
use crate::internal::models::ReferenceSource;

pub const USAGE: &str = "usage: tui-figma-overlay [REFERENCE] [LIVE_IMAGE]

REFERENCE is a design share link, node:<file-id>/<node-id>, or an image file.
LIVE_IMAGE is a screenshot of the view under test; a gradient is used when omitted.";

/// Everything the overlay needs to start.
pub struct Launch {
    pub config: AppConfig,
    pub source: ReferenceSource,
    pub live: RgbaImage,
    pub credential: String,
}

impl Launch {
    /// Load the config file, then apply `args` (`[REFERENCE] [LIVE_IMAGE]`) over it.
    pub fn prepare(args: &[String]) -> Result<Self> {
        Self::from_config(AppConfig::load(), args)
    }

    pub fn from_config(mut config: AppConfig, args: &[String]) -> Result<Self> {
        if let Some(reference) = args.first() {
            config.overlay.reference = Some(ReferenceConfig::from_arg(reference));
        }
        if let Some(live) = args.get(1) {
            config.overlay.live_image = Some(live.clone());
        }

        let source = match &config.overlay.reference {
            Some(reference) => reference.to_source()?,
            None => anyhow::bail!("no reference configured\n\n{USAGE}"),
        };
        let live = match &config.overlay.live_image {
            Some(path) => load_live_frame(Path::new(path))?,
            None => demo_frame(DEMO_FRAME_WIDTH, DEMO_FRAME_HEIGHT),
        };
        let credential = config.network.access_token();

        tracing::info!(%source, "Launch inputs ready");
        Ok(Self {
            config,
            source,
            live,
            credential,
        })
    }
}

/// Stderr logging for the phase before the TUI installs its file logger.
///
/// Defaults to warnings and errors; `RUST_LOG` overrides.
pub fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_startup_warnings_reach_subscriber() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut config = AppConfig::default();
        config.network.token_env = "TUI_FIGMA_OVERLAY_UNSET_TEST_TOKEN".to_string();
        let args = vec!["node:abc/1-2".to_string()];

        let launch = tracing::subscriber::with_default(subscriber, || {
            Launch::from_config(config, &args)
        })
        .unwrap();

        assert_eq!(launch.credential, "");
        assert_eq!(launch.live.dimensions(), (DEMO_FRAME_WIDTH, DEMO_FRAME_HEIGHT));
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("TUI_FIGMA_OVERLAY_UNSET_TEST_TOKEN is not set"));
    }

    #[test]
    fn test_missing_reference_is_an_error() {
        let err = Launch::from_config(AppConfig::default(), &[]).err().unwrap();
        assert!(err.to_string().contains("no reference configured"));
    }

    #[test]
    fn test_args_override_config() {
        let mut config = AppConfig::default();
        config.overlay.reference = Some(ReferenceConfig::Node("old".into(), "1-1".into()));
        let launch =
            Launch::from_config(config, &["https://www.figma.com/file/F/n?node-id=2-3".into()])
                .unwrap();
        assert!(matches!(launch.source, ReferenceSource::RemoteUrl(_)));
    }
}
