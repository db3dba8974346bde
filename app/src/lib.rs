//! Tulia lend view service library

use std::path::PathBuf;

use anyhow::Context;
use tulia_api::AppState;
use tulia_core::{AppConfig, CONFIG_PATH_ENV};

/// Config file path from the first CLI argument, falling back to the environment
pub fn config_path(
    mut args: impl Iterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    args.next()
        .or_else(|| env(CONFIG_PATH_ENV))
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// Debug for the workspace crates, info for everything else
const LOG_DIRECTIVES: [&str; 4] = ["tulia=debug", "lending=debug", "evm_client=debug", "info"];

fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in LOG_DIRECTIVES {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("Ignoring log directive {}: {}", directive, e),
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the service
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Tulia lend view service");

    let path = config_path(std::env::args().skip(1), |key| std::env::var(key).ok());
    let config = AppConfig::load(path.as_deref()).context("Failed to load configuration")?;
    tracing::info!(
        config = ?path,
        rpc = %config.rpc.url,
        port = config.api_port,
        "Configuration loaded"
    );

    let port = config.api_port;
    let state = AppState::with_config(config);

    tulia_api::start_server(state, port)
        .await
        .context("API server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_prefers_argument() {
        let path = config_path(
            vec!["cli.json".to_string()].into_iter(),
            |_| Some("env.json".to_string()),
        );
        assert_eq!(path, Some(PathBuf::from("cli.json")));
    }

    #[test]
    fn test_config_path_falls_back_to_env() {
        let path = config_path(std::iter::empty(), |key| {
            (key == CONFIG_PATH_ENV).then(|| "env.json".to_string())
        });
        assert_eq!(path, Some(PathBuf::from("env.json")));
        assert_eq!(config_path(std::iter::empty(), |_| None), None);
    }

    #[test]
    fn test_log_directives_cover_library_crates() {
        for directive in LOG_DIRECTIVES {
            assert!(directive
                .parse::<tracing_subscriber::filter::Directive>()
                .is_ok());
        }
        for target in ["lending", "evm_client"] {
            assert!(LOG_DIRECTIVES.contains(&format!("{}=debug", target).as_str()));
        }
    }
}
