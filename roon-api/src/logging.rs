use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Without it, the service
/// crates log at `config.level` and `tower_http` request traces at `debug`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::registry().with(build_env_filter(config));

    if config.json {
        subscriber
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init()?;
    } else {
        subscriber.with(fmt::layer().compact()).try_init()?;
    }
    Ok(())
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "roon_api={level},roon_search={level},tower_http=debug,sqlx=warn",
            level = config.level
        ))
    })
}
