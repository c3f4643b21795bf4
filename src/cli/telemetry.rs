use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Builds the filter: `RUST_LOG` wins, otherwise the verbosity level, with
/// HTTP stack noise capped.
///
/// # Errors
///
/// Returns an error if a directive fails to parse
pub fn filter(verbosity_level: Option<Level>) -> Result<EnvFilter> {
    let verbosity_level = verbosity_level.unwrap_or(Level::ERROR);

    Ok(EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("hyper_util=error".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("tokio=error".parse()?))
}

/// Initialize logging. Output goes to stderr so stdout stays free for
/// command results.
///
/// # Errors
///
/// Returns an error if subscriber initialization fails
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false);

    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(filter(verbosity_level)?);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_error() {
        temp_env::with_vars([("RUST_LOG", None::<String>)], || {
            let filter = filter(None);
            assert!(filter.is_ok());
            let rendered = filter.map(|f| f.to_string()).unwrap_or_default();
            assert!(rendered.contains("error"));
            assert!(rendered.contains("reqwest=warn"));
        });
    }

    #[test]
    fn filter_uses_verbosity_level() {
        temp_env::with_vars([("RUST_LOG", None::<String>)], || {
            let rendered = filter(Some(Level::DEBUG))
                .map(|f| f.to_string())
                .unwrap_or_default();
            assert!(rendered.contains("debug"));
        });
    }
}
