//! Logging initialization.

use eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::LogArgs;
use crate::version;

/// Builds the filter for the given arguments.
///
/// Precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` if set, or a level derived from `-v` flags
/// 3. Apply any custom directives from `--log.filter`
pub fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.base_level()));

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
    }

    filter
}

/// Initialize logging based on command line arguments.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let layer = fmt::Layer::new().with_writer(std::io::stderr);
    let layer = if args.json {
        layer.json().boxed()
    } else {
        layer.with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(build_filter(args))
        .try_init()?;

    if !args.quiet {
        info!("Starting {}", version::NAME_VERSION);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_everything() {
        let args = LogArgs {
            quiet: true,
            verbosity: 2,
            filter: Some("dyntopo=trace".into()),
            json: false,
        };
        assert_eq!(build_filter(&args).to_string(), "error");
    }

    #[test]
    fn test_custom_directives_are_added() {
        let args = LogArgs {
            filter: Some("dyntopo_topology=trace, ,dyntopo_node_core=debug".into()),
            ..Default::default()
        };
        let rendered = build_filter(&args).to_string();
        assert!(rendered.contains("dyntopo_topology=trace"));
        assert!(rendered.contains("dyntopo_node_core=debug"));
    }
}
