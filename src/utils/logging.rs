use crate::error::{other_error, ClientResult};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Only problems, so command output stays readable
pub const QUIET_FILTER: &str = "warn";
/// For long-running flows where the log is part of the output
pub const VERBOSE_FILTER: &str = "info,reqwest=warn,hyper=warn";

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_filter`. Fails if a subscriber is already set.
pub fn init(default_filter: &str) -> ClientResult<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| other_error(&format!("Failed to set up logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // Whichever call comes first in this process wins
        let _ = init(QUIET_FILTER);
        let err = init(VERBOSE_FILTER).unwrap_err();
        assert!(err.to_string().contains("Failed to set up logging"));
    }
}
