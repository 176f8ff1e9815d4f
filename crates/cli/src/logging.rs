//! Log subscriber installation.
//!
//! The subscriber is installed once, before any component starts. Components
//! never touch logging state afterwards; they only emit events inside their
//! own spans.

use anyhow::anyhow;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Build the filter for the configured level. `RUST_LOG` wins when set,
/// except that `disabled` always turns logging off.
pub fn filter(level: LevelFilter, disabled: bool) -> EnvFilter {
    if disabled {
        return EnvFilter::new("off");
    }
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

pub fn init(level: LevelFilter, disabled: bool) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level, disabled))
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
