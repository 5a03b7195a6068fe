use thiserror::Error;

use tadolocal_core::CoreError;

/// CLI-level errors: core failures plus argument validation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("host is required (--host or TADOLOCAL_HOST)")]
    MissingHost,

    #[error("invalid setting {setting:?}: expected off, auto, heat, or a temperature")]
    InvalidSetting { setting: String },

    #[error("nothing to do: pass --mode and/or --temperature")]
    EmptyHotWaterCommand,
}

impl CliError {
    /// Exit code: 2 for usage errors, 1 for runtime failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            _ => 2,
        }
    }
}
