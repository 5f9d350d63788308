use std::fmt;
use std::str::FromStr;

/// Message severity, ranked from most to least important.
///
/// A message logged at some level is retained iff its rank does not exceed
/// the configured ceiling: a ceiling of [`Verbosity::Info`] keeps error,
/// warning, and info messages and drops debug and trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl Verbosity {
    /// Numeric rank, 1 (error) through 5 (trace).
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Whether a message at `level` passes a ceiling of `self`.
    pub fn retains(self, level: Verbosity) -> bool {
        level <= self
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Info
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verbosity::Error => "error",
            Verbosity::Warning => "warning",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Verbosity::Error),
            "warn" | "warning" => Ok(Verbosity::Warning),
            "info" => Ok(Verbosity::Info),
            "debug" => Ok(Verbosity::Debug),
            "trace" => Ok(Verbosity::Trace),
            other => Err(format!("unknown verbosity level: {}", other)),
        }
    }
}
