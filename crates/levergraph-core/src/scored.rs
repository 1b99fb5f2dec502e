use serde::{Deserialize, Serialize};

/// Outcome of a computation that may fall back to a neutral value.
///
/// Centrality and clustering never abort a pipeline: when the input is
/// pathological they yield `Degenerate` carrying all-zero scores. Callers
/// report those terms as zero-leverage, not as unknown.
#[derive(Debug, Clone, PartialEq)]
pub enum Scored<T> {
    Computed(T),
    Degenerate { reason: String, fallback: T },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOutcome {
    #[default]
    Computed,
    Degenerate,
}

impl<T> Scored<T> {
    pub fn degenerate(reason: impl Into<String>, fallback: T) -> Self {
        Scored::Degenerate {
            reason: reason.into(),
            fallback,
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Scored::Computed(v) => v,
            Scored::Degenerate { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Scored::Computed(v) => v,
            Scored::Degenerate { fallback, .. } => fallback,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Scored::Degenerate { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Scored::Computed(_) => None,
            Scored::Degenerate { reason, .. } => Some(reason),
        }
    }

    pub fn outcome(&self) -> ScoreOutcome {
        match self {
            Scored::Computed(_) => ScoreOutcome::Computed,
            Scored::Degenerate { .. } => ScoreOutcome::Degenerate,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Scored<U> {
        match self {
            Scored::Computed(v) => Scored::Computed(f(v)),
            Scored::Degenerate { reason, fallback } => Scored::Degenerate {
                reason,
                fallback: f(fallback),
            },
        }
    }
}
