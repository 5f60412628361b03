#[derive(Debug)]
pub enum EngineError {
    /// A referenced entity does not exist; the tag names which reference.
    NotFound(&'static str),
    Validation(String),
    Capacity { requested: i64, available: i64 },
    HoursExceeded { claimed: f64, max_hours: f64 },
    Forbidden(&'static str),
    /// Unexpected internal fault. Full detail is logged, not surfaced.
    Internal(String),
}

impl EngineError {
    /// Stable code distinguishing the client-fault categories on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::Validation(_) => "validation",
            EngineError::Capacity { .. } | EngineError::HoursExceeded { .. } => "capacity",
            EngineError::Forbidden(_) => "forbidden",
            EngineError::Internal(_) => "internal",
        }
    }

    /// True for errors the caller can correct and resubmit.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, EngineError::Internal(_))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(what) => write!(f, "{what} not found"),
            EngineError::Validation(msg) => write!(f, "{msg}"),
            EngineError::Capacity { requested, available } => write!(
                f,
                "Not enough parts available: {requested} requested, {available} free"
            ),
            EngineError::HoursExceeded { claimed, max_hours } => write!(
                f,
                "Not enough hours available: {claimed} claimed of {max_hours} max"
            ),
            EngineError::Forbidden(msg) => write!(f, "forbidden: {msg}"),
            EngineError::Internal(_) => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for EngineError {}
