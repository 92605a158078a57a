use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid parameter {field}: {message}")]
    InvalidParameter { field: &'static str, message: String },

    #[error("invalid mortgage term: {term_months} months on a principal of {principal}")]
    InvalidTerm { term_months: u32, principal: f64 },
}

impl SimulationError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        SimulationError::InvalidParameter {
            field,
            message: message.into(),
        }
    }

    /// Name of the offending input, if the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SimulationError::InvalidParameter { field, .. } => Some(*field),
            SimulationError::InvalidTerm { .. } => None,
        }
    }
}
