use std::fmt;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Input validation failures surfaced to the caller.
///
/// Recoverable numeric conditions (ill-conditioned covariance, solver
/// anomalies, runaway balances) never abort a run; they are reported as
/// [`SimulationWarning`](crate::model::SimulationWarning) entries on the
/// result instead.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    MissingAdultProfile,
    RetirementBeforeCurrentAge {
        current_age: f64,
        retirement_age: f64,
    },
    LifeExpectancyBeforeRetirement {
        retirement_age: f64,
        life_expectancy: Option<f64>,
    },
    EmptyHorizon,
    NegativeAmount {
        field: &'static str,
        value: f64,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MissingAdultProfile => {
                write!(f, "at least one adult profile is required")
            }
            EngineError::RetirementBeforeCurrentAge {
                current_age,
                retirement_age,
            } => write!(
                f,
                "retirement age ({retirement_age}) must be greater than current age ({current_age})"
            ),
            EngineError::LifeExpectancyBeforeRetirement {
                retirement_age,
                life_expectancy,
            } => match life_expectancy {
                Some(le) => write!(
                    f,
                    "life expectancy ({le}) must be greater than retirement age ({retirement_age})"
                ),
                None => write!(f, "life expectancy is required for the retirement phase"),
            },
            EngineError::EmptyHorizon => {
                write!(f, "the simulation horizon must cover at least one month")
            }
            EngineError::NegativeAmount { field, value } => {
                write!(f, "{field} must be non-negative (got {value})")
            }
        }
    }
}

impl std::error::Error for EngineError {}
