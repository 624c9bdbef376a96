//! Work-type identifiers
//!
//! A work type names the kind of server-side computation behind a task
//! slot. It appears as a URL segment in the task-check and task-kill
//! endpoints (`/api/task/{project}/type/{work_type}`).

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of server-side computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkType {
    /// Automatic calibration of a parameter set
    Autofit,
    /// Budget optimization run
    Optimization,
    /// Budget-outcome-curve calculation for one portfolio project,
    /// scoped to a GA optimization
    BocCalculation(Uuid),
    /// Full genetic-algorithm optimization across a portfolio
    PortfolioGa(Uuid),
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Autofit => write!(f, "autofit"),
            Self::Optimization => write!(f, "optimization"),
            Self::BocCalculation(gaoptim_id) => write!(f, "gaoptim-{}", gaoptim_id),
            Self::PortfolioGa(gaoptim_id) => write!(f, "portfolio-{}", gaoptim_id),
        }
    }
}

impl FromStr for WorkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "autofit" {
            return Ok(Self::Autofit);
        }
        if s == "optimization" {
            return Ok(Self::Optimization);
        }
        if let Some(id) = s.strip_prefix("gaoptim-") {
            let id = Uuid::parse_str(id).map_err(|e| format!("bad gaoptim id in '{}': {}", s, e))?;
            return Ok(Self::BocCalculation(id));
        }
        if let Some(id) = s.strip_prefix("portfolio-") {
            let id =
                Uuid::parse_str(id).map_err(|e| format!("bad portfolio id in '{}': {}", s, e))?;
            return Ok(Self::PortfolioGa(id));
        }
        Err(format!("unknown work type: {}", s))
    }
}
