pub const DEFAULT_BASE_URL: &str = "https://31pwr5t6ij.execute-api.eu-west-2.amazonaws.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Seed for the door completion; fresh entropy when unset.
    pub seed: Option<u64>,
    /// How many times completion is retried with new randomness after a conflict.
    pub completion_attempts: usize,
    /// Submit a guess even when no assignment replays the whole trace.
    pub submit_on_exhausted: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed: None,
            completion_attempts: 8,
            submit_on_exhausted: true,
        }
    }
}

/// Connection settings for the live exploration service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub team_id: String,
}

impl ServiceConfig {
    /// Fills unset values from `API_BASE_URL` and `TEAM_ID`, falling back to
    /// the contest endpoint for the URL.
    pub fn resolve(base_url: Option<String>, team_id: Option<String>) -> Option<Self> {
        let team_id = team_id.or_else(|| std::env::var("TEAM_ID").ok())?;
        let base_url = base_url
            .or_else(|| std::env::var("API_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            team_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_win() {
        let config = ServiceConfig::resolve(
            Some("http://localhost:5000/".to_string()),
            Some("team".to_string()),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.team_id, "team");
    }

    #[test]
    fn test_default_solver_config_submits_anyway() {
        let config = SolverConfig::default();
        assert!(config.submit_on_exhausted);
        assert!(config.completion_attempts > 0);
        assert_eq!(config.seed, None);
    }
}
