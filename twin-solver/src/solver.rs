use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::completion::complete;
use crate::config::SolverConfig;
use crate::error::{OracleError, SolveError};
use crate::map::{Label, Map};
use crate::oracle::{Oracle, OracleValidator};
use crate::position_graph::PositionGraph;
use crate::rooms::CandidateRoomSet;
use crate::search::{ReconstructionSearch, SearchOutcome, SearchStats};
use crate::trace::{Trace, charcoal_plan};

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub correct: bool,
    pub outcome: SearchOutcome,
    pub stats: SearchStats,
    pub completion_attempts: usize,
    pub map: Map,
}

/// Drives one reconstruction: compile the trace, replay it over the doubled
/// rooms, fill the remaining doors and submit the result.
pub struct Solver<'a> {
    oracle: &'a dyn Oracle,
    config: SolverConfig,
}

impl<'a> Solver<'a> {
    pub fn new(oracle: &'a dyn Oracle, config: SolverConfig) -> Self {
        Self { oracle, config }
    }

    pub async fn solve(&self, plan: &str, observed: &[Label], map: &Map) -> Result<SolveReport, SolveError> {
        let graph = PositionGraph::from_map(map)?;
        let trace = Trace::compile(plan, observed)?;
        info!("solving {} positions with a {} step trace", graph.len(), trace.len());

        let mut rooms = CandidateRoomSet::new(&graph);
        let start = rooms.room_at(graph.starting_position(), 0);

        let mut search = ReconstructionSearch::new(&graph, &trace, &mut rooms);
        let outcome = search.run(start);
        let stats = search.stats().clone();
        if outcome == SearchOutcome::Exhausted {
            if !self.config.submit_on_exhausted {
                return Err(SolveError::SearchExhausted { steps: trace.len() });
            }
            warn!("no assignment replays the trace, completing anyway");
        }

        let mut rng = self.rng();
        let attempts = self.config.completion_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match complete(&mut rooms, &graph, &mut rng) {
                Ok(report) => {
                    info!("completion bound {} doors on attempt {}", report.binds, attempt);
                    break;
                }
                Err(err) if attempt < attempts => warn!("completion attempt {} failed: {}", attempt, err),
                Err(err) => return Err(err),
            }
        }

        let validator = OracleValidator::new(self.oracle);
        let (correct, map) = validator.validate(&rooms, &graph, start).await?;
        Ok(SolveReport {
            correct,
            outcome,
            stats,
            completion_attempts: attempt,
            map,
        })
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Selects `problem_name`, walks `doors` with random marks and solves the
    /// returned trace against `map`.
    pub async fn run(&self, problem_name: &str, doors: &str, map: &Map) -> Result<SolveReport, SolveError> {
        self.oracle.select(problem_name).await?;

        let plan = charcoal_plan(doors, &mut self.rng());
        let outcome = self.oracle.explore(std::slice::from_ref(&plan)).await?;
        info!("explored with query count {}", outcome.query_count);
        let observed = outcome.results.into_iter().next().ok_or(OracleError::Malformed {
            endpoint: "explore",
            message: "no result for the submitted plan".to_string(),
        })?;

        self.solve(&plan, &observed, map).await
    }
}
