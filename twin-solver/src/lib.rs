pub mod api;
pub mod completion;
pub mod config;
pub mod error;
pub mod map;
pub mod mock_api;
pub mod oracle;
pub mod position_graph;
pub mod rooms;
pub mod search;
pub mod solver;
pub mod trace;

pub use error::{OracleError, PlanParseError, SolveError};
pub use map::{Connection, DoorRef, Label, Map};
pub use solver::{SolveReport, Solver};
