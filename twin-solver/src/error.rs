use thiserror::Error;

use crate::map::DoorRef;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanParseError {
    #[error("invalid door '{found}' at offset {offset}, expected 0-5")]
    InvalidDoor { offset: usize, found: char },
    #[error("invalid label '{found}' at offset {offset}, expected a digit")]
    InvalidLabel { offset: usize, found: char },
    #[error("mark opened at offset {offset} is not closed")]
    UnclosedMark { offset: usize },
    #[error("plan needs {expected} observations but {actual} were returned")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("request to exploration service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{endpoint} failed with status {status}: {body}")]
    Protocol {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("unexpected response from {endpoint}: {message}")]
    Malformed {
        endpoint: &'static str,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    PlanParse(#[from] PlanParseError),
    #[error("invalid position map: {0}")]
    InvalidMap(String),
    #[error("no room assignment replays the trace ({steps} steps)")]
    SearchExhausted { steps: usize },
    #[error("cannot bind {from:?} to room {to_room}: a slot already leads elsewhere")]
    CompletionConflict { from: DoorRef, to_room: usize },
    #[error(transparent)]
    Oracle(#[from] OracleError),
}
