use async_trait::async_trait;
use tracing::info;

use crate::error::OracleError;
use crate::map::{Connection, DOOR_COUNT, DoorRef, Label, Map};
use crate::position_graph::PositionGraph;
use crate::rooms::{CandidateRoomSet, RoomId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreOutcome {
    pub results: Vec<Vec<Label>>,
    pub query_count: u32,
}

/// The exploration service as seen by the solver.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn select(&self, problem_name: &str) -> Result<(), OracleError>;
    async fn explore(&self, plans: &[String]) -> Result<ExploreOutcome, OracleError>;
    async fn guess(&self, map: &Map) -> Result<bool, OracleError>;
}

pub struct OracleValidator<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> OracleValidator<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Flattens every virtual room into the guess shape. Each room reports the
    /// label of its position; each door pair is listed once, from the lower
    /// room (or lower door on the same room). Unresolved doors are omitted.
    pub fn submission_map(rooms: &CandidateRoomSet, graph: &PositionGraph, start: RoomId) -> Map {
        let labels = (0..rooms.len())
            .map(|room| graph.label(rooms.position_of(room)))
            .collect();

        let mut connections = Vec::new();
        for room in 0..rooms.len() {
            for door in 0..DOOR_COUNT {
                let Some(peer) = rooms.door(room, door) else {
                    continue;
                };
                if peer.room > room || (peer.room == room && peer.door >= door) {
                    connections.push(Connection {
                        from: DoorRef { room, door },
                        to: peer,
                    });
                }
            }
        }

        Map {
            rooms: labels,
            starting_room: start,
            connections,
        }
    }

    pub async fn validate(
        &self,
        rooms: &CandidateRoomSet,
        graph: &PositionGraph,
        start: RoomId,
    ) -> Result<(bool, Map), OracleError> {
        let map = Self::submission_map(rooms, graph, start);
        info!(
            "guessing {} rooms, {} connections, starting at room {}",
            map.rooms.len(),
            map.connections.len(),
            start
        );
        let correct = self.oracle.guess(&map).await?;
        Ok((correct, map))
    }
}
