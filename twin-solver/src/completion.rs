use rand::Rng;
use tracing::{debug, info};

use crate::error::SolveError;
use crate::map::{DOOR_COUNT, DoorRef};
use crate::position_graph::PositionGraph;
use crate::rooms::CandidateRoomSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionReport {
    pub unresolved_before: usize,
    pub binds: usize,
}

/// Closes every door the walk never resolved by binding it to a random copy
/// of the position it leads to. Either every door gets resolved and committed,
/// or the room set is left as it was and the conflict is returned.
pub fn complete(
    rooms: &mut CandidateRoomSet,
    graph: &PositionGraph,
    rng: &mut impl Rng,
) -> Result<CompletionReport, SolveError> {
    let unresolved_before = rooms.unresolved().len();
    info!(
        "unresolved doors: {} / {}",
        unresolved_before,
        rooms.len() * DOOR_COUNT
    );

    let checkpoint = rooms.checkpoint();
    let mut binds = 0;
    for room in 0..rooms.len() {
        for door in 0..DOOR_COUNT {
            if rooms.door(room, door).is_some() {
                continue;
            }
            let target = graph.target(rooms.position_of(room), door).room;
            let to_room = rooms.room_at(target, rng.gen_range(0..2));
            if let Err(conflict) = rooms.bind(graph, room, door, to_room) {
                debug!(?conflict, "completion conflict");
                rooms.rollback(checkpoint);
                return Err(SolveError::CompletionConflict {
                    from: DoorRef { room, door },
                    to_room,
                });
            }
            binds += 1;
        }
    }
    rooms.commit();

    Ok(CompletionReport {
        unresolved_before,
        binds,
    })
}
