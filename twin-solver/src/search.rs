use tracing::{debug, info, trace};

use crate::position_graph::PositionGraph;
use crate::rooms::{CandidateRoomSet, RoomId};
use crate::trace::{Step, Trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found,
    Exhausted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub replayed: u64,
    pub label_prunes: u64,
    pub conflicts: u64,
    pub rollbacks: u64,
}

/// Depth-first replay of a trace over the candidate rooms. Each step is bound
/// to one virtual room; a label mismatch or a door conflict prunes the branch
/// and everything it changed is rolled back.
pub struct ReconstructionSearch<'a> {
    graph: &'a PositionGraph,
    trace: &'a Trace,
    rooms: &'a mut CandidateRoomSet,
    path: Vec<RoomId>,
    stats: SearchStats,
}

impl<'a> ReconstructionSearch<'a> {
    pub fn new(graph: &'a PositionGraph, trace: &'a Trace, rooms: &'a mut CandidateRoomSet) -> Self {
        Self {
            graph,
            trace,
            rooms,
            path: Vec::with_capacity(trace.len()),
            stats: SearchStats::default(),
        }
    }

    /// Replays the whole trace from `start`. On success every binding is kept;
    /// otherwise the room set is left exactly as it was.
    pub fn run(&mut self, start: RoomId) -> SearchOutcome {
        let checkpoint = self.rooms.checkpoint();
        self.path.clear();
        let position = self.rooms.position_of(start);
        self.rooms.enter(position);

        let outcome = if self.attempt(start, 0) {
            self.rooms.commit();
            SearchOutcome::Found
        } else {
            self.rooms.rollback(checkpoint);
            SearchOutcome::Exhausted
        };
        info!(
            "search {:?} over {} steps: {} nodes, {} replayed, {} label prunes, {} conflicts, {} rollbacks",
            outcome,
            self.trace.len(),
            self.stats.nodes,
            self.stats.replayed,
            self.stats.label_prunes,
            self.stats.conflicts,
            self.stats.rollbacks
        );
        outcome
    }

    pub fn attempt(&mut self, from: RoomId, depth: usize) -> bool {
        let Some(&step) = self.trace.get(depth) else {
            return true;
        };
        self.stats.nodes += 1;

        let Some(door) = step.door else {
            return self.try_room(from, None, from, step, depth);
        };

        let target = self.graph.target(self.rooms.position_of(from), door).room;
        let candidates = self.candidates(from, door, target, &step);
        debug!(depth, from, door, target, ?candidates, "candidates");

        for room in candidates {
            if self.try_room(from, Some(door), room, step, depth) {
                return true;
            }
        }
        false
    }

    fn candidates(&mut self, from: RoomId, door: usize, target: usize, step: &Step) -> Vec<RoomId> {
        if let Some(bound) = self.rooms.door(from, door) {
            self.stats.replayed += 1;
            return vec![bound.room];
        }
        if self.rooms.visits(target) == 0 {
            return vec![self.rooms.room_at(target, 0)];
        }
        if let Some(room) = self.rooms.find_by_label(target, step.expected_label) {
            return vec![room];
        }
        vec![self.rooms.room_at(target, 0), self.rooms.room_at(target, 1)]
    }

    fn try_room(&mut self, from: RoomId, door: Option<usize>, room: RoomId, step: Step, depth: usize) -> bool {
        let actual = self.rooms.label(room);
        if actual != step.expected_label {
            trace!(depth, room, actual, expected = step.expected_label, "label mismatch");
            self.stats.label_prunes += 1;
            return false;
        }

        let checkpoint = self.rooms.checkpoint();
        self.rooms.set_label(room, step.next_label);
        if let Some(door) = door {
            if let Err(conflict) = self.rooms.bind(self.graph, from, door, room) {
                trace!(depth, ?conflict, "connection conflict");
                self.stats.conflicts += 1;
                self.rooms.rollback(checkpoint);
                return false;
            }
            let position = self.rooms.position_of(room);
            self.rooms.enter(position);
        }

        let bound = self.path.len();
        self.path.push(room);
        if self.attempt(room, depth + 1) {
            return true;
        }
        self.path.truncate(bound);
        self.rooms.rollback(checkpoint);
        self.stats.rollbacks += 1;
        false
    }

    /// Room bound at every depth of the last successful run.
    pub fn path(&self) -> &[RoomId] {
        &self.path
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{DOOR_COUNT, DoorRef, Map};
    use crate::mock_api::{double_cover, random_position_map, walk};
    use crate::position_graph::tests::two_position_map;
    use crate::rooms::LabelRegister;
    use crate::trace::charcoal_plan;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn graph_of(map: &Map) -> PositionGraph {
        PositionGraph::from_map(map).unwrap()
    }

    fn random_doors(len: usize, rng: &mut StdRng) -> String {
        (0..len).map(|_| char::from(b'0' + rng.gen_range(0..6u8))).collect()
    }

    #[test]
    fn test_two_position_walk_claims_fresh_copy() {
        let graph = graph_of(&two_position_map([5, 0]));
        let mut rooms = CandidateRoomSet::new(&graph);
        // Start reads 5, gets marked 9, door 1 leads to position 1 which reads 0
        // and gets marked 9 as well.
        let trace = Trace::compile("[9]1[9]", &[5, 9, 0, 9]).unwrap();

        let mut search = ReconstructionSearch::new(&graph, &trace, &mut rooms);
        assert_eq!(search.run(0), SearchOutcome::Found);
        assert_eq!(search.path(), &[0, 1]);
        assert_eq!(search.stats().rollbacks, 0);
        assert_eq!(search.stats().label_prunes, 0);

        assert_eq!(rooms.door(0, 1), Some(DoorRef { room: 1, door: 1 }));
        assert_eq!(rooms.door(1, 1), Some(DoorRef { room: 0, door: 1 }));
        assert_eq!(rooms.door(2, 1), Some(DoorRef { room: 3, door: 1 }));
        assert_eq!(rooms.door(3, 1), Some(DoorRef { room: 2, door: 1 }));
        assert_eq!(rooms.register(0), LabelRegister::Split([9, 5]));
        assert_eq!(rooms.register(1), LabelRegister::Split([9, 0]));
        assert!(rooms.is_symmetric());
        assert_eq!(rooms.pending(), 0);
    }

    #[test]
    fn test_backtracks_to_second_copy() {
        let graph = graph_of(&two_position_map([0, 0]));
        let mut rooms = CandidateRoomSet::new(&graph);
        // Out through door 1 marking position 1, back through door 2, out through
        // door 1 again and position 1 reads unmarked. Copy 0 of position 0 would
        // lead back to the marked room, so the return has to land on its twin.
        let trace = Trace::compile("[0]1[1]2[0]1", &[0, 0, 0, 1, 0, 0, 0]).unwrap();

        let mut search = ReconstructionSearch::new(&graph, &trace, &mut rooms);
        assert_eq!(search.run(0), SearchOutcome::Found);
        let path = search.path().to_vec();
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], 0);
        assert_eq!(rooms.position_of(path[1]), 1);
        assert_eq!(rooms.position_of(path[3]), 1);
        assert_ne!(path[1], path[3]);
        assert_eq!(path[2], 2);
        assert!(rooms.is_symmetric());
    }

    #[test]
    fn test_exhausted_search_restores_state() {
        let graph = graph_of(&two_position_map([0, 0]));
        let mut rooms = CandidateRoomSet::new(&graph);
        let before = rooms.clone();
        // Position 1 is entered and marked 3, then door 3 loops to itself and
        // claims to read 2: no copy can produce that.
        let trace = Trace::compile("[0]1[3]3", &[0, 0, 0, 3, 2]).unwrap();

        let mut search = ReconstructionSearch::new(&graph, &trace, &mut rooms);
        assert_eq!(search.run(0), SearchOutcome::Exhausted);
        assert!(search.stats().label_prunes > 0);
        assert_eq!(rooms, before);
    }

    #[test]
    fn test_start_label_mismatch_is_exhausted() {
        let graph = graph_of(&two_position_map([1, 0]));
        let mut rooms = CandidateRoomSet::new(&graph);
        let before = rooms.clone();
        let trace = Trace::compile("0", &[2, 0]).unwrap();

        let mut search = ReconstructionSearch::new(&graph, &trace, &mut rooms);
        assert_eq!(search.run(0), SearchOutcome::Exhausted);
        assert_eq!(rooms, before);
    }

    #[test]
    fn test_failed_attempt_is_exact_rollback() {
        let graph = graph_of(&two_position_map([0, 0]));
        let mut rooms = CandidateRoomSet::new(&graph);
        rooms.enter(0);
        rooms.bind(&graph, 0, 2, 1).unwrap();
        rooms.set_label(1, 2);
        rooms.enter(1);
        let before = rooms.clone();

        // The bound door is replayed and marks position 1, then its self loop
        // claims a label neither copy carries.
        let trace = Trace::compile("2[1]3", &[0, 2, 1, 3]).unwrap();
        let mut search = ReconstructionSearch::new(&graph, &trace, &mut rooms);
        assert!(!search.attempt(0, 1));
        assert_eq!(rooms, before);
    }

    #[test]
    fn test_random_double_cover_traces_are_replayed() {
        let mut rng = StdRng::seed_from_u64(2025);
        for _ in 0..20 {
            let n = rng.gen_range(2..7);
            let map = random_position_map(n, &mut rng);
            let hidden = double_cover(&map, &mut rng);
            let doors = random_doors(12 * n, &mut rng);
            let plan = charcoal_plan(&doors, &mut rng);
            let observed = walk(&hidden, &plan).unwrap();

            let graph = graph_of(&map);
            let trace = Trace::compile(&plan, &observed).unwrap();
            let mut rooms = CandidateRoomSet::new(&graph);
            let start = rooms.room_at(graph.starting_position(), 0);
            let mut search = ReconstructionSearch::new(&graph, &trace, &mut rooms);
            assert_eq!(search.run(start), SearchOutcome::Found);
            let path = search.path().to_vec();
            assert!(rooms.is_symmetric());

            // Replaying the path with fresh registers meets every expected label.
            let mut replay = CandidateRoomSet::new(&graph);
            for (room, step) in path.iter().zip(trace.steps()) {
                assert_eq!(replay.label(*room), step.expected_label);
                replay.set_label(*room, step.next_label);
            }

            // A second run over the resolved graph only follows existing doors.
            let resolved = rooms.clone();
            rooms.reset_labels(&graph);
            let mut again = ReconstructionSearch::new(&graph, &trace, &mut rooms);
            assert_eq!(again.run(start), SearchOutcome::Found);
            assert_eq!(again.path(), path.as_slice());
            assert_eq!(again.stats().replayed, (trace.len() - 1) as u64);
            assert_eq!(again.stats().rollbacks, 0);
            for room in 0..rooms.len() {
                for door in 0..DOOR_COUNT {
                    assert_eq!(rooms.door(room, door), resolved.door(room, door));
                }
            }
        }
    }
}
