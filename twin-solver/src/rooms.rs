use crate::map::{DOOR_COUNT, DoorRef, Label};
use crate::position_graph::PositionGraph;

pub type RoomId = usize;

/// Label knowledge for one position: either both copies read the same value
/// or each copy has its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRegister {
    Shared(Label),
    Split([Label; 2]),
}

impl LabelRegister {
    pub fn get(&self, copy: usize) -> Label {
        match *self {
            LabelRegister::Shared(label) => label,
            LabelRegister::Split(labels) => labels[copy],
        }
    }

    fn with(self, copy: usize, value: Label) -> Self {
        let mut labels = match self {
            LabelRegister::Shared(label) => [label; 2],
            LabelRegister::Split(labels) => labels,
        };
        labels[copy] = value;
        if labels[0] == labels[1] {
            LabelRegister::Shared(labels[0])
        } else {
            LabelRegister::Split(labels)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Undo {
    Door(DoorRef),
    Label { position: usize, previous: LabelRegister },
    Visit(usize),
}

/// Position in the undo log. Rolling back to it reverts every mutation made
/// after it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// A door slot that already leads somewhere other than the bind asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindConflict {
    pub slot: DoorRef,
    pub existing: DoorRef,
    pub wanted: DoorRef,
}

/// The 2N virtual rooms: copy `c` of position `p` is room `c * N + p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRoomSet {
    positions: usize,
    doors: Vec<[Option<DoorRef>; DOOR_COUNT]>,
    labels: Vec<LabelRegister>,
    visits: Vec<u32>,
    log: Vec<Undo>,
}

impl CandidateRoomSet {
    pub fn new(graph: &PositionGraph) -> Self {
        let positions = graph.len();
        Self {
            positions,
            doors: vec![[None; DOOR_COUNT]; 2 * positions],
            labels: (0..positions).map(|p| LabelRegister::Shared(graph.label(p))).collect(),
            visits: vec![0; positions],
            log: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.doors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    pub fn position_of(&self, room: RoomId) -> usize {
        room % self.positions
    }

    pub fn copy_of(&self, room: RoomId) -> usize {
        room / self.positions
    }

    pub fn room_at(&self, position: usize, copy: usize) -> RoomId {
        copy * self.positions + position
    }

    pub fn twin(&self, room: RoomId) -> RoomId {
        (room + self.positions) % self.len()
    }

    pub fn register(&self, position: usize) -> LabelRegister {
        self.labels[position]
    }

    pub fn label(&self, room: RoomId) -> Label {
        self.labels[self.position_of(room)].get(self.copy_of(room))
    }

    pub fn set_label(&mut self, room: RoomId, value: Label) {
        let position = self.position_of(room);
        let previous = self.labels[position];
        let next = previous.with(self.copy_of(room), value);
        if next != previous {
            self.log.push(Undo::Label { position, previous });
            self.labels[position] = next;
        }
    }

    /// The copy at `position` currently reading `label`, when the copies are
    /// told apart by their labels and exactly one matches.
    pub fn find_by_label(&self, position: usize, label: Label) -> Option<RoomId> {
        match self.labels[position] {
            LabelRegister::Shared(_) => None,
            LabelRegister::Split(labels) => labels
                .iter()
                .position(|&l| l == label)
                .map(|copy| self.room_at(position, copy)),
        }
    }

    pub fn visits(&self, position: usize) -> u32 {
        self.visits[position]
    }

    pub fn enter(&mut self, position: usize) {
        self.visits[position] += 1;
        self.log.push(Undo::Visit(position));
    }

    pub fn door(&self, room: RoomId, door: usize) -> Option<DoorRef> {
        self.doors[room][door]
    }

    /// Resolves `from_room`'s door toward `to_room` in both directions, and the
    /// same door of the twin toward `to_room`'s twin. A slot already holding the
    /// wanted target is left alone. On conflict every slot set by this call is
    /// cleared again.
    pub fn bind(
        &mut self,
        graph: &PositionGraph,
        from_room: RoomId,
        from_door: usize,
        to_room: RoomId,
    ) -> Result<(), BindConflict> {
        let to_door = graph.target(self.position_of(from_room), from_door).door;
        debug_assert_eq!(
            graph.target(self.position_of(from_room), from_door).room,
            self.position_of(to_room)
        );

        let from_twin = self.twin(from_room);
        let to_twin = self.twin(to_room);
        let links = [
            (from_room, from_door, to_room, to_door),
            (to_room, to_door, from_room, from_door),
            (from_twin, from_door, to_twin, to_door),
            (to_twin, to_door, from_twin, from_door),
        ];

        let checkpoint = self.checkpoint();
        for (room, door, peer_room, peer_door) in links {
            let slot = DoorRef { room, door };
            let wanted = DoorRef { room: peer_room, door: peer_door };
            match self.doors[room][door] {
                Some(existing) if existing == wanted => {}
                Some(existing) => {
                    self.rollback(checkpoint);
                    return Err(BindConflict { slot, existing, wanted });
                }
                None => {
                    self.doors[room][door] = Some(wanted);
                    self.log.push(Undo::Door(slot));
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_door_unchecked(&mut self, slot: DoorRef, peer: DoorRef) {
        self.doors[slot.room][slot.door] = Some(peer);
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.log.len())
    }

    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.log.len() > checkpoint.0 {
            let Some(entry) = self.log.pop() else { break };
            match entry {
                Undo::Door(slot) => self.doors[slot.room][slot.door] = None,
                Undo::Label { position, previous } => self.labels[position] = previous,
                Undo::Visit(position) => self.visits[position] -= 1,
            }
        }
    }

    /// Keeps every mutation made so far; they can no longer be rolled back.
    pub fn commit(&mut self) {
        self.log.clear();
    }

    /// Number of uncommitted mutations.
    pub fn pending(&self) -> usize {
        self.log.len()
    }

    /// Restores the initial label registers and clears visit counters while
    /// keeping resolved doors.
    pub fn reset_labels(&mut self, graph: &PositionGraph) {
        self.labels = (0..self.positions).map(|p| LabelRegister::Shared(graph.label(p))).collect();
        self.visits.iter_mut().for_each(|v| *v = 0);
        self.log.clear();
    }

    pub fn unresolved(&self) -> Vec<DoorRef> {
        self.doors
            .iter()
            .enumerate()
            .flat_map(|(room, slots)| {
                slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.is_none())
                    .map(move |(door, _)| DoorRef { room, door })
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.doors.iter().all(|slots| slots.iter().all(Option::is_some))
    }

    /// Every resolved slot is mirrored by its peer.
    pub fn is_symmetric(&self) -> bool {
        self.doors.iter().enumerate().all(|(room, slots)| {
            slots.iter().enumerate().all(|(door, slot)| match slot {
                Some(peer) => self.doors[peer.room][peer.door] == Some(DoorRef { room, door }),
                None => true,
            })
        })
    }
}
