use crate::error::SolveError;
use crate::map::{DOOR_COUNT, DoorRef, Label, Map};

/// Known door-level adjacency between positions. Built once from the map
/// description and never changed during a solve.
#[derive(Debug, Clone)]
pub struct PositionGraph {
    labels: Vec<Label>,
    doors: Vec<[DoorRef; DOOR_COUNT]>,
    starting_position: usize,
}

impl PositionGraph {
    pub fn from_map(map: &Map) -> Result<Self, SolveError> {
        let n = map.rooms.len();
        if n == 0 {
            return Err(SolveError::InvalidMap("map has no rooms".to_string()));
        }
        if map.starting_room >= n {
            return Err(SolveError::InvalidMap(format!(
                "starting room {} out of range for {} rooms",
                map.starting_room, n
            )));
        }

        let mut slots: Vec<[Option<DoorRef>; DOOR_COUNT]> = vec![[None; DOOR_COUNT]; n];
        let mut claim = |at: DoorRef, peer: DoorRef| -> Result<(), SolveError> {
            match slots[at.room][at.door] {
                Some(existing) if existing != peer => Err(SolveError::InvalidMap(format!(
                    "room {} door {} connected to both {}:{} and {}:{}",
                    at.room, at.door, existing.room, existing.door, peer.room, peer.door
                ))),
                _ => {
                    slots[at.room][at.door] = Some(peer);
                    Ok(())
                }
            }
        };

        for conn in &map.connections {
            for end in [conn.from, conn.to] {
                if end.room >= n || end.door >= DOOR_COUNT {
                    return Err(SolveError::InvalidMap(format!(
                        "connection end {}:{} out of range",
                        end.room, end.door
                    )));
                }
            }
            claim(conn.from, conn.to)?;
            claim(conn.to, conn.from)?;
        }

        let mut doors = Vec::with_capacity(n);
        for (position, row) in slots.into_iter().enumerate() {
            let mut filled = [DoorRef { room: 0, door: 0 }; DOOR_COUNT];
            for (door, slot) in row.into_iter().enumerate() {
                filled[door] = slot.ok_or_else(|| {
                    SolveError::InvalidMap(format!("room {} door {} is not connected", position, door))
                })?;
            }
            doors.push(filled);
        }

        Ok(Self {
            labels: map.rooms.clone(),
            doors,
            starting_position: map.starting_room,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn target(&self, position: usize, door: usize) -> DoorRef {
        self.doors[position][door]
    }

    pub fn label(&self, position: usize) -> Label {
        self.labels[position]
    }

    pub fn starting_position(&self) -> usize {
        self.starting_position
    }
}
