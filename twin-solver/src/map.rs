use serde::{Deserialize, Serialize};

pub const DOOR_COUNT: usize = 6;

/// Room label as reported by the exploration service (two bits in practice).
pub type Label = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorRef {
    pub room: usize,
    pub door: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: DoorRef,
    pub to: DoorRef,
}

/// Map in the shape the service speaks: labels per room, the starting room
/// and an undirected list of door-to-door connections.
///
/// The same shape describes the known position graph that feeds a solve and
/// the reconstructed room graph submitted to `/guess`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub rooms: Vec<Label>,
    #[serde(rename = "startingRoom")]
    pub starting_room: usize,
    pub connections: Vec<Connection>,
}

impl Map {
    /// Number of door ends the connection list occupies. A door wired to
    /// itself counts once.
    pub fn ports_used(&self) -> usize {
        self.connections
            .iter()
            .map(|c| if c.from == c.to { 1 } else { 2 })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_uses_service_field_names() {
        let map = Map {
            rooms: vec![0, 1],
            starting_room: 1,
            connections: vec![Connection {
                from: DoorRef { room: 0, door: 2 },
                to: DoorRef { room: 1, door: 5 },
            }],
        };
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["startingRoom"], 1);
        assert_eq!(json["connections"][0]["to"]["door"], 5);

        let back: Map = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_ports_used_counts_self_door_once() {
        let map = Map {
            rooms: vec![0],
            starting_room: 0,
            connections: vec![
                Connection {
                    from: DoorRef { room: 0, door: 0 },
                    to: DoorRef { room: 0, door: 0 },
                },
                Connection {
                    from: DoorRef { room: 0, door: 1 },
                    to: DoorRef { room: 0, door: 2 },
                },
            ],
        };
        assert_eq!(map.ports_used(), 3);
    }
}
