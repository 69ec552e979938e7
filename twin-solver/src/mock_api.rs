use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::OracleError;
use crate::map::{Connection, DOOR_COUNT, DoorRef, Label, Map};
use crate::oracle::{ExploreOutcome, Oracle};
use crate::trace::{Token, charcoal_plan, tokenize};

const GUESS_WALKS: usize = 200;

/// In-process stand-in for the exploration service, answering from a hidden
/// map it owns.
pub struct MockOracle {
    hidden: Map,
    seed: u64,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    problem_name: Option<String>,
    query_count: u32,
    guesses: Vec<Map>,
}

impl MockOracle {
    pub fn new(hidden: Map) -> Self {
        Self::with_seed(hidden, 0)
    }

    pub fn with_seed(hidden: Map, seed: u64) -> Self {
        Self {
            hidden,
            seed,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn hidden(&self) -> &Map {
        &self.hidden
    }

    pub async fn problem_name(&self) -> Option<String> {
        self.state.lock().await.problem_name.clone()
    }

    pub async fn query_count(&self) -> u32 {
        self.state.lock().await.query_count
    }

    pub async fn guesses(&self) -> Vec<Map> {
        self.state.lock().await.guesses.clone()
    }

    /// Compares the guess against the hidden map on random marked walks from
    /// both starting rooms.
    fn check(&self, guess: &Map) -> bool {
        if guess.starting_room >= guess.rooms.len() {
            return false;
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let max_len = 3 * self.hidden.rooms.len().max(1);
        for _ in 0..GUESS_WALKS {
            let len = rng.gen_range(1..=max_len);
            let doors: String = (0..len).map(|_| char::from(b'0' + rng.gen_range(0..6u8))).collect();
            let plan = charcoal_plan(&doors, &mut rng);
            let expected = walk(&self.hidden, &plan);
            let actual = walk(guess, &plan);
            match (expected, actual) {
                (Ok(expected), Ok(actual)) if expected == actual => {}
                _ => {
                    debug!("guess diverges on plan {}", plan);
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn select(&self, problem_name: &str) -> Result<(), OracleError> {
        let mut state = self.state.lock().await;
        state.problem_name = Some(problem_name.to_string());
        state.query_count = 0;
        Ok(())
    }

    async fn explore(&self, plans: &[String]) -> Result<ExploreOutcome, OracleError> {
        let mut results = Vec::with_capacity(plans.len());
        for plan in plans {
            let labels = walk(&self.hidden, plan).map_err(|e| OracleError::Protocol {
                endpoint: "explore",
                status: 400,
                body: e.to_string(),
            })?;
            results.push(labels);
        }
        let mut state = self.state.lock().await;
        state.query_count += plans.len() as u32 + 1;
        Ok(ExploreOutcome {
            results,
            query_count: state.query_count,
        })
    }

    async fn guess(&self, map: &Map) -> Result<bool, OracleError> {
        let correct = self.check(map);
        self.state.lock().await.guesses.push(map.clone());
        Ok(correct)
    }
}

fn adjacency(map: &Map) -> Result<Vec<[Option<DoorRef>; DOOR_COUNT]>> {
    let mut doors = vec![[None; DOOR_COUNT]; map.rooms.len()];
    for conn in &map.connections {
        for end in [conn.from, conn.to] {
            if end.room >= map.rooms.len() || end.door >= DOOR_COUNT {
                return Err(anyhow!("connection end {}:{} out of range", end.room, end.door));
            }
        }
        doors[conn.from.room][conn.from.door] = Some(conn.to);
        doors[conn.to.room][conn.to.door] = Some(conn.from);
    }
    Ok(doors)
}

/// Labels observed while walking `plan` on `map`: the starting label, then one
/// label per door taken or mark written. Marks last for the walk only.
pub fn walk(map: &Map, plan: &str) -> Result<Vec<Label>> {
    let doors = adjacency(map)?;
    let mut labels = map.rooms.clone();
    let mut room = map.starting_room;
    let mut observed = vec![labels[room]];
    for token in tokenize(plan)? {
        match token {
            Token::Door(door) => {
                room = doors[room][door]
                    .ok_or_else(|| anyhow!("room {} door {} leads nowhere", room, door))?
                    .room;
            }
            Token::Mark(label) => labels[room] = label,
        }
        observed.push(labels[room]);
    }
    Ok(observed)
}

/// Random position map with labels in `0..4`, every door paired with another
/// door (possibly on the same room).
pub fn random_position_map(n: usize, rng: &mut impl Rng) -> Map {
    let mut ports: Vec<DoorRef> = (0..n)
        .flat_map(|room| (0..DOOR_COUNT).map(move |door| DoorRef { room, door }))
        .collect();
    ports.shuffle(rng);
    let connections = ports
        .chunks(2)
        .map(|pair| Connection {
            from: pair[0],
            to: pair[1],
        })
        .collect();
    Map {
        rooms: (0..n).map(|_| rng.gen_range(0..4)).collect(),
        starting_room: 0,
        connections,
    }
}

/// Doubles every position of `map`: copy `c` of position `p` is room
/// `c * N + p`, and each connection either stays within copies or crosses
/// them, chosen at random.
pub fn double_cover(map: &Map, rng: &mut impl Rng) -> Map {
    let n = map.rooms.len();
    let mut connections = Vec::with_capacity(2 * map.connections.len());
    for conn in &map.connections {
        let cross = rng.gen_bool(0.5);
        for copy in 0..2 {
            let peer_copy = if cross { 1 - copy } else { copy };
            let from = DoorRef {
                room: copy * n + conn.from.room,
                door: conn.from.door,
            };
            let to = DoorRef {
                room: peer_copy * n + conn.to.room,
                door: conn.to.door,
            };
            // A crossed door wired to itself becomes a single link between the copies.
            if cross && conn.from == conn.to && copy == 1 {
                continue;
            }
            connections.push(Connection { from, to });
        }
    }
    Map {
        rooms: map.rooms.iter().chain(map.rooms.iter()).copied().collect(),
        starting_room: map.starting_room,
        connections,
    }
}
