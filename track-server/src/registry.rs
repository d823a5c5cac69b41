use std::collections::BTreeMap;
use std::fmt;

use crate::vehicle::{InputState, Vehicle};

/// Opaque per-socket handle. Allocated in increasing order, so sorting by it
/// is registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

pub struct Connection {
    pub vehicle: Vehicle,
    pub input: InputState,
}

/// Live connections and the vehicle each one drives.
#[derive(Default)]
pub struct Registry {
    next_id: u64,
    entries: BTreeMap<ConnectionId, Connection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, vehicle: Vehicle) -> ConnectionId {
        let conn = ConnectionId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            conn,
            Connection {
                vehicle,
                input: InputState::default(),
            },
        );
        conn
    }

    /// Overwrites the stored input. Absent axes read as 0; both are clamped to
    /// [-1, 1]. Returns false for an unknown connection.
    pub fn update_input(&mut self, conn: ConnectionId, dx: Option<f32>, dz: Option<f32>) -> bool {
        let Some(entry) = self.entries.get_mut(&conn) else {
            return false;
        };
        entry.input = InputState {
            steer: sanitize(dx),
            throttle: sanitize(dz),
        };
        true
    }

    /// Removes the entry. A second call for the same connection yields `None`.
    pub fn remove(&mut self, conn: ConnectionId) -> Option<Connection> {
        self.entries.remove(&conn)
    }

    pub fn get(&self, conn: ConnectionId) -> Option<&Connection> {
        self.entries.get(&conn)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConnectionId, &Connection)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ConnectionId, &mut Connection)> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn sanitize(axis: Option<f32>) -> f32 {
    match axis {
        Some(v) if v.is_finite() => v.clamp(-1.0, 1.0),
        _ => 0.0,
    }
}
