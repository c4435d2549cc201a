//! Fixed wire layouts for position/node messages. Field offsets are
//! declared explicitly via `#[repr(C)]` rather than relying on natural
//! alignment, mirroring a hand-computed struct layout that would be shipped
//! to a derived datatype on a real network transport. Byte order is native
//! (a homogeneous-cluster assumption).

use crate::grid::Position;
use crate::node::{Handle, NodeRecord};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WirePosition {
    pub x: i32,
    pub y: i32,
}
impl From<Position> for WirePosition {
    fn from(p: Position) -> Self {
        WirePosition { x: p.x, y: p.y }
    }
}
impl From<WirePosition> for Position {
    fn from(w: WirePosition) -> Self {
        Position::new(w.x, w.y)
    }
}

/// `-1` marks "no parent" (the seed node at the start cell), mirroring the
/// `parent_rank = -1` sentinel.
const NO_PARENT: i32 = -1;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WireNode {
    pub pos: WirePosition,
    pub cost: f64,
    pub score: f64,
    pub parent_rank: i32,
    pub parent_handle: i32,
}
impl WireNode {
    pub fn from_record(record: NodeRecord) -> Self {
        let (parent_rank, parent_handle) = match record.parent {
            Some(h) => (h.owner as i32, h.index as i32),
            None => (NO_PARENT, NO_PARENT),
        };
        WireNode {
            pos: record.pos.into(),
            cost: record.cost,
            score: record.score,
            parent_rank,
            parent_handle,
        }
    }

    pub fn into_record(self) -> NodeRecord {
        let parent = if self.parent_rank == NO_PARENT {
            None
        } else {
            Some(Handle {
                owner: self.parent_rank as usize,
                index: self.parent_handle as u32,
            })
        };
        NodeRecord {
            pos: self.pos.into(),
            cost: self.cost,
            score: self.score,
            parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_node_with_parent() {
        let record = NodeRecord {
            pos: Position::new(3, 4),
            cost: 5.5,
            score: 6.5,
            parent: Some(Handle { owner: 2, index: 7 }),
        };
        let wire = WireNode::from_record(record);
        let back = wire.into_record();
        assert_eq!(record.pos.x, back.pos.x);
        assert_eq!(record.pos.y, back.pos.y);
        assert_eq!(record.cost, back.cost);
        assert_eq!(record.parent, back.parent);
    }

    #[test]
    fn round_trips_a_rootless_node() {
        let record = NodeRecord {
            pos: Position::new(0, 0),
            cost: 0.0,
            score: 0.0,
            parent: None,
        };
        let back = WireNode::from_record(record).into_record();
        assert!(back.parent.is_none());
    }
}
