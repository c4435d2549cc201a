//! The message-passing fabric. Stands in for a tagged MPI message layer:
//! each worker gets one mailbox, and every other worker holds a `Sender`
//! into it.

use crossbeam_channel::{after, select, unbounded, Receiver, RecvError, Sender};
use std::time::Duration;

use crate::codec::WireNode;

/// The five message kinds, as an enum instead of an integer MPI tag plus a
/// raw buffer.
#[derive(Debug, Clone)]
pub enum Message {
    /// A batch of newly-discovered nodes destined for the receiver's
    /// partition. Batched per destination by the sender, the way a
    /// buffered `Isend` would be.
    Node(Vec<WireNode>),
    /// The goal cell has been closed; broadcast to every other worker.
    GoalReached,
    /// A blocking request, sent only during path reconstruction, asking the
    /// owner of `handle` for that node's record. `from` carries the
    /// requester's rank so the reply can be routed back (MPI messages carry
    /// their source rank for free; an explicit field does the same job
    /// here).
    PathQuery { handle: i32, from: usize },
    /// The reply to a `PathQuery`.
    PathReply(WireNode),
    /// Sent by the end-owner once reconstruction is complete, so every
    /// helper can stop servicing `PathQuery`s and exit.
    PathDone,
}

/// One worker's view of the fabric: its own inbox, and a sender into every
/// worker's inbox (including its own, for symmetry with the broadcast loop).
pub struct Endpoint {
    pub rank: usize,
    inbox: Receiver<Message>,
    outboxes: Vec<Sender<Message>>,
}
impl Endpoint {
    pub fn send(&self, to: usize, msg: Message) {
        // A peer that has already exited (dropped its receiver) is only
        // possible once that peer is `Done`; dropping the message is then
        // correct, so disconnects are silently ignored rather than panicking.
        let _ = self.outboxes[to].send(msg);
    }

    pub fn broadcast_except_self(&self, msg: Message) {
        for (to, outbox) in self.outboxes.iter().enumerate() {
            if to != self.rank {
                let _ = outbox.send(msg.clone());
            }
        }
    }

    /// Non-blocking drain of every message currently queued, oldest first.
    pub fn drain(&self) -> Vec<Message> {
        self.inbox.try_iter().collect()
    }

    /// Blocks until a message arrives or `timeout` elapses, whichever first;
    /// used both by the reconstruction-query round trip and by an idle
    /// worker waiting on its next message (there is no unbounded blocking
    /// receive, so a stalled peer is always eventually detected).
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Message, RecvError> {
        select! {
            recv(self.inbox) -> msg => msg,
            recv(after(timeout)) -> _ => Err(RecvError),
        }
    }
}

/// Builds a full mesh of channels for `world_size` workers and returns one
/// `Endpoint` per rank, in rank order.
pub fn build_fabric(world_size: usize) -> Vec<Endpoint> {
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..world_size).map(|_| unbounded()).unzip();
    receivers
        .into_iter()
        .enumerate()
        .map(|(rank, inbox)| Endpoint {
            rank,
            inbox,
            outboxes: senders.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WirePosition;

    fn sample_node() -> WireNode {
        WireNode {
            pos: WirePosition { x: 1, y: 2 },
            cost: 3.0,
            score: 4.0,
            parent_rank: -1,
            parent_handle: -1,
        }
    }

    #[test]
    fn point_to_point_send_is_received_by_the_right_rank() {
        let fabric = build_fabric(3);
        fabric[0].send(2, Message::GoalReached);
        let msgs = fabric[2].drain();
        assert_eq!(1, msgs.len());
        assert!(matches!(msgs[0], Message::GoalReached));
        assert!(fabric[1].drain().is_empty());
    }

    #[test]
    fn broadcast_reaches_every_other_rank_but_not_self() {
        let fabric = build_fabric(4);
        fabric[1].broadcast_except_self(Message::PathDone);
        for rank in [0, 2, 3] {
            assert_eq!(1, fabric[rank].drain().len());
        }
        assert!(fabric[1].drain().is_empty());
    }

    #[test]
    fn recv_timeout_expires_on_an_empty_inbox() {
        let fabric = build_fabric(2);
        let result = fabric[0].recv_timeout(Duration::from_millis(20));
        assert!(result.is_err());
    }

    #[test]
    fn recv_timeout_returns_a_queued_message() {
        let fabric = build_fabric(2);
        fabric[1].send(0, Message::Node(vec![sample_node()]));
        let msg = fabric[0].recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(matches!(msg, Message::Node(v) if v.len() == 1));
    }
}
