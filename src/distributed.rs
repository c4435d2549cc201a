//! Hash-Distributed A*: one search worker per partition, communicating only
//! through `transport::Endpoint`s, realized as scoped OS threads exchanging
//! messages rather than a shared mutex.

use std::sync::Arc;
use std::time::Duration;

use crate::codec::WireNode;
use crate::grid::{Mark, MarkMap, Position, Terrain};
use crate::heuristic::Heuristic;
use crate::node::{FrontierEntry, Handle, NodeRecord, WindowBuffer};
use crate::partition::{HashPartitioner, Partitioner};
use crate::frontier::Frontier;
use crate::sequential::Solution;
use crate::transport::{build_fabric, Endpoint, Message};

/// How long a worker waits for new work before concluding the run has
/// wedged; only the test suite relies on this firing.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Searching,
    Helping,
    Done,
}

struct Worker<'a> {
    rank: usize,
    terrain: &'a Terrain,
    heuristic: &'a dyn Heuristic,
    partitioner: &'a HashPartitioner,
    endpoint: &'a Endpoint,
    marks: MarkMap,
    window: WindowBuffer,
    frontier: Frontier,
    state: State,
    end_handle: Option<Handle>,
    /// Set once a `PathDone` arrives; checked by `run_worker` to stop a
    /// helper that will never itself reach `Done`.
    path_done: bool,
    /// Outbound node batches, one per destination, flushed after each
    /// expansion round rather than sent one message at a time.
    outbox: Vec<Vec<WireNode>>,
}

impl<'a> Worker<'a> {
    fn new(
        rank: usize,
        terrain: &'a Terrain,
        heuristic: &'a dyn Heuristic,
        partitioner: &'a HashPartitioner,
        endpoint: &'a Endpoint,
    ) -> Self {
        let width = terrain.width();
        let height = terrain.height();
        Worker {
            rank,
            terrain,
            heuristic,
            partitioner,
            endpoint,
            marks: MarkMap::new(width, height),
            window: WindowBuffer::new(),
            frontier: Frontier::new(),
            state: State::Searching,
            end_handle: None,
            path_done: false,
            outbox: vec![Vec::new(); partitioner.world_size],
        }
    }

    fn seed_if_owner(&mut self) {
        let start = self.terrain.start;
        if self.partitioner.owner(start) == self.rank {
            self.frontier.push(FrontierEntry {
                pos: start,
                cost: 0.0,
                score: self.heuristic.estimate(start, self.terrain.end),
                parent: None,
            });
            self.marks.set(start, Mark::Frontier);
        }
    }

    fn queue_neighbor(&mut self, entry: &FrontierEntry, parent: Handle) {
        for next in self.terrain.neighbors8(entry.pos) {
            if self.terrain.value(next) == crate::grid::Cell::Wall {
                continue;
            }
            let owner = self.partitioner.owner(next);
            if owner == self.rank && self.marks.get(next) == Mark::Closed {
                continue;
            }
            let (cost, bias) = self.terrain.step_cost(entry.pos, next, entry.cost);
            let score = cost + bias + self.heuristic.estimate(next, self.terrain.end);
            if owner == self.rank {
                if self.marks.get(next) == Mark::None {
                    self.marks.set(next, Mark::Frontier);
                }
                self.frontier.push(FrontierEntry {
                    pos: next,
                    cost: cost + bias,
                    score,
                    parent: Some(parent),
                });
            } else {
                self.outbox[owner].push(WireNode::from_record(NodeRecord {
                    pos: next,
                    cost: cost + bias,
                    score,
                    parent: Some(parent),
                }));
            }
        }
    }

    fn flush_outbox(&mut self) {
        for (to, batch) in self.outbox.iter_mut().enumerate() {
            if !batch.is_empty() {
                self.endpoint.send(to, Message::Node(std::mem::take(batch)));
            }
        }
    }

    fn ingest(&mut self, messages: Vec<Message>) {
        for msg in messages {
            match msg {
                Message::Node(nodes) => {
                    for wire in nodes {
                        let record = wire.into_record();
                        if self.marks.get(record.pos) == Mark::Closed {
                            continue;
                        }
                        if self.marks.get(record.pos) == Mark::None {
                            self.marks.set(record.pos, Mark::Frontier);
                        }
                        self.frontier.push(FrontierEntry {
                            pos: record.pos,
                            cost: record.cost,
                            score: record.score,
                            parent: record.parent,
                        });
                    }
                }
                Message::GoalReached => {
                    if self.state == State::Searching {
                        log::debug!("worker {}: switching to helping", self.rank);
                        self.state = State::Helping;
                    }
                }
                Message::PathQuery { handle, from } => {
                    let record = self.window.get(handle as u32);
                    self.endpoint
                        .send(from, Message::PathReply(WireNode::from_record(record)));
                }
                Message::PathDone => {
                    self.path_done = true;
                }
                Message::PathReply(_) => {
                    // Only ever awaited synchronously by `reconstruct_path`,
                    // which reads straight off the endpoint and never goes
                    // through this drain-and-ingest path.
                }
            }
        }
    }

    /// One pop-expand-flush round. Returns `false` once the frontier is
    /// empty and nothing more can be expanded this round.
    fn step(&mut self) -> bool {
        let Some(current) = self.frontier.pop() else {
            return false;
        };
        if self.marks.get(current.pos) == Mark::Closed {
            return true;
        }
        self.marks.set(current.pos, Mark::Closed);
        let handle = self.window.push(self.rank, NodeRecord::from(current));

        if current.pos == self.terrain.end {
            log::info!("worker {}: goal reached, cost {}", self.rank, current.cost);
            self.end_handle = Some(handle);
            self.endpoint.broadcast_except_self(Message::GoalReached);
            self.state = State::Done;
            return false;
        }
        self.queue_neighbor(&current, handle);
        true
    }
}

/// Reconstructs the path ending at `end_handle` (owned by `end_owner`),
/// following cross-worker parent links via synchronous `PathQuery`/`PathReply`
/// round trips, marking each visited position `Path` in the end-owner's local
/// `marks`. Run only by the end-owner.
fn reconstruct_path(
    window: &WindowBuffer,
    marks: &mut MarkMap,
    endpoint: &Endpoint,
    end_owner: usize,
    end_handle: Handle,
) -> Solution {
    let mut path = Vec::new();
    let cost = window.get(end_handle.index).cost;
    let mut handle = Some(end_handle);
    while let Some(h) = handle {
        let record = if h.owner == end_owner {
            window.get(h.index)
        } else {
            endpoint.send(
                h.owner,
                Message::PathQuery {
                    handle: h.index as i32,
                    from: end_owner,
                },
            );
            // Stray `Node` batches from still-searching workers may still
            // land in this inbox; only the `PathReply` matters here, so
            // anything else is discarded.
            loop {
                match endpoint.recv_timeout(IDLE_TIMEOUT) {
                    Ok(Message::PathReply(wire)) => break wire.into_record(),
                    Ok(_) => continue,
                    Err(_) => panic!("reconstruction peer did not reply in time"),
                }
            }
        };
        if h.owner == end_owner {
            marks.set(record.pos, Mark::Path);
        }
        path.push(record.pos);
        handle = record.parent;
    }
    path.reverse();
    Solution { cost, path }
}

/// Runs the search across `world_size` scoped threads and returns the
/// optimal path, or `None` if the goal was never reached.
pub fn search(terrain: &Terrain, heuristic: &dyn Heuristic, world_size: usize) -> Option<Solution> {
    search_with_timeout(terrain, heuristic, world_size, IDLE_TIMEOUT)
}

/// Same as `search`, but with the idle-giveup timeout as a parameter rather
/// than the `IDLE_TIMEOUT` constant, so tests can exercise the giveup path
/// (e.g. a wall destination, which never broadcasts `GoalReached`) without
/// waiting out the production timeout.
fn search_with_timeout(
    terrain: &Terrain,
    heuristic: &dyn Heuristic,
    world_size: usize,
    idle_timeout: Duration,
) -> Option<Solution> {
    let partitioner = HashPartitioner { world_size };
    let terrain = Arc::new(terrain.clone());
    let fabric = build_fabric(world_size);

    std::thread::scope(|scope| {
        let handles: Vec<_> = fabric
            .iter()
            .enumerate()
            .map(|(rank, endpoint)| {
                let terrain = Arc::clone(&terrain);
                let partitioner = partitioner;
                scope.spawn(move || run_worker(rank, &terrain, heuristic, &partitioner, endpoint, idle_timeout))
            })
            .collect();

        let mut solution = None;
        for h in handles {
            if let Some(s) = h.join().expect("worker thread panicked") {
                solution = Some(s);
            }
        }
        solution
    })
}

/// One worker's full lifecycle: search until `Done`, then (end-owner only)
/// reconstruct and broadcast `PathDone`, or (everyone else) answer queries
/// until told to stop.
fn run_worker(
    rank: usize,
    terrain: &Terrain,
    heuristic: &dyn Heuristic,
    partitioner: &HashPartitioner,
    endpoint: &Endpoint,
    idle_timeout: Duration,
) -> Option<Solution> {
    let mut worker = Worker::new(rank, terrain, heuristic, partitioner, endpoint);
    worker.seed_if_owner();

    loop {
        let inbox = endpoint.drain();
        worker.ingest(inbox);

        if worker.state == State::Done {
            break;
        }
        if worker.path_done {
            // Another worker found and reconstructed the goal; this worker
            // never will, so it has nothing left to contribute.
            return None;
        }

        if worker.state == State::Helping {
            // Stop expanding; the goal is already closed elsewhere. Only
            // block waiting for a `PathQuery` to answer or the `PathDone`
            // that ends the run, rather than continuing to pop its own
            // (now-irrelevant) frontier.
            match endpoint.recv_timeout(idle_timeout) {
                Ok(msg) => worker.ingest(vec![msg]),
                Err(_) => {
                    log::warn!("worker {}: idle timeout while helping, giving up", rank);
                    return None;
                }
            }
            continue;
        }

        if worker.frontier.is_empty() {
            // Blocks rather than spins: a `Searching` worker with nothing
            // left to expand waits for incoming nodes or `GoalReached`.
            match endpoint.recv_timeout(idle_timeout) {
                Ok(msg) => worker.ingest(vec![msg]),
                Err(_) => {
                    log::warn!("worker {}: idle timeout with no goal signal, giving up", rank);
                    return None;
                }
            }
            continue;
        }

        worker.step();
        worker.flush_outbox();
    }

    let end_handle = worker.end_handle.expect("Done state implies end_handle is set");
    let solution = reconstruct_path(&worker.window, &mut worker.marks, endpoint, rank, end_handle);
    endpoint.broadcast_except_self(Message::PathDone);
    Some(solution)
}
