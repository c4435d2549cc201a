pub mod cli;
pub mod codec;
pub mod distributed;
pub mod error;
pub mod frontier;
pub mod grid;
pub mod heuristic;
pub mod node;
pub mod partition;
pub mod sequential;
pub mod transport;
pub mod utils;
pub mod worldgen;
