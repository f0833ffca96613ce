//! Bridge orchestration: node access, per-chain flows and multisig witness collection

pub mod collector;
pub mod in_memory_node;
pub mod node;
pub mod relay;
pub mod service;

pub use collector::{CollectError, WitnessCollector};
pub use in_memory_node::InMemoryNode;
pub use node::{Node, NodeError, Tip};
pub use relay::{InMemoryRelay, RelayChannel, RelayError};
pub use service::{ChainService, ServiceError};
