//! eightkit-nodes: 8kit and Stratagems workflow nodes
//!
//! Features:
//! - Operation handlers for sets, lookups, locks, last-updated markers and app info
//! - Membership checks with dual-channel or filtered routing
//! - Auto-create of missing sets and lookups
//! - Sequential dispatcher with abort or continue-on-error policies

pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod node;
pub mod nodes;
pub mod params;
pub mod routing;

pub use context::NodeContext;
pub use dispatcher::Dispatcher;
pub use node::{ErrorPolicy, InputItem, ItemOutcome, Node, NodeOutput, OutputChannel};
pub use nodes::{EightKitNode, EightKitOperation, StratagemsNode, StratagemsOperation};
pub use params::Parameters;
pub use routing::{CheckMode, CheckRouting, FilterMode};

/// Look up a node by type name (`eightKit`, `stratagemsTool`)
pub fn node_by_name(name: &str) -> Option<Box<dyn Node>> {
    match name {
        "eightKit" | "8kit" => Some(Box::new(EightKitNode::new())),
        "stratagemsTool" | "stratagems" => Some(Box::new(StratagemsNode::new())),
        _ => None,
    }
}

/// Prelude for convenient imports
pub mod prelude {
    pub use super::context::NodeContext;
    pub use super::dispatcher::Dispatcher;
    pub use super::node::{ErrorPolicy, InputItem, ItemOutcome, Node, NodeOutput};
    pub use super::nodes::{EightKitNode, StratagemsNode};
    pub use super::params::Parameters;
}
