// Copyright @yucwang 2021

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique default ID for a scene node.
pub fn generate_node_id(type_name: &str) -> String {
    let seq = NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", type_name, seq)
}

/// Identity and a one-line description for every scene node (media, shapes,
/// emitters); used in log messages.
pub trait ComputationNode {
    fn id(&self) -> &str;

    fn to_string(&self) -> String;
}
