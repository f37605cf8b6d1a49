//! Structural alignment of two market trees.
//!
//! Only markets offered by both bookmakers can be compared. Keys present on
//! one side only are dropped; mappings present on both sides are aligned
//! recursively; every other value is kept exactly as it was.

use valuebet_data::{MarketNode, MarketTree};

/// Reduces two trees to their common keys, recursively.
#[must_use]
pub fn equalize(left: &MarketTree, right: &MarketTree) -> (MarketTree, MarketTree) {
    let mut left_out = MarketTree::new();
    let mut right_out = MarketTree::new();

    for (key, left_node) in left {
        let Some(right_node) = right.get(key) else {
            continue;
        };

        match (left_node, right_node) {
            (MarketNode::Group(l), MarketNode::Group(r)) => {
                let (l, r) = equalize(l, r);
                left_out.insert(key.clone(), MarketNode::Group(l));
                right_out.insert(key.clone(), MarketNode::Group(r));
            }
            _ => {
                left_out.insert(key.clone(), left_node.clone());
                right_out.insert(key.clone(), right_node.clone());
            }
        }
    }

    (left_out, right_out)
}
