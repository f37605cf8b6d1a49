//! Removal of empty and unusable branches from comparison results.

use valuebet_data::{ValueBetRecord, ValueNode, ValueTree};

/// Drops unusable markets, empty bet lists and groups that end up empty.
///
/// Children are pruned before their parent is checked, so a group whose
/// children all disappear is removed too. Pruning is idempotent.
#[must_use]
pub fn prune_tree(tree: ValueTree) -> ValueTree {
    tree.into_iter()
        .filter_map(|(key, node)| prune_node(node).map(|node| (key, node)))
        .collect()
}

fn prune_node(node: ValueNode) -> Option<ValueNode> {
    match node {
        ValueNode::Unusable => None,
        ValueNode::Bets(entries) if entries.is_empty() => None,
        ValueNode::Bets(entries) => Some(ValueNode::Bets(entries)),
        ValueNode::Group(children) => {
            let children = prune_tree(children);
            (!children.is_empty()).then_some(ValueNode::Group(children))
        }
    }
}

/// Prunes the market tree of a record.
///
/// The record is worth persisting only if [`ValueBetRecord::has_markets`]
/// still holds afterwards.
#[must_use]
pub fn prune_record(mut record: ValueBetRecord) -> ValueBetRecord {
    record.markets = prune_tree(std::mem::take(&mut record.markets));
    record
}
