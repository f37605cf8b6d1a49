//! No-vig odds.
//!
//! A bookmaker's implied probabilities sum above 1; the excess is its margin.
//! Rescaling each probability by the sum leaves the fair odds:
//!
//! ```text
//! odds:         1.90   1.90
//! implied:      0.526  0.526   (sum 1.053)
//! fair odds:    2.00   2.00
//! ```

use rust_decimal::Decimal;
use tracing::trace;
use valuebet_data::{MarketNode, MarketTree};

use crate::error::NormalizeError;

/// Implied probability of each price.
///
/// # Errors
/// Returns an error if any price is zero or negative.
pub fn implied_probabilities(odds: &[Decimal]) -> Result<Vec<Decimal>, NormalizeError> {
    odds.iter()
        .enumerate()
        .map(|(index, &odds)| {
            if odds <= Decimal::ZERO {
                return Err(NormalizeError::NonPositive { index, odds });
            }
            Decimal::ONE
                .checked_div(odds)
                .ok_or(NormalizeError::Overflow { index })
        })
        .collect()
}

/// Removes the margin from one market.
///
/// A single-outcome market has no margin to remove and is returned as is.
///
/// # Errors
/// Returns an error if any price is not strictly positive.
pub fn no_vig_odds(odds: &[Decimal]) -> Result<Vec<Decimal>, NormalizeError> {
    let probabilities = implied_probabilities(odds)?;

    if probabilities.len() == 1 {
        return Ok(odds.to_vec());
    }

    let total = probabilities
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))
        .ok_or(NormalizeError::Overflow { index: 0 })?;

    probabilities
        .iter()
        .enumerate()
        .map(|(index, p)| {
            total
                .checked_div(*p)
                .ok_or(NormalizeError::Overflow { index })
        })
        .collect()
}

/// De-vigs every market of a tree.
///
/// Markets that cannot be normalized keep their original prices; other
/// node kinds are copied unchanged.
#[must_use]
pub fn normalize_tree(tree: &MarketTree) -> MarketTree {
    tree.iter()
        .map(|(key, node)| (key.clone(), normalize_node(key, node)))
        .collect()
}

fn normalize_node(key: &str, node: &MarketNode) -> MarketNode {
    match node {
        MarketNode::Market(odds) => match no_vig_odds(odds) {
            Ok(fair) => MarketNode::Market(fair),
            Err(e) => {
                trace!(market = %key, error = %e, "Keeping original odds");
                node.clone()
            }
        },
        MarketNode::Group(children) => MarketNode::Group(normalize_tree(children)),
        MarketNode::Opaque(_) => node.clone(),
    }
}
