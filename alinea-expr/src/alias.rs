//! Aliasing oracle
//!
//! Decides, for `dst op= expr`, whether the write can go straight into the
//! destination. The decision is a closed set of tagged rules over the
//! node tree, checked by storage identity:
//!
//! - the expression never reads the destination: write directly
//! - the destination is a direct operand of an element-wise root: write in
//!   place, index by index ([`AliasRule::IdentityElementwise`])
//! - the destination is read through a transpose
//!   ([`AliasRule::TransformRequiresTemporary`]), through a product or any
//!   other index-mixing operation ([`AliasRule::ReductionRequiresTemporary`]),
//!   or deeper than one level ([`AliasRule::NestedRequiresTemporary`]):
//!   evaluate into a temporary first
//!
//! `Eval` subtrees are treated like any other subtree even though they are
//! computed before the write phase.

use crate::node::{Factor, Leaf, Node, Op};
use alinea_core::{Element, OpKind, StorageId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Write each element straight into the destination
    Direct,
    /// Read-then-write each element of the destination in storage order
    InPlace,
    /// Evaluate into fresh storage, then transfer into the destination
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AliasRule {
    IdentityElementwise,
    TransformRequiresTemporary,
    ReductionRequiresTemporary,
    NestedRequiresTemporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub strategy: Strategy,
    /// Rule that fired; `None` when the destination is not read at all
    pub rule: Option<AliasRule>,
}

impl Verdict {
    pub const DIRECT: Verdict = Verdict { strategy: Strategy::Direct, rule: None };

    pub fn in_place() -> Self {
        Verdict { strategy: Strategy::InPlace, rule: Some(AliasRule::IdentityElementwise) }
    }

    pub fn temporary(rule: AliasRule) -> Self {
        Verdict { strategy: Strategy::Temporary, rule: Some(rule) }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            Some(rule) => write!(f, "{:?} ({:?})", self.strategy, rule),
            None => write!(f, "{:?}", self.strategy),
        }
    }
}

fn leaf_id<T: Element>(leaf: &Leaf<'_, T>) -> Option<StorageId> {
    match leaf {
        Leaf::Borrowed(op) => op.storage_id(),
        Leaf::Owned(_) => None,
    }
}

/// Whether the node reads any storage that could belong to a destination
pub fn can_alias<T: Element>(node: &Node<'_, T>) -> bool {
    let mut found = false;
    node.for_each_leaf(&mut |leaf| found |= leaf_id(leaf).is_some());
    found
}

/// Whether `dst` is read anywhere in the node, factors included
pub fn is_aliased<T: Element>(node: &Node<'_, T>, dst: StorageId) -> bool {
    let mut found = false;
    node.for_each_leaf(&mut |leaf| found |= leaf_id(leaf) == Some(dst));
    found
}

fn is_dst<T: Element>(node: &Node<'_, T>, dst: StorageId) -> bool {
    match &node.op {
        Op::Leaf(leaf) => leaf_id(leaf) == Some(dst),
        _ => false,
    }
}

/// Pick the strategy for writing `node` into the storage `dst`
pub fn classify<T: Element>(node: &Node<'_, T>, dst: StorageId) -> Verdict {
    if !can_alias(node) || !is_aliased(node, dst) {
        return Verdict::DIRECT;
    }
    match &node.op {
        Op::Leaf(_) => Verdict::in_place(),
        Op::Unary(OpKind::Trans, _) => {
            Verdict::temporary(AliasRule::TransformRequiresTemporary)
        }
        Op::Unary(OpKind::Eval, _) => Verdict::temporary(AliasRule::NestedRequiresTemporary),
        Op::Binary(k, _, _) if !k.is_elementwise() => {
            Verdict::temporary(AliasRule::ReductionRequiresTemporary)
        }
        Op::Scale(_, Factor::Inner(l, r)) if is_aliased(l, dst) || is_aliased(r, dst) => {
            Verdict::temporary(AliasRule::ReductionRequiresTemporary)
        }
        _ => {
            for child in node.children() {
                if !child.is_leaf() && is_aliased(child, dst) {
                    return Verdict::temporary(offense(child, dst));
                }
            }
            Verdict::in_place()
        }
    }
}

/// Rule violated by an aliased, non-root subtree
fn offense<T: Element>(node: &Node<'_, T>, dst: StorageId) -> AliasRule {
    match &node.op {
        Op::Leaf(_) | Op::Unary(OpKind::Eval, _) => AliasRule::NestedRequiresTemporary,
        Op::Unary(OpKind::Trans, _) => AliasRule::TransformRequiresTemporary,
        Op::Binary(k, _, _) if !k.is_elementwise() => AliasRule::ReductionRequiresTemporary,
        Op::Scale(_, Factor::Inner(l, r)) if is_aliased(l, dst) || is_aliased(r, dst) => {
            AliasRule::ReductionRequiresTemporary
        }
        _ => node
            .children()
            .into_iter()
            .find(|child| is_aliased(child, dst))
            .map(|child| {
                if is_dst(child, dst) {
                    AliasRule::NestedRequiresTemporary
                } else {
                    offense(child, dst)
                }
            })
            .unwrap_or(AliasRule::NestedRequiresTemporary),
    }
}
