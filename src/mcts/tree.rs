//! Arena-allocated search tree.
//!
//! Nodes live in one contiguous `Vec` and refer to each other by
//! [`NodeId`]. The arena is owned by a single search call.

use rand::{Rng, prelude::IndexedRandom};

use super::node::{MctsNode, NodeId};
use crate::game::{GameState, Move, Player};

#[derive(Debug)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl MctsTree {
    pub fn new(root_state: GameState) -> Self {
        Self {
            nodes: vec![MctsNode::new_root(root_state)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn allocate(&mut self, node: MctsNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Child with the highest UCB1 score. Ties keep the earliest child.
    pub fn select_child(&self, id: NodeId, exploration: f64) -> Option<NodeId> {
        let node = self.get(id);
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &node.children {
            let score = self.get(child).ucb1(node.visit_count, exploration);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((child, score));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Descend from the root through fully expanded, non-terminal nodes.
    pub fn select(&self, exploration: f64) -> NodeId {
        let mut current = self.root();
        loop {
            let node = self.get(current);
            if node.is_terminal() || !node.is_fully_expanded() {
                return current;
            }
            match self.select_child(current, exploration) {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Expand one uniformly chosen untried move of `id`.
    ///
    /// Terminal and fully expanded nodes are returned unchanged.
    pub fn expand<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> NodeId {
        let node = self.get(id);
        if node.is_terminal() {
            return id;
        }
        let Some(&mv) = node.untried_moves.choose(rng) else {
            return id;
        };
        let Some(next) = node.state.after_move(mv) else {
            return id;
        };

        let child = MctsNode::new_child(id, &node.state, mv, next);
        let child_id = self.allocate(child);
        let parent = self.get_mut(id);
        parent.untried_moves.retain(|&m| m != mv);
        parent.children.push(child_id);
        child_id
    }

    /// Walk from `leaf` to the root adding `result` (scored for
    /// `root_player`). Nodes whose move was made by the root player take
    /// the result as is; all others, including the root, take `1 - result`.
    pub fn backpropagate(&mut self, leaf: NodeId, result: f64, root_player: Player) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get_mut(id);
            let credit = if node.perspective == Some(root_player) {
                result
            } else {
                1.0 - result
            };
            node.record(credit);
            current = node.parent;
        }
    }

    /// Root child with the most visits. Ties keep the earliest child.
    pub fn most_visited_move(&self) -> Option<Move> {
        let root = self.get(self.root());
        let mut best: Option<(&MctsNode, u32)> = None;
        for &child in &root.children {
            let node = self.get(child);
            if best.is_none_or(|(_, visits)| node.visit_count > visits) {
                best = Some((node, node.visit_count));
            }
        }
        best.and_then(|(node, _)| node.incoming_move)
    }

    /// `(move, visits, mean score)` for each root child, in expansion order.
    pub fn root_statistics(&self) -> Vec<(Move, u32, f64)> {
        self.get(self.root())
            .children
            .iter()
            .filter_map(|&id| {
                let node = self.get(id);
                node.incoming_move
                    .map(|mv| (mv, node.visit_count, node.mean_score()))
            })
            .collect()
    }
}
