//! Compact sparse Merkle tree
//!
//! Keys are 256-bit `Hi` values; the path to a key follows its bits, most
//! significant first. A leaf sits at the shallowest depth where its prefix is
//! unique, so depth is bounded by key width rather than element count and no
//! rebalancing ever happens.
//!
//! Nodes are stored by hash and never overwritten. An insert stages the new
//! path, then publishes it together with the new root, which leaves every
//! earlier root readable. That gives cheap snapshots for proofs against older
//! (committed) roots and a one-line rollback.
//!
//! # Retention
//!
//! Nothing is pruned. Memory grows with the number of inserts: each changed
//! insert adds at most one path of nodes plus one `sizes` entry. A relay has to
//! answer proofs against whichever root the ledger last committed, which can be
//! any earlier root, so history is kept for the life of the process.

use crate::exclusion::ExclusionProof;
use crate::node::{Leaf, Node};
use crate::proof::{assemble, ProofOfClaim};
use anchor_core::{AnchorError, Hash, Result, HASH_BITS};
use std::collections::HashMap;

/// Effect of an insert on the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New key added
    Inserted,
    /// Existing key given a new value
    Updated,
    /// Key already held this value; root untouched
    Unchanged,
}

enum Terminal {
    Empty,
    Leaf(Leaf),
}

struct Walk {
    /// Siblings ordered root first
    siblings: Vec<Hash>,
    terminal: Terminal,
}

/// Sparse Merkle tree over `Hi -> Hv`
#[derive(Debug, Clone)]
pub struct SparseMerkleTree {
    nodes: HashMap<Hash, Node>,
    root: Hash,
    /// Leaf count for every root this tree has published
    sizes: HashMap<Hash, usize>,
}

impl Default for SparseMerkleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseMerkleTree {
    /// Create an empty tree
    pub fn new() -> Self {
        let mut sizes = HashMap::new();
        sizes.insert(Hash::EMPTY, 0);
        Self {
            nodes: HashMap::new(),
            root: Hash::EMPTY,
            sizes,
        }
    }

    /// Current root
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Number of leaves under the current root
    pub fn len(&self) -> usize {
        self.sizes.get(&self.root).copied().unwrap_or_default()
    }

    /// True when no leaves exist under the current root
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Whether `root` is the current root or an earlier one of this tree
    pub fn contains_root(&self, root: &Hash) -> bool {
        self.sizes.contains_key(root)
    }

    /// Value stored at `hi` under the current root
    pub fn get(&self, hi: &Hash) -> Result<Option<Hash>> {
        self.get_at(&self.root, hi)
    }

    /// Value stored at `hi` under a current or earlier root
    pub fn get_at(&self, root: &Hash, hi: &Hash) -> Result<Option<Hash>> {
        self.require_root(root)?;
        Ok(match self.walk(*root, hi)?.terminal {
            Terminal::Leaf(leaf) if leaf.hi == *hi => Some(leaf.hv),
            _ => None,
        })
    }

    /// Insert or update the leaf at `hi`.
    ///
    /// All-or-nothing: on error the tree is untouched.
    pub fn insert(&mut self, hi: Hash, hv: Hash) -> Result<InsertOutcome> {
        let walk = self
            .walk(self.root, &hi)
            .map_err(|e| AnchorError::tree_insert(e.to_string()))?;
        let depth = walk.siblings.len();
        let mut staged: Vec<Node> = Vec::new();
        let new_leaf = Leaf::new(hi, hv);

        let (mut current, outcome) = match walk.terminal {
            Terminal::Leaf(existing) if existing.hi == hi => {
                if existing.hv == hv {
                    return Ok(InsertOutcome::Unchanged);
                }
                (stage(&mut staged, Node::Leaf(new_leaf)), InsertOutcome::Updated)
            }
            Terminal::Leaf(existing) => (
                split_leaves(&mut staged, existing, new_leaf, depth)?,
                InsertOutcome::Inserted,
            ),
            Terminal::Empty => (
                stage(&mut staged, Node::Leaf(new_leaf)),
                InsertOutcome::Inserted,
            ),
        };

        for (d, sibling) in walk.siblings.iter().enumerate().rev() {
            let node = if hi.bit(d) {
                Node::Middle {
                    left: *sibling,
                    right: current,
                }
            } else {
                Node::Middle {
                    left: current,
                    right: *sibling,
                }
            };
            current = stage(&mut staged, node);
        }

        let size = match outcome {
            InsertOutcome::Inserted => self.len() + 1,
            _ => self.len(),
        };
        for node in staged {
            self.nodes.insert(node.hash(), node);
        }
        self.root = current;
        self.sizes.insert(current, size);
        Ok(outcome)
    }

    /// Point the tree back at an earlier root.
    ///
    /// Used to undo an insert whose dependent update failed.
    pub fn reset_root(&mut self, root: Hash) -> Result<()> {
        self.require_root(&root)?;
        self.root = root;
        Ok(())
    }

    /// Inclusion proof for `hi` under the current root
    pub fn prove(&self, hi: &Hash) -> Result<ProofOfClaim> {
        self.prove_at(&self.root, hi)
    }

    /// Inclusion proof for `hi` under a current or earlier root
    pub fn prove_at(&self, root: &Hash, hi: &Hash) -> Result<ProofOfClaim> {
        self.require_root(root)?;
        let walk = self.walk(*root, hi)?;
        match walk.terminal {
            Terminal::Leaf(leaf) if leaf.hi == *hi => {
                let mut path = walk.siblings;
                path.reverse();
                Ok(assemble(leaf, path, *root))
            }
            _ => Err(AnchorError::claim_not_found(format!(
                "no leaf at {hi} under root {root}"
            ))),
        }
    }

    /// Non-existence proof for `hi` under the current root
    pub fn prove_exclusion(&self, hi: &Hash) -> Result<ExclusionProof> {
        let walk = self.walk(self.root, hi)?;
        let aux = match walk.terminal {
            Terminal::Leaf(leaf) if leaf.hi == *hi => {
                return Err(AnchorError::invalid(format!("leaf at {hi} exists")));
            }
            Terminal::Leaf(leaf) => Some(leaf),
            Terminal::Empty => None,
        };
        let mut siblings = walk.siblings;
        siblings.reverse();
        Ok(ExclusionProof {
            hi: *hi,
            aux,
            siblings,
            root: self.root,
        })
    }

    fn require_root(&self, root: &Hash) -> Result<()> {
        if !self.contains_root(root) {
            return Err(AnchorError::invalid(format!("root {root} is not known")));
        }
        Ok(())
    }

    fn node(&self, key: &Hash) -> Result<Option<&Node>> {
        if key.is_empty() {
            return Ok(None);
        }
        self.nodes
            .get(key)
            .map(Some)
            .ok_or_else(|| AnchorError::internal(format!("dangling node reference {key}")))
    }

    fn walk(&self, root: Hash, hi: &Hash) -> Result<Walk> {
        let mut siblings = Vec::new();
        let mut current = root;
        for depth in 0..=HASH_BITS {
            match self.node(&current)? {
                None => {
                    return Ok(Walk {
                        siblings,
                        terminal: Terminal::Empty,
                    })
                }
                Some(Node::Leaf(leaf)) => {
                    return Ok(Walk {
                        siblings,
                        terminal: Terminal::Leaf(*leaf),
                    })
                }
                Some(Node::Middle { left, right }) => {
                    if depth == HASH_BITS {
                        break;
                    }
                    if hi.bit(depth) {
                        siblings.push(*left);
                        current = *right;
                    } else {
                        siblings.push(*right);
                        current = *left;
                    }
                }
            }
        }
        Err(AnchorError::internal("middle node below maximum depth"))
    }
}

fn stage(staged: &mut Vec<Node>, node: Node) -> Hash {
    let key = node.hash();
    staged.push(node);
    key
}

/// Build the subtree holding two leaves whose keys agree on the first `depth` bits
fn split_leaves(staged: &mut Vec<Node>, existing: Leaf, new: Leaf, depth: usize) -> Result<Hash> {
    let split = (depth..HASH_BITS)
        .find(|&d| existing.hi.bit(d) != new.hi.bit(d))
        .ok_or_else(|| AnchorError::tree_insert("distinct keys share every bit"))?;

    let existing_key = existing.node_hash();
    let new_key = stage(staged, Node::Leaf(new));
    let mut current = if new.hi.bit(split) {
        stage(
            staged,
            Node::Middle {
                left: existing_key,
                right: new_key,
            },
        )
    } else {
        stage(
            staged,
            Node::Middle {
                left: new_key,
                right: existing_key,
            },
        )
    };

    for d in (depth..split).rev() {
        let node = if new.hi.bit(d) {
            Node::Middle {
                left: Hash::EMPTY,
                right: current,
            }
        } else {
            Node::Middle {
                left: current,
                right: Hash::EMPTY,
            }
        };
        current = stage(staged, node);
    }
    Ok(current)
}
