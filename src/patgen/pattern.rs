//! Pattern graphs: small And/Xor structures stored in a shared, hash-consed arena

use std::fmt::Write;

use fxhash::FxHashMap;

/// An edge to a pattern node, with an inversion flag
///
/// Also used as the handle of a pattern root, whose inversion is the output inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternEdge {
    /// Index of the node in the arena
    pub node: u32,
    /// Inversion of the edge
    pub inv: bool,
}

impl PatternEdge {
    /// Create an edge
    pub fn new(node: u32, inv: bool) -> PatternEdge {
        PatternEdge { node, inv }
    }

    /// Packed representation `node * 2 + inv`
    pub fn raw(&self) -> u32 {
        self.node << 1 | self.inv as u32
    }

    /// Unpack `node * 2 + inv`
    pub fn from_raw(raw: u32) -> PatternEdge {
        PatternEdge::new(raw >> 1, raw & 1 != 0)
    }
}

impl std::ops::Not for PatternEdge {
    type Output = PatternEdge;
    fn not(self) -> PatternEdge {
        PatternEdge::new(self.node, !self.inv)
    }
}

impl std::ops::BitXor<bool> for PatternEdge {
    type Output = PatternEdge;
    fn bitxor(self, rhs: bool) -> PatternEdge {
        PatternEdge::new(self.node, self.inv ^ rhs)
    }
}

/// Node of a pattern graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternNode {
    /// Pattern input, bound to a leaf of the cut
    Input(u32),
    /// 2-input And with inverted edges
    And([PatternEdge; 2]),
    /// 2-input Xor; its edges are never inverted
    Xor([PatternEdge; 2]),
}

impl PatternNode {
    /// Fanin edges of an operator
    pub fn fanins(&self) -> &[PatternEdge] {
        match self {
            PatternNode::Input(_) => &[],
            PatternNode::And(f) | PatternNode::Xor(f) => f,
        }
    }

    /// Returns whether the node is a pattern input
    pub fn is_input(&self) -> bool {
        matches!(self, PatternNode::Input(_))
    }
}

/// Arena of pattern nodes shared by all patterns
///
/// Nodes are hash-consed: building the same operator on the same edges twice returns the
/// same node. Input `i` always has index `i`, and operators always have a larger index
/// than their fanins.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternArena {
    nb_inputs: usize,
    nodes: Vec<PatternNode>,
    table: FxHashMap<PatternNode, u32>,
}

impl PatternArena {
    /// Create an arena with a given number of inputs
    pub fn new(nb_inputs: usize) -> PatternArena {
        PatternArena {
            nb_inputs,
            nodes: (0..nb_inputs as u32).map(PatternNode::Input).collect(),
            table: FxHashMap::default(),
        }
    }

    /// Create an arena from existing nodes
    pub(crate) fn from_nodes(nb_inputs: usize, nodes: Vec<PatternNode>) -> PatternArena {
        let mut table = FxHashMap::default();
        for (i, n) in nodes.iter().enumerate() {
            if !n.is_input() {
                table.insert(*n, i as u32);
            }
        }
        PatternArena {
            nb_inputs,
            nodes,
            table,
        }
    }

    /// Number of pattern inputs
    pub fn nb_inputs(&self) -> usize {
        self.nb_inputs
    }

    /// Number of nodes
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Get the node at index i
    pub fn node(&self, i: u32) -> &PatternNode {
        &self.nodes[i as usize]
    }

    /// All nodes
    pub fn nodes(&self) -> &[PatternNode] {
        &self.nodes
    }

    /// Edge to input i
    pub fn input(&self, i: usize) -> PatternEdge {
        assert!(i < self.nb_inputs);
        PatternEdge::new(i as u32, false)
    }

    /// Obtain an And node
    pub fn and(&mut self, a: PatternEdge, b: PatternEdge) -> PatternEdge {
        PatternEdge::new(self.make(PatternNode::And([a, b])), false)
    }

    /// Obtain a Xor node; the edge inversions are moved to the output
    pub fn xor(&mut self, a: PatternEdge, b: PatternEdge) -> PatternEdge {
        let inv = a.inv ^ b.inv;
        let node = self.make(PatternNode::Xor([a ^ a.inv, b ^ b.inv]));
        PatternEdge::new(node, inv)
    }

    fn make(&mut self, node: PatternNode) -> u32 {
        if let Some(id) = self.table.get(&node) {
            return *id;
        }
        let id = self.nodes.len() as u32;
        self.nodes.push(node);
        self.table.insert(node, id);
        id
    }

    /// Evaluate a pattern on 64 input patterns at once
    pub fn eval_words(&self, root: PatternEdge, inputs: &[u64]) -> u64 {
        let v = match self.node(root.node) {
            PatternNode::Input(i) => inputs[*i as usize],
            PatternNode::And([a, b]) => self.eval_words(*a, inputs) & self.eval_words(*b, inputs),
            PatternNode::Xor([a, b]) => self.eval_words(*a, inputs) ^ self.eval_words(*b, inputs),
        };
        if root.inv {
            !v
        } else {
            v
        }
    }

    /// Number of inputs used by a pattern: one more than the largest input index
    pub fn input_count(&self, root: PatternEdge) -> usize {
        match self.node(root.node) {
            PatternNode::Input(i) => *i as usize + 1,
            n => n
                .fanins()
                .iter()
                .map(|f| self.input_count(*f))
                .max()
                .unwrap_or(0),
        }
    }

    /// Structural signature of a pattern, invariant under renaming of the inputs
    ///
    /// Inputs are numbered by order of first occurrence in a depth-first traversal, so two
    /// patterns have the same signature exactly when they are isomorphic.
    pub fn signature(&self, root: PatternEdge) -> String {
        let mut renaming = vec![u32::MAX; self.nb_inputs];
        let mut next = 0;
        let mut ret = String::new();
        self.write_signature(root, &mut renaming, &mut next, &mut ret);
        ret
    }

    fn write_signature(
        &self,
        edge: PatternEdge,
        renaming: &mut [u32],
        next: &mut u32,
        out: &mut String,
    ) {
        if edge.inv {
            out.push('!');
        }
        let (op, [a, b]) = match self.node(edge.node) {
            PatternNode::Input(i) => {
                let r = &mut renaming[*i as usize];
                if *r == u32::MAX {
                    *r = *next;
                    *next += 1;
                }
                let _ = write!(out, "{}", *r);
                return;
            }
            PatternNode::And(f) => ('&', f),
            PatternNode::Xor(f) => ('^', f),
        };
        out.push(op);
        out.push('(');
        self.write_signature(*a, renaming, next, out);
        out.push(',');
        self.write_signature(*b, renaming, next, out);
        out.push(')');
    }

    /// Depth-first edge stream of a pattern
    ///
    /// Each operator is visited once; `node * 2` is emitted before visiting fanin 0 and
    /// `node * 2 + 1` before visiting fanin 1.
    pub fn edge_stream(&self, root: PatternEdge) -> Vec<u32> {
        let mut visited = vec![false; self.nodes.len()];
        let mut ret = Vec::new();
        let mut stack = vec![(root.node, 0u32)];
        while let Some((node, pos)) = stack.pop() {
            let fanins = self.node(node).fanins();
            if fanins.is_empty() || pos == 2 {
                continue;
            }
            if pos == 0 {
                if visited[node as usize] {
                    continue;
                }
                visited[node as usize] = true;
            }
            ret.push(node * 2 + pos);
            stack.push((node, pos + 1));
            stack.push((fanins[pos as usize].node, 0));
        }
        ret
    }

    /// Keep only the nodes reachable from the roots
    ///
    /// Returns the compacted arena and the translated roots. Inputs keep their index and
    /// operators keep their relative order.
    pub fn compact(&self, roots: &[PatternEdge]) -> (PatternArena, Vec<PatternEdge>) {
        let mut used = vec![false; self.nodes.len()];
        let mut stack: Vec<u32> = roots.iter().map(|r| r.node).collect();
        while let Some(n) = stack.pop() {
            if used[n as usize] {
                continue;
            }
            used[n as usize] = true;
            stack.extend(self.node(n).fanins().iter().map(|f| f.node));
        }
        let mut translation = vec![u32::MAX; self.nodes.len()];
        let mut nodes = Vec::new();
        for (i, n) in self.nodes.iter().enumerate() {
            if i < self.nb_inputs || used[i] {
                translation[i] = nodes.len() as u32;
                let tr = |e: &PatternEdge| PatternEdge::new(translation[e.node as usize], e.inv);
                nodes.push(match n {
                    PatternNode::Input(k) => PatternNode::Input(*k),
                    PatternNode::And([a, b]) => PatternNode::And([tr(a), tr(b)]),
                    PatternNode::Xor([a, b]) => PatternNode::Xor([tr(a), tr(b)]),
                });
            }
        }
        let new_roots = roots
            .iter()
            .map(|r| PatternEdge::new(translation[r.node as usize], r.inv))
            .collect();
        (PatternArena::from_nodes(self.nb_inputs, nodes), new_roots)
    }
}

/// A stored pattern of a representative class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternGraph {
    pub(crate) root: PatternEdge,
    pub(crate) input_count: usize,
    pub(crate) edges: Vec<u32>,
    pub(crate) rep: usize,
}

impl PatternGraph {
    /// Root node, with the output inversion
    pub fn root(&self) -> PatternEdge {
        self.root
    }

    /// Output inversion
    pub fn root_inv(&self) -> bool {
        self.root.inv
    }

    /// Number of pattern inputs
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Depth-first edge stream, as returned by [`PatternArena::edge_stream`]
    pub fn edges(&self) -> &[u32] {
        &self.edges
    }

    /// Representative class of the pattern
    pub fn rep(&self) -> usize {
        self.rep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consing() {
        let mut a = PatternArena::new(3);
        let x = a.and(a.input(0), !a.input(1));
        let y = a.and(a.input(0), !a.input(1));
        assert_eq!(x, y);
        assert_eq!(a.nb_nodes(), 4);
        let z = a.xor(!a.input(2), x);
        assert!(z.inv);
        assert_eq!(a.node(z.node), &PatternNode::Xor([a.input(2), x]));
        assert_eq!(a.input_count(z), 3);
    }

    #[test]
    fn test_eval() {
        let mut a = PatternArena::new(2);
        let n = a.and(!a.input(0), !a.input(1));
        let or = !n;
        assert_eq!(a.eval_words(or, &[0b1100, 0b1010]) & 0xf, 0b1110);
        let x = a.xor(a.input(0), !a.input(1));
        assert_eq!(a.eval_words(x, &[0b1100, 0b1010]) & 0xf, 0b1001);
    }

    #[test]
    fn test_signature() {
        let mut a = PatternArena::new(3);
        let ab = a.and(a.input(0), a.input(1));
        let p1 = a.and(ab, a.input(2));
        let cb = a.and(a.input(2), a.input(1));
        let p2 = a.and(cb, a.input(0));
        let p3 = a.and(a.input(2), ab);
        assert_eq!(a.signature(p1), a.signature(p2));
        assert_eq!(a.signature(p1), "&(&(0,1),2)");
        assert_ne!(a.signature(p1), a.signature(p3));
        assert_ne!(a.signature(p1), a.signature(!p1));
    }

    #[test]
    fn test_edge_stream_and_compact() {
        let mut a = PatternArena::new(3);
        let unused = a.and(a.input(1), a.input(2));
        let ab = a.and(a.input(0), !a.input(1));
        let p = a.xor(ab, a.input(2));
        assert_eq!(a.edge_stream(p), vec![p.node * 2, ab.node * 2, ab.node * 2 + 1, p.node * 2 + 1]);
        let (c, roots) = a.compact(&[p]);
        assert!(unused.node < ab.node);
        assert_eq!(c.nb_nodes(), 5);
        assert_eq!(roots[0].node, 4);
        assert_eq!(c.node(3), &PatternNode::And([c.input(0), !c.input(1)]));
        for m in 0..8u64 {
            let ins: Vec<u64> = (0..3).map(|i| if (m >> i) & 1 != 0 { !0 } else { 0 }).collect();
            assert_eq!(c.eval_words(roots[0], &ins), a.eval_words(p, &ins));
        }
    }
}
