//! Expansion of factored expressions into binary pattern graphs

use fxhash::FxHashSet;
use itertools::Itertools;

use crate::patgen::pattern::{PatternArena, PatternEdge};
use crate::Expr;

/// Operator marker in a tree template; other entries are leaf slots
const OPERATOR: i32 = -1;

/// All binary trees over `n` ordered leaves, in prefix notation
///
/// Operators are written as -1 and leaves as their slot index, so that the two trees over
/// three leaves are `[-1, 0, -1, 1, 2]` and `[-1, -1, 0, 1, 2]`. There are Catalan(n-1)
/// of them.
pub fn binary_tree_templates(n: usize) -> Vec<Vec<i32>> {
    fn trees(lo: i32, hi: i32) -> Vec<Vec<i32>> {
        if hi - lo == 1 {
            return vec![vec![lo]];
        }
        let mut ret = Vec::new();
        for split in lo + 1..hi {
            for l in trees(lo, split) {
                for r in trees(split, hi) {
                    let mut t = vec![OPERATOR];
                    t.extend(&l);
                    t.extend(&r);
                    ret.push(t);
                }
            }
        }
        ret
    }
    assert!(n >= 1);
    trees(0, n as i32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
    Xor,
}

/// Generates every distinct binary decomposition of a factored expression
///
/// Each n-ary operator is expanded into all binary tree shapes, for every ordering of its
/// children and every combination of the children's own decompositions. Or operators
/// become And with inverted edges and output.
///
/// Subexpressions keep every structurally distinct decomposition: sibling children may
/// share variables, so two orientations of a child are not interchangeable. Isomorphic
/// candidates are only discarded on complete patterns.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    arena: PatternArena,
    templates: Vec<Vec<Vec<i32>>>,
}

impl PatternGenerator {
    /// Create a generator for expressions with up to `max_inputs` variables
    ///
    /// Operators may have up to `max_inputs` children as well.
    pub fn new(max_inputs: usize) -> PatternGenerator {
        PatternGenerator {
            arena: PatternArena::new(max_inputs),
            templates: (0..=max_inputs.max(1))
                .map(|n| {
                    if n == 0 {
                        Vec::new()
                    } else {
                        binary_tree_templates(n)
                    }
                })
                .collect(),
        }
    }

    /// Shared node arena
    pub fn arena(&self) -> &PatternArena {
        &self.arena
    }

    /// Shared node arena, to add patterns directly
    pub fn arena_mut(&mut self) -> &mut PatternArena {
        &mut self.arena
    }

    /// Returns whether the expression can be expanded by this generator
    pub fn supports(&self, expr: &Expr) -> bool {
        expr.nb_vars() <= self.arena.nb_inputs()
            && expr.max_arity() < self.templates.len()
            && !expr.has_inner_constant()
            && !expr.is_constant()
    }

    /// Expand an expression into its non-isomorphic patterns
    pub fn generate(&mut self, expr: &Expr) -> Vec<PatternEdge> {
        assert!(self.supports(expr), "Unsupported expression {expr}");
        let candidates = self.expand(expr);
        self.dedup(candidates)
    }

    fn expand(&mut self, expr: &Expr) -> Vec<PatternEdge> {
        let (op, children) = match expr {
            Expr::Literal { var, inverted } => {
                return vec![self.arena.input(*var as usize) ^ *inverted];
            }
            Expr::Zero | Expr::One => panic!("Constants cannot be expanded"),
            Expr::And(v) => (Operator::And, v),
            Expr::Or(v) => (Operator::Or, v),
            Expr::Xor(v) => (Operator::Xor, v),
        };
        let child_sets: Vec<Vec<PatternEdge>> = children.iter().map(|c| self.expand(c)).collect();
        let n = child_sets.len();
        let templates = self.templates[n].clone();
        let mut candidates = Vec::new();
        for perm in (0..n).permutations(n) {
            let ordered: Vec<&Vec<PatternEdge>> = perm.iter().map(|i| &child_sets[*i]).collect();
            for template in &templates {
                for leaves in ordered
                    .iter()
                    .map(|s| s.iter().copied())
                    .multi_cartesian_product()
                {
                    let mut pos = 0;
                    let root = self.build_tree(op, &leaves, template, &mut pos);
                    candidates.push(root);
                }
            }
        }
        // Hash-consing makes identical structures share the same edge
        let mut seen = FxHashSet::default();
        candidates.retain(|c| seen.insert(*c));
        candidates
    }

    fn build_tree(
        &mut self,
        op: Operator,
        leaves: &[PatternEdge],
        template: &[i32],
        pos: &mut usize,
    ) -> PatternEdge {
        let t = template[*pos];
        *pos += 1;
        if t != OPERATOR {
            return leaves[t as usize];
        }
        let l = self.build_tree(op, leaves, template, pos);
        let r = self.build_tree(op, leaves, template, pos);
        match op {
            Operator::And => self.arena.and(l, r),
            Operator::Or => !self.arena.and(!l, !r),
            Operator::Xor => self.arena.xor(l, r),
        }
    }

    /// Remove isomorphic patterns, keeping the first of each kind
    pub fn dedup(&self, patterns: Vec<PatternEdge>) -> Vec<PatternEdge> {
        let mut seen = FxHashSet::default();
        patterns
            .into_iter()
            .filter(|p| seen.insert(self.arena.signature(*p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_patterns(expr: &Expr, nb_vars: usize) -> usize {
        let mut g = PatternGenerator::new(6);
        let patterns = g.generate(expr);
        assert!(!patterns.is_empty());
        let inputs = [
            0xaaaa_aaaa_aaaa_aaaau64,
            0xcccc_cccc_cccc_cccc,
            0xf0f0_f0f0_f0f0_f0f0,
            0xff00_ff00_ff00_ff00,
            0xffff_0000_ffff_0000,
            0xffff_ffff_0000_0000,
        ];
        let expected = expr.eval_words(&inputs[..nb_vars.max(expr.nb_vars())]);
        for p in &patterns {
            assert_eq!(g.arena().eval_words(*p, &inputs), expected);
        }
        let sigs: FxHashSet<String> = patterns.iter().map(|p| g.arena().signature(*p)).collect();
        assert_eq!(sigs.len(), patterns.len());
        patterns.len()
    }

    #[test]
    fn test_templates() {
        let counts: Vec<usize> = (1..=6).map(|n| binary_tree_templates(n).len()).collect();
        assert_eq!(counts, vec![1, 1, 2, 5, 14, 42]);
        assert_eq!(
            binary_tree_templates(3),
            vec![vec![-1, 0, -1, 1, 2], vec![-1, -1, 0, 1, 2]]
        );
    }

    #[test]
    fn test_simple_gates() {
        let v: Vec<Expr> = (0..4).map(Expr::var).collect();
        // All groupings of a 2-input And are isomorphic
        assert_eq!(check_patterns(&Expr::and(v[..2].to_vec()), 2), 1);
        assert_eq!(check_patterns(&!Expr::and(v[..2].to_vec()), 2), 1);
        assert_eq!(check_patterns(&Expr::or(v[..2].to_vec()), 2), 1);
        // Fanin order matters, so the 24 orderings of 5 shapes reduce to the 5 shapes
        assert_eq!(check_patterns(&Expr::and(v.clone()), 4), 5);
        assert_eq!(check_patterns(&Expr::xor(v[..3].to_vec()), 3), 2);
    }

    #[test]
    fn test_complex_gates() {
        let v: Vec<Expr> = (0..4).map(Expr::var).collect();
        let aoi22 = !Expr::or(vec![
            Expr::and(v[..2].to_vec()),
            Expr::and(v[2..].to_vec()),
        ]);
        assert_eq!(check_patterns(&aoi22, 4), 1);
        let aoi21 = !Expr::or(vec![Expr::and(v[..2].to_vec()), v[2].clone()]);
        assert_eq!(check_patterns(&aoi21, 3), 2);
        let mux = Expr::or(vec![
            Expr::and(vec![Expr::not_var(2), v[0].clone()]),
            Expr::and(vec![v[2].clone(), v[1].clone()]),
        ]);
        assert!(check_patterns(&mux, 3) >= 1);
        let maj = Expr::or(vec![
            Expr::and(vec![v[0].clone(), v[1].clone()]),
            Expr::and(vec![v[0].clone(), v[2].clone()]),
            Expr::and(vec![v[1].clone(), v[2].clone()]),
        ]);
        check_patterns(&maj, 3);
    }

    #[test]
    fn test_shared_variable_orientations() {
        // Both branches use x2: the two orientations of x2 & x1 give patterns that are not
        // renamings of each other once combined with the other branch
        let mut g = PatternGenerator::new(6);
        let mux = Expr::or(vec![
            Expr::and(vec![Expr::not_var(2), Expr::var(0)]),
            Expr::and(vec![Expr::var(2), Expr::var(1)]),
        ]);
        let patterns = g.generate(&mux);
        let arena = g.arena();
        let x2 = arena.input(2);
        let x1 = arena.input(1);
        let contains_and = |p: PatternEdge, a: PatternEdge, b: PatternEdge| {
            let mut stack = vec![p];
            while let Some(e) = stack.pop() {
                let n = arena.node(e.node);
                if let crate::patgen::PatternNode::And(f) = n {
                    if f[0].node == a.node && f[1].node == b.node {
                        return true;
                    }
                }
                stack.extend(n.fanins());
            }
            false
        };
        assert!(patterns.iter().any(|p| contains_and(*p, x1, x2)));
        assert!(patterns.iter().any(|p| contains_and(*p, x2, x1)));
        // 2 orders of the Or times 2 orientations of each And, none isomorphic
        assert_eq!(patterns.len(), 8);
    }

    #[test]
    fn test_dedup_reduces_candidates() {
        let v: Vec<Expr> = (0..3).map(Expr::var).collect();
        let e = Expr::and(v);
        // 3! orderings times 2 shapes
        let k = 6 * binary_tree_templates(3).len();
        assert!(check_patterns(&e, 3) < k);
    }
}
