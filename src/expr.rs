//! Factored Boolean expressions, used to describe the function of library cells
//!
//! ```
//! # use cellmap::Expr;
//! // An And-Or-Invert cell: !((a & b) | c)
//! let aoi = !Expr::or(vec![Expr::and(vec![Expr::var(0), Expr::var(1)]), Expr::var(2)]);
//! assert_eq!(aoi.nb_vars(), 3);
//! assert_eq!(aoi.to_string(), "(!A | !B) & !C");
//! ```

use std::fmt;
use std::ops::Not;

use volute::Lut;

/// Factored form of a single-output Boolean function
///
/// Operators are n-ary and may not share sub-terms. Inversions only appear on literals:
/// the `Not` operator pushes them down with De Morgan's laws.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Constant zero
    Zero,
    /// Constant one
    One,
    /// A variable or its complement
    Literal {
        /// Index of the variable, i.e. of the cell input pin
        var: u32,
        /// Whether the variable is complemented
        inverted: bool,
    },
    /// Conjunction of the children
    And(Vec<Expr>),
    /// Disjunction of the children
    Or(Vec<Expr>),
    /// Exclusive-or of the children
    Xor(Vec<Expr>),
}

impl Expr {
    /// Positive literal
    pub fn var(var: u32) -> Expr {
        Expr::Literal {
            var,
            inverted: false,
        }
    }

    /// Negative literal
    pub fn not_var(var: u32) -> Expr {
        Expr::Literal {
            var,
            inverted: true,
        }
    }

    /// Literal with a given polarity
    pub fn literal(var: u32, inverted: bool) -> Expr {
        Expr::Literal { var, inverted }
    }

    /// N-ary And; nested Ands are flattened and a single child is returned as is
    pub fn and(children: Vec<Expr>) -> Expr {
        Self::flatten(children, Expr::One, Expr::And, |e| match e {
            Expr::And(v) => Ok(v),
            e => Err(e),
        })
    }

    /// N-ary Or; nested Ors are flattened and a single child is returned as is
    pub fn or(children: Vec<Expr>) -> Expr {
        Self::flatten(children, Expr::Zero, Expr::Or, |e| match e {
            Expr::Or(v) => Ok(v),
            e => Err(e),
        })
    }

    /// N-ary Xor; nested Xors are flattened and a single child is returned as is
    pub fn xor(children: Vec<Expr>) -> Expr {
        Self::flatten(children, Expr::Zero, Expr::Xor, |e| match e {
            Expr::Xor(v) => Ok(v),
            e => Err(e),
        })
    }

    fn flatten<C, S>(children: Vec<Expr>, empty: Expr, make: C, split: S) -> Expr
    where
        C: Fn(Vec<Expr>) -> Expr,
        S: Fn(Expr) -> Result<Vec<Expr>, Expr>,
    {
        let mut flat = Vec::with_capacity(children.len());
        for c in children {
            match split(c) {
                Ok(v) => flat.extend(v),
                Err(e) => flat.push(e),
            }
        }
        match flat.len() {
            0 => empty,
            1 => flat.pop().unwrap_or(empty),
            _ => make(flat),
        }
    }

    /// Children of an operator; empty for literals and constants
    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::And(v) | Expr::Or(v) | Expr::Xor(v) => v,
            _ => &[],
        }
    }

    /// Returns whether the expression is a constant
    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Zero | Expr::One)
    }

    /// Returns whether the expression is a single literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal { .. })
    }

    /// Number of variables: one more than the largest variable index
    pub fn nb_vars(&self) -> usize {
        match self {
            Expr::Zero | Expr::One => 0,
            Expr::Literal { var, .. } => *var as usize + 1,
            _ => self
                .children()
                .iter()
                .map(|c| c.nb_vars())
                .max()
                .unwrap_or(0),
        }
    }

    /// Number of literal occurrences
    pub fn nb_literals(&self) -> usize {
        match self {
            Expr::Zero | Expr::One => 0,
            Expr::Literal { .. } => 1,
            _ => self.children().iter().map(|c| c.nb_literals()).sum(),
        }
    }

    /// Largest number of children of an operator
    pub fn max_arity(&self) -> usize {
        self.children()
            .iter()
            .map(|c| c.max_arity())
            .max()
            .unwrap_or(0)
            .max(self.children().len())
    }

    /// Returns whether a constant appears below an operator
    pub fn has_inner_constant(&self) -> bool {
        self.children()
            .iter()
            .any(|c| c.is_constant() || c.has_inner_constant())
    }

    /// Mark the variables that appear in the expression
    pub fn support(&self, nb_vars: usize) -> Vec<bool> {
        let mut ret = vec![false; nb_vars];
        self.visit_literals(&mut |var, _| {
            if (var as usize) < nb_vars {
                ret[var as usize] = true;
            }
        });
        ret
    }

    fn visit_literals<F: FnMut(u32, bool)>(&self, f: &mut F) {
        match self {
            Expr::Literal { var, inverted } => f(*var, *inverted),
            _ => {
                for c in self.children() {
                    c.visit_literals(f);
                }
            }
        }
    }

    /// Rename the variables: variable `v` becomes `map[v].0`, complemented if `map[v].1`
    pub fn remap(&self, map: &[(u32, bool)]) -> Expr {
        match self {
            Expr::Zero => Expr::Zero,
            Expr::One => Expr::One,
            Expr::Literal { var, inverted } => {
                let (v, inv) = map[*var as usize];
                Expr::literal(v, inverted ^ inv)
            }
            Expr::And(v) => Expr::And(v.iter().map(|c| c.remap(map)).collect()),
            Expr::Or(v) => Expr::Or(v.iter().map(|c| c.remap(map)).collect()),
            Expr::Xor(v) => Expr::Xor(v.iter().map(|c| c.remap(map)).collect()),
        }
    }

    /// Evaluate the expression on 64 input patterns at once
    pub fn eval_words(&self, inputs: &[u64]) -> u64 {
        match self {
            Expr::Zero => 0,
            Expr::One => !0,
            Expr::Literal { var, inverted } => {
                let v = inputs[*var as usize];
                if *inverted {
                    !v
                } else {
                    v
                }
            }
            Expr::And(v) => v.iter().fold(!0, |acc, c| acc & c.eval_words(inputs)),
            Expr::Or(v) => v.iter().fold(0, |acc, c| acc | c.eval_words(inputs)),
            Expr::Xor(v) => v.iter().fold(0, |acc, c| acc ^ c.eval_words(inputs)),
        }
    }

    /// Evaluate the expression on a single input pattern
    pub fn eval(&self, inputs: &[bool]) -> bool {
        let words: Vec<u64> = inputs.iter().map(|b| if *b { !0 } else { 0 }).collect();
        self.eval_words(&words) & 1 != 0
    }

    /// Truth table of the expression over `nb_vars` variables
    pub fn to_lut(&self, nb_vars: usize) -> Lut {
        assert!(nb_vars >= self.nb_vars());
        let mut ret = Lut::zero(nb_vars);
        let mut inputs = vec![false; nb_vars];
        for mask in 0..(1usize << nb_vars) {
            for (i, b) in inputs.iter_mut().enumerate() {
                *b = (mask >> i) & 1 != 0;
            }
            if self.eval(&inputs) {
                ret.set_bit(mask);
            }
        }
        ret
    }
}

impl Not for Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        match self {
            Expr::Zero => Expr::One,
            Expr::One => Expr::Zero,
            Expr::Literal { var, inverted } => Expr::literal(var, !inverted),
            Expr::And(v) => Expr::Or(v.into_iter().map(|c| !c).collect()),
            Expr::Or(v) => Expr::And(v.into_iter().map(|c| !c).collect()),
            Expr::Xor(mut v) => {
                if let Some(first) = v.first_mut() {
                    let c = std::mem::replace(first, Expr::Zero);
                    *first = !c;
                }
                Expr::Xor(v)
            }
        }
    }
}

impl Not for &'_ Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        !self.clone()
    }
}

fn var_name(var: u32) -> String {
    if var < 26 {
        char::from(b'A' + var as u8).to_string()
    } else {
        format!("V{var}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = match self {
            Expr::Zero => return write!(f, "0"),
            Expr::One => return write!(f, "1"),
            Expr::Literal { var, inverted } => {
                if *inverted {
                    write!(f, "!")?;
                }
                return write!(f, "{}", var_name(*var));
            }
            Expr::And(_) => " & ",
            Expr::Or(_) => " | ",
            Expr::Xor(_) => " ^ ",
        };
        for (i, c) in self.children().iter().enumerate() {
            if i != 0 {
                write!(f, "{sep}")?;
            }
            if c.children().is_empty() {
                write!(f, "{c}")?;
            } else {
                write!(f, "({c})")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Expr;

    fn a() -> Expr {
        Expr::var(0)
    }

    fn b() -> Expr {
        Expr::var(1)
    }

    fn c() -> Expr {
        Expr::var(2)
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Expr::and(vec![]), Expr::One);
        assert_eq!(Expr::or(vec![a()]), a());
        let e = Expr::and(vec![Expr::and(vec![a(), b()]), c()]);
        assert_eq!(e, Expr::And(vec![a(), b(), c()]));
        assert_eq!(e.max_arity(), 3);
        assert_eq!(e.nb_literals(), 3);
        let x = Expr::xor(vec![a(), Expr::or(vec![b(), c()])]);
        assert_eq!(x.max_arity(), 2);
        assert_eq!(x.to_string(), "A ^ (B | C)");
    }

    #[test]
    fn test_not() {
        let e = !Expr::and(vec![a(), Expr::not_var(1)]);
        assert_eq!(e, Expr::Or(vec![Expr::not_var(0), b()]));
        let x = !Expr::xor(vec![a(), b()]);
        assert_eq!(x, Expr::Xor(vec![Expr::not_var(0), b()]));
        for mask in 0..4 {
            let inputs = [mask & 1 != 0, mask & 2 != 0];
            assert_eq!(x.eval(&inputs), inputs[0] == inputs[1]);
        }
    }

    #[test]
    fn test_eval_and_lut() {
        // Majority of three
        let maj = Expr::or(vec![
            Expr::and(vec![a(), b()]),
            Expr::and(vec![a(), c()]),
            Expr::and(vec![b(), c()]),
        ]);
        let lut = maj.to_lut(3);
        for mask in 0..8usize {
            let expected = mask.count_ones() >= 2;
            assert_eq!(lut.value(mask), expected);
        }
        assert_eq!(maj.eval_words(&[0xAA, 0xCC, 0xF0]), 0xE8);
    }

    #[test]
    fn test_remap_and_support() {
        let e = Expr::and(vec![a(), Expr::not_var(2)]);
        assert_eq!(e.support(3), vec![true, false, true]);
        let r = e.remap(&[(1, true), (0, false), (0, false)]);
        assert_eq!(r, Expr::And(vec![Expr::not_var(1), Expr::not_var(0)]));
        assert!(!r.has_inner_constant());
        assert!(Expr::And(vec![a(), Expr::One]).has_inner_constant());
    }
}
