//! NPN transforms of small truth tables
//!
//! Truth tables of up to 6 variables are handled as 64-bit words, bit `m` holding the
//! value of the function for minterm `m` (variable `i` is bit `i` of `m`).

use itertools::Itertools;
use volute::Lut;

/// Maximum number of inputs handled by the NPN canonization
pub const MAX_NPN_INPUTS: usize = 6;

/// Mapping between the variables of a function and those of its representative
///
/// With `F` the function and `R` the representative, `F(x) = R(y) ^ output_inv`
/// where `y[pos[i]] = x[i] ^ inv[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NpnMap {
    inputs: Vec<(usize, bool)>,
    output_inv: bool,
}

impl NpnMap {
    /// Identity map on n variables
    pub fn identity(n: usize) -> NpnMap {
        NpnMap {
            inputs: (0..n).map(|i| (i, false)).collect(),
            output_inv: false,
        }
    }

    /// Create a map from its input correspondence and output inversion
    pub fn new(inputs: Vec<(usize, bool)>, output_inv: bool) -> NpnMap {
        NpnMap { inputs, output_inv }
    }

    /// Number of inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Position in the representative and inversion of input i
    pub fn input(&self, i: usize) -> (usize, bool) {
        self.inputs[i]
    }

    /// Inversion of the output
    pub fn output_inv(&self) -> bool {
        self.output_inv
    }

    /// Returns whether the positions form a permutation
    pub fn is_valid(&self) -> bool {
        let mut seen = vec![false; self.inputs.len()];
        for (pos, _) in &self.inputs {
            if *pos >= seen.len() || seen[*pos] {
                return false;
            }
            seen[*pos] = true;
        }
        true
    }

    /// Compute the representative `R` of a function `F` under this map
    pub fn transform(&self, f: u64) -> u64 {
        let n = self.inputs.len();
        let mut r = 0u64;
        for y in 0..(1usize << n) {
            let mut x = 0usize;
            for (i, (pos, inv)) in self.inputs.iter().enumerate() {
                let bit = ((y >> pos) & 1 != 0) ^ inv;
                x |= (bit as usize) << i;
            }
            let v = ((f >> x) & 1 != 0) ^ self.output_inv;
            r |= (v as u64) << y;
        }
        r
    }
}

/// Mask of the valid bits of a truth table
pub fn table_mask(n: usize) -> u64 {
    assert!(n <= MAX_NPN_INPUTS);
    if n == MAX_NPN_INPUTS {
        !0
    } else {
        (1u64 << (1 << n)) - 1
    }
}

/// Truth table as a word
pub fn lut_to_bits(lut: &Lut) -> u64 {
    let n = lut.num_vars();
    assert!(n <= MAX_NPN_INPUTS);
    let mut ret = 0u64;
    for m in 0..(1usize << n) {
        if lut.value(m) {
            ret |= 1 << m;
        }
    }
    ret
}

/// Word as a truth table
pub fn bits_to_lut(n: usize, bits: u64) -> Lut {
    assert!(n <= MAX_NPN_INPUTS);
    let mut ret = Lut::zero(n);
    for m in 0..(1usize << n) {
        if (bits >> m) & 1 != 0 {
            ret.set_bit(m);
        }
    }
    ret
}

/// Compute the NPN-canonical form of a function, with the map from the function to it
///
/// The canonical form is the smallest truth table over all input permutations, input
/// negations and output negation. The first transform reaching it, in enumeration order,
/// is returned.
pub fn npn_canonize(n: usize, f: u64) -> (u64, NpnMap) {
    let mask = table_mask(n);
    let f = f & mask;
    if n == 0 {
        let inv = f & 1 != 0;
        return (0, NpnMap::new(Vec::new(), inv));
    }
    let mut best = (f, NpnMap::identity(n));
    for perm in (0..n).permutations(n) {
        for neg in 0..(1usize << n) {
            let inputs: Vec<(usize, bool)> = perm
                .iter()
                .enumerate()
                .map(|(i, p)| (*p, (neg >> i) & 1 != 0))
                .collect();
            let mut map = NpnMap::new(inputs, false);
            let r = map.transform(f);
            if r < best.0 {
                best = (r, map.clone());
            }
            let r_inv = !r & mask;
            if r_inv < best.0 {
                map.output_inv = true;
                best = (r_inv, map);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_and_literals() {
        assert_eq!(npn_canonize(0, 0), (0, NpnMap::new(vec![], false)));
        assert_eq!(npn_canonize(0, 1), (0, NpnMap::new(vec![], true)));
        // Buffer and inverter share the same representative
        let (rb, mb) = npn_canonize(1, 0b10);
        let (ri, mi) = npn_canonize(1, 0b01);
        assert_eq!(rb, ri);
        assert_eq!(mb.transform(0b10), rb);
        assert_eq!(mi.transform(0b01), ri);
    }

    #[test]
    fn test_and_or_class() {
        // And2, Or2, Nand2, Nor2 and And with an inverted input share a class
        let tables = [0b1000u64, 0b1110, 0b0111, 0b0001, 0b0100, 0b0010];
        let (rep, _) = npn_canonize(2, tables[0]);
        for t in tables {
            let (r, map) = npn_canonize(2, t);
            assert_eq!(r, rep);
            assert!(map.is_valid());
            assert_eq!(map.transform(t), r);
        }
        let (x, _) = npn_canonize(2, 0b0110);
        assert_ne!(x, rep);
        let (xn, _) = npn_canonize(2, 0b1001);
        assert_eq!(x, xn);
    }

    #[test]
    fn test_idempotent() {
        for f in [0x96u64, 0xe8, 0x1234_5678_9abc_def0, 0x8000, 0x6996] {
            let n = if f > 0xffff { 6 } else if f > 0xff { 4 } else { 3 };
            let (r, map) = npn_canonize(n, f);
            assert_eq!(map.transform(f), r);
            let (r2, map2) = npn_canonize(n, r);
            assert_eq!(r2, r);
            assert_eq!(map2, NpnMap::identity(n));
        }
    }

    #[test]
    fn test_lut_conversion() {
        let lut = bits_to_lut(3, 0xe8);
        assert_eq!(lut.num_vars(), 3);
        assert!(lut.value(3));
        assert!(!lut.value(4));
        assert_eq!(lut_to_bits(&lut), 0xe8);
        assert_eq!(table_mask(2), 0xf);
        assert_eq!(table_mask(6), !0);
    }
}
