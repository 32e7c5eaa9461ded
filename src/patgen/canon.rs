//! Content-addressed table of Boolean functions and their NPN classes

use fxhash::FxHashMap;
use volute::Lut;

use crate::patgen::npn::{bits_to_lut, lut_to_bits, npn_canonize, NpnMap, MAX_NPN_INPUTS};

/// Function group of the constant zero
pub const CONST0_GROUP: usize = 0;
/// Function group of the constant one
pub const CONST1_GROUP: usize = 1;
/// Function group of the buffer
pub const BUFFER_GROUP: usize = 2;
/// Function group of the inverter
pub const INVERTER_GROUP: usize = 3;

#[derive(Debug, Clone)]
struct FunctionEntry {
    function: Lut,
    map: NpnMap,
    rep: usize,
}

#[derive(Debug, Clone)]
struct RepresentativeEntry {
    function: Lut,
    groups: Vec<usize>,
}

/// Assigns stable ids to Boolean functions and groups them by NPN equivalence
///
/// Identical truth tables always get the same function id. Each function belongs to
/// one representative class, identified by its canonical truth table. The four
/// well-known functions are registered first: constant zero, constant one, buffer and
/// inverter, with ids 0 to 3.
#[derive(Debug, Clone)]
pub struct FunctionCanonicalizer {
    functions: FxHashMap<Lut, usize>,
    reps: FxHashMap<Lut, usize>,
    entries: Vec<FunctionEntry>,
    rep_entries: Vec<RepresentativeEntry>,
}

impl FunctionCanonicalizer {
    /// Create the table with the four well-known functions
    pub fn new() -> Self {
        let mut ret = FunctionCanonicalizer {
            functions: FxHashMap::default(),
            reps: FxHashMap::default(),
            entries: Vec::new(),
            rep_entries: Vec::new(),
        };
        let c0 = ret.canonicalize(&bits_to_lut(0, 0));
        let c1 = ret.canonicalize(&bits_to_lut(0, 1));
        let buf = ret.canonicalize(&bits_to_lut(1, 0b10));
        let inv = ret.canonicalize(&bits_to_lut(1, 0b01));
        assert_eq!(
            [c0, c1, buf, inv],
            [CONST0_GROUP, CONST1_GROUP, BUFFER_GROUP, INVERTER_GROUP]
        );
        ret
    }

    /// Obtain the id of a function, registering it if needed
    pub fn canonicalize(&mut self, lut: &Lut) -> usize {
        if let Some(id) = self.functions.get(lut) {
            return *id;
        }
        let n = lut.num_vars();
        assert!(n <= MAX_NPN_INPUTS, "Functions are limited to 6 inputs");
        let (canonical, map) = npn_canonize(n, lut_to_bits(lut));
        let canonical = bits_to_lut(n, canonical);
        let id = self.entries.len();
        let rep = match self.reps.get(&canonical) {
            Some(r) => *r,
            None => {
                let r = self.rep_entries.len();
                self.rep_entries.push(RepresentativeEntry {
                    function: canonical.clone(),
                    groups: Vec::new(),
                });
                self.reps.insert(canonical, r);
                r
            }
        };
        self.rep_entries[rep].groups.push(id);
        self.entries.push(FunctionEntry {
            function: lut.clone(),
            map,
            rep,
        });
        self.functions.insert(lut.clone(), id);
        id
    }

    /// Number of functions
    pub fn nb_functions(&self) -> usize {
        self.entries.len()
    }

    /// Truth table of a function
    pub fn function(&self, id: usize) -> &Lut {
        &self.entries[id].function
    }

    /// Map from a function to its representative
    pub fn map(&self, id: usize) -> &NpnMap {
        &self.entries[id].map
    }

    /// Representative class of a function
    pub fn rep(&self, id: usize) -> usize {
        self.entries[id].rep
    }

    /// Number of representative classes
    pub fn nb_reps(&self) -> usize {
        self.rep_entries.len()
    }

    /// Canonical truth table of a representative class
    pub fn rep_function(&self, rep: usize) -> &Lut {
        &self.rep_entries[rep].function
    }

    /// Functions of a representative class, in registration order
    pub fn rep_groups(&self, rep: usize) -> &[usize] {
        &self.rep_entries[rep].groups
    }
}

impl Default for FunctionCanonicalizer {
    fn default() -> Self {
        Self::new()
    }
}
