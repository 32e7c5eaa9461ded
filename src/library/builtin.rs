//! A generic built-in library, used when no other library is available

use crate::library::{CellLibrary, CellLibraryBuilder, PinLayout, SequentialInfo, Sense};
use crate::network::RegisterKind;
use crate::Expr;

fn vars(n: u32) -> Vec<Expr> {
    (0..n).map(Expr::var).collect()
}

fn register(
    kind: RegisterKind,
    clock_sense: Sense,
    clear: Option<usize>,
    preset: Option<usize>,
    iq: Option<usize>,
) -> SequentialInfo {
    SequentialInfo {
        kind,
        clock_sense,
        clear_sense: if clear.is_some() {
            Sense::Negative
        } else {
            Sense::None
        },
        preset_sense: if preset.is_some() {
            Sense::Negative
        } else {
            Sense::None
        },
        layout: PinLayout {
            data: 0,
            clock: 1,
            clear,
            preset,
            q: 0,
            iq,
        },
    }
}

/// Generic library with inverters, buffers, tie cells, simple gates up to 4 inputs,
/// complex And-Or-Invert gates, a multiplexer, flip-flops and latches
///
/// Clears and presets are active-low.
pub fn generic_library() -> CellLibrary {
    let mut b = CellLibraryBuilder::new("generic");
    b.add_logic_cell("TIELO", 1.0, &[], "Y", Expr::Zero);
    b.add_logic_cell("TIEHI", 1.0, &[], "Y", Expr::One);
    b.add_logic_cell("INV", 1.0, &["A"], "Y", Expr::not_var(0));
    b.add_logic_cell("BUF", 1.5, &["A"], "Y", Expr::var(0));

    let pins = ["A", "B", "C", "D"];
    for n in 2..=4u32 {
        let ins = &pins[..n as usize];
        let w = 0.5 * n as f64;
        b.add_logic_cell(&format!("NAND{n}"), 0.5 + w, ins, "Y", !Expr::and(vars(n)));
        b.add_logic_cell(&format!("NOR{n}"), 0.5 + w, ins, "Y", !Expr::or(vars(n)));
        b.add_logic_cell(&format!("AND{n}"), 1.0 + w, ins, "Y", Expr::and(vars(n)));
        b.add_logic_cell(&format!("OR{n}"), 1.0 + w, ins, "Y", Expr::or(vars(n)));
    }
    b.add_logic_cell("XOR2", 3.0, &["A", "B"], "Y", Expr::xor(vars(2)));
    // Sum-of-products form, covered through the Xor pattern of its class
    b.add_logic_cell(
        "XNOR2",
        3.0,
        &["A", "B"],
        "Y",
        Expr::or(vec![
            Expr::and(vec![Expr::var(0), Expr::var(1)]),
            Expr::and(vec![Expr::not_var(0), Expr::not_var(1)]),
        ]),
    );
    b.add_logic_cell(
        "AOI21",
        2.0,
        &["A0", "A1", "B"],
        "Y",
        !Expr::or(vec![Expr::and(vars(2)), Expr::var(2)]),
    );
    b.add_logic_cell(
        "AOI22",
        2.5,
        &["A0", "A1", "B0", "B1"],
        "Y",
        !Expr::or(vec![
            Expr::and(vec![Expr::var(0), Expr::var(1)]),
            Expr::and(vec![Expr::var(2), Expr::var(3)]),
        ]),
    );
    b.add_logic_cell(
        "OAI21",
        2.0,
        &["A0", "A1", "B"],
        "Y",
        !Expr::and(vec![Expr::or(vars(2)), Expr::var(2)]),
    );
    b.add_logic_cell(
        "OAI22",
        2.5,
        &["A0", "A1", "B0", "B1"],
        "Y",
        !Expr::and(vec![
            Expr::or(vec![Expr::var(0), Expr::var(1)]),
            Expr::or(vec![Expr::var(2), Expr::var(3)]),
        ]),
    );
    b.add_logic_cell(
        "MUX2",
        3.5,
        &["A", "B", "S"],
        "Y",
        Expr::or(vec![
            Expr::and(vec![Expr::not_var(2), Expr::var(0)]),
            Expr::and(vec![Expr::var(2), Expr::var(1)]),
        ]),
    );

    use RegisterKind::*;
    let ff = |clear, preset| register(FlipFlop, Sense::Positive, clear, preset, Some(1));
    b.add_sequential_cell("DFF", 5.0, &["D", "CK"], &["Q", "QN"], ff(None, None));
    b.add_sequential_cell(
        "DFFN",
        5.0,
        &["D", "CKN"],
        &["Q", "QN"],
        register(FlipFlop, Sense::Negative, None, None, Some(1)),
    );
    b.add_sequential_cell(
        "DFFR",
        6.0,
        &["D", "CK", "RN"],
        &["Q", "QN"],
        ff(Some(2), None),
    );
    b.add_sequential_cell(
        "DFFS",
        6.0,
        &["D", "CK", "SN"],
        &["Q", "QN"],
        ff(None, Some(2)),
    );
    b.add_sequential_cell(
        "DFFRS",
        7.0,
        &["D", "CK", "RN", "SN"],
        &["Q", "QN"],
        ff(Some(2), Some(3)),
    );
    b.add_sequential_cell(
        "LATCH",
        4.0,
        &["D", "G"],
        &["Q"],
        register(Latch, Sense::Positive, None, None, None),
    );
    b.add_sequential_cell(
        "LATCHN",
        4.0,
        &["D", "GN"],
        &["Q"],
        register(Latch, Sense::Negative, None, None, None),
    );
    // The cells above are all well-formed
    match b.build() {
        Ok(lib) => lib,
        Err(e) => panic!("Invalid built-in library: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::generic_library;

    #[test]
    fn test_generic() {
        let lib = generic_library();
        assert_eq!(lib.name(), "generic");
        let nand2 = lib.find("NAND2").unwrap();
        assert_eq!(lib.cell(nand2).area(), 1.5);
        let f = lib.cell(nand2).logic().unwrap();
        assert!(!f.eval(&[true, true]));
        assert!(f.eval(&[true, false]));
        let mux = lib.cell(lib.find("MUX2").unwrap()).logic().unwrap();
        assert!(mux.eval(&[true, false, false]));
        assert!(!mux.eval(&[true, false, true]));
        let dffr = lib.cell(lib.find("DFFR").unwrap()).sequential().unwrap();
        assert!(dffr.clear_sense.is_negative());
        assert_eq!(dffr.layout.clear, Some(2));
    }
}
