//! IO for .bench (ISCAS) files

use std::io::{BufRead, BufReader, Read, Write};

use fxhash::FxHashMap;

use crate::library::CellLibrary;
use crate::network::{Register, RegisterKind};
use crate::techmap::{MappedNetwork, MappedNode};
use crate::{Gate, Network, Signal};

/// Name of the clock input added for DFF statements, whose clock is implicit
pub const IMPLICIT_CLOCK: &str = "CK";

/// A gate statement: output name, gate type and fanin names
struct Statement {
    name: String,
    kind: String,
    deps: Vec<String>,
}

impl Statement {
    fn is_register(&self) -> bool {
        matches!(self.kind.as_str(), "DFF" | "DFFRSE" | "LATCH")
    }

    fn check_arity(&self) -> Result<(), String> {
        let expected = match self.kind.as_str() {
            "DFF" | "BUF" | "BUFF" | "NOT" => Some(1),
            "LATCH" => Some(2),
            "DFFRSE" => Some(4),
            "VDD" | "VSS" | "GND" => Some(0),
            "AND" | "NAND" | "OR" | "NOR" | "XOR" | "XNOR" => None,
            _ => return Err(format!("Unknown gate type {}", self.kind)),
        };
        match expected {
            Some(n) if n != self.deps.len() => Err(format!(
                "Gate {} of type {} expects {} inputs, got {}",
                self.name,
                self.kind,
                n,
                self.deps.len()
            )),
            None if self.deps.is_empty() => {
                Err(format!("Gate {} of type {} has no input", self.name, self.kind))
            }
            _ => Ok(()),
        }
    }
}

/// Construction of a subject network from parsed statements
///
/// Registers are created first with unconnected pins, so that the combinatorial logic
/// can use their outputs. Combinatorial statements are built in dependency order, then
/// the register pins are connected.
struct BenchBuilder<'a> {
    statements: &'a [Statement],
    by_name: FxHashMap<&'a str, usize>,
    signals: FxHashMap<String, Signal>,
    /// Statements being built, to detect combinatorial loops
    on_path: Vec<bool>,
    network: Network,
}

impl<'a> BenchBuilder<'a> {
    fn new(statements: &'a [Statement], inputs: &[String]) -> Result<BenchBuilder<'a>, String> {
        let mut network = Network::new();
        let mut signals = FxHashMap::default();
        for name in inputs {
            let s = network.add_named_input(name.clone());
            if signals.insert(name.clone(), s).is_some() {
                return Err(format!("{name} is defined twice"));
            }
        }
        let mut by_name = FxHashMap::default();
        for (i, s) in statements.iter().enumerate() {
            if signals.contains_key(&s.name) || by_name.insert(s.name.as_str(), i).is_some() {
                return Err(format!("{} is defined twice", s.name));
            }
            s.check_arity()?;
        }
        // ABC-style naming for constant signals
        for (name, value) in [("vdd", Signal::one()), ("gnd", Signal::zero())] {
            if !by_name.contains_key(name) && !signals.contains_key(name) {
                signals.insert(name.to_string(), value);
            }
        }
        Ok(BenchBuilder {
            statements,
            by_name,
            signals,
            on_path: vec![false; statements.len()],
            network,
        })
    }

    fn create_registers(&mut self) {
        if self.statements.iter().any(|s| s.kind == "DFF" || s.kind == "DFFRSE")
            && !self.signals.contains_key(IMPLICIT_CLOCK)
        {
            let clock = self.network.add_named_input(IMPLICIT_CLOCK.to_string());
            self.signals.insert(IMPLICIT_CLOCK.to_string(), clock);
        }
        let p = Signal::placeholder();
        for s in self.statements.iter().filter(|s| s.is_register()) {
            let kind = if s.kind == "LATCH" {
                RegisterKind::Latch
            } else {
                RegisterKind::FlipFlop
            };
            let sig = self.network.add(Gate::Register(Register::new(kind, p, p, p, p)));
            self.signals.insert(s.name.clone(), sig);
        }
    }

    fn fanin(&self, name: &str) -> Result<Signal, String> {
        self.signals
            .get(name)
            .copied()
            .ok_or_else(|| format!("Gate input {name} is not generated anywhere"))
    }

    /// Build a combinatorial statement and everything it depends on
    fn build(&mut self, root: usize) -> Result<(), String> {
        let statements = self.statements;
        let mut stack = vec![(root, false)];
        while let Some((i, expanded)) = stack.pop() {
            let st = &statements[i];
            if expanded {
                self.on_path[i] = false;
                let sig = self.make_gate(st)?;
                self.signals.insert(st.name.clone(), sig);
                continue;
            }
            if self.signals.contains_key(&st.name) {
                continue;
            }
            self.on_path[i] = true;
            stack.push((i, true));
            for d in &st.deps {
                if self.signals.contains_key(d) {
                    continue;
                }
                let Some(j) = self.by_name.get(d.as_str()).copied() else {
                    return Err(format!("Gate input {d} is not generated anywhere"));
                };
                if self.on_path[j] {
                    return Err(format!("Combinatorial loop through {d}"));
                }
                stack.push((j, false));
            }
        }
        Ok(())
    }

    /// Create the gates of a statement whose fanins are all available
    fn make_gate(&mut self, st: &Statement) -> Result<Signal, String> {
        let sigs = st
            .deps
            .iter()
            .map(|d| self.fanin(d))
            .collect::<Result<Vec<_>, _>>()?;
        let n = &mut self.network;
        Ok(match st.kind.as_str() {
            "BUF" | "BUFF" => sigs[0],
            "NOT" => !sigs[0],
            "VDD" => Signal::one(),
            "VSS" | "GND" => Signal::zero(),
            "AND" => n.and_n(&sigs),
            "NAND" => !n.and_n(&sigs),
            "OR" => n.or_n(&sigs),
            "NOR" => !n.or_n(&sigs),
            "XOR" => n.xor_n(&sigs),
            "XNOR" => !n.xor_n(&sigs),
            k => return Err(format!("Unknown gate type {k}")),
        })
    }

    fn connect_registers(&mut self) -> Result<(), String> {
        for st in self.statements.iter().filter(|s| s.is_register()) {
            let sig = self.fanin(&st.name)?;
            let deps = st
                .deps
                .iter()
                .map(|d| self.fanin(d))
                .collect::<Result<Vec<_>, _>>()?;
            let pins = match st.kind.as_str() {
                "DFF" => [
                    deps[0],
                    self.fanin(IMPLICIT_CLOCK)?,
                    Signal::zero(),
                    Signal::zero(),
                ],
                "LATCH" => [deps[0], deps[1], Signal::zero(), Signal::zero()],
                _ => {
                    // DFFRSE(data, reset, set, enable): the enable is a feedback multiplexer
                    let data = self.network.mux(deps[3], deps[0], sig);
                    [data, self.fanin(IMPLICIT_CLOCK)?, deps[1], deps[2]]
                }
            };
            self.network.set_register_pins(sig.var() as usize, pins);
        }
        Ok(())
    }
}

fn network_from_statements(
    statements: &[Statement],
    inputs: &[String],
    outputs: &[String],
) -> Result<Network, String> {
    let mut builder = BenchBuilder::new(statements, inputs)?;
    builder.create_registers();
    for (i, st) in statements.iter().enumerate() {
        if !st.is_register() {
            builder.build(i)?;
        }
    }
    builder.connect_registers()?;
    for o in outputs {
        let s = builder.fanin(o)?;
        builder.network.add_named_output(o.clone(), s);
    }
    builder.network.check();
    Ok(builder.network)
}

/// Read a network in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = OR(x0, i0)
///     x3 = NOR(i0, x1)
///     x4 = XOR(x3, x2)
///     x5 = BUF(x4)
///     x6 = NOT(x5)
///     x7 = gnd
///     x8 = DFF(x6)
///     OUTPUT(x8)
/// ```
///
/// N-ary gates are decomposed into balanced trees of 2-input gates. DFF statements share
/// an implicit clock input, named `CK`, added after the declared inputs. DFFRSE statements
/// take data, reset, set and enable; LATCH statements take data and enable.
pub fn read_bench<R: Read>(r: R) -> Result<Network, String> {
    let mut statements = Vec::new();
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for l in BufReader::new(r).lines() {
        let s = l.map_err(|e| format!("Error during file IO: {e}"))?;
        let t = s.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        if !t.contains('=') {
            let parts: Vec<_> = t
                .split(['(', ')'])
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() != 2 {
                return Err(format!("Invalid statement {t}"));
            }
            if ["INPUT", "PINPUT"].contains(&parts[0]) {
                inputs.push(parts[1].to_string());
            } else if ["OUTPUT", "POUTPUT"].contains(&parts[0]) {
                outputs.push(parts[1].to_string());
            } else {
                return Err(format!("Unknown keyword {}", parts[0]));
            }
        } else {
            let mut parts = t
                .split(['=', '(', ',', ')'])
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty());
            let (Some(name), Some(kind)) = (parts.next(), parts.next()) else {
                return Err(format!("Invalid statement {t}"));
            };
            statements.push(Statement {
                name,
                kind: kind.to_uppercase(),
                deps: parts.collect(),
            });
        }
    }
    network_from_statements(&statements, &inputs, &outputs)
}

/// Write a mapped network as a .bench-style netlist of cell instances
///
/// Each cell instance drives the net of its first output; the other outputs of
/// multi-output cells are written as `n5 = n4.QN`. Primary outputs are aliases of their
/// driver nets:
/// ```text
///     INPUT(a)
///     INPUT(b)
///     OUTPUT(y)
///     n2 = NAND2(a, b)
///     y = n2
/// ```
pub fn write_mapped_bench<W: Write>(
    w: &mut W,
    network: &MappedNetwork,
    library: &CellLibrary,
) -> std::io::Result<()> {
    let net_name = |i: usize| match network.node(i) {
        MappedNode::Input(k) => network.input_name(*k).to_string(),
        _ => format!("n{i}"),
    };
    writeln!(w, "# .bench (ISCAS) netlist")?;
    writeln!(w, "# Mapped with library {}", library.name())?;
    for i in 0..network.nb_inputs() {
        writeln!(w, "INPUT({})", network.input_name(i))?;
    }
    writeln!(w)?;
    for i in 0..network.nb_outputs() {
        writeln!(w, "OUTPUT({})", network.output_name(i))?;
    }
    writeln!(w)?;
    for i in 0..network.nb_nodes() {
        match network.node(i) {
            MappedNode::Cell { cell, fanins } => {
                let rep = fanins
                    .iter()
                    .map(|f| net_name(*f))
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(w, "{} = {}({})", net_name(i), library.cell(*cell).name(), rep)?;
            }
            MappedNode::Tap { node, pin } => {
                let MappedNode::Cell { cell, .. } = network.node(*node) else {
                    unreachable!()
                };
                writeln!(
                    w,
                    "{} = {}.{}",
                    net_name(i),
                    net_name(*node),
                    library.cell(*cell).output_name(*pin)
                )?;
            }
            MappedNode::Input(_) | MappedNode::Output { .. } => (),
        }
    }
    for i in 0..network.nb_outputs() {
        writeln!(
            w,
            "{} = {}",
            network.output_name(i),
            net_name(network.output_driver(i))
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::generic_library;
    use crate::sim::{simulate, simulate_mapped};
    use crate::{area_map, LibraryIndex};

    #[test]
    fn test_basic_read() {
        let example = "# .bench (ISCAS) file
INPUT(i0)
INPUT(i1)

OUTPUT(x0)
OUTPUT(x1)
OUTPUT(x2)
OUTPUT(x3)
OUTPUT(x4)
OUTPUT(x5)
OUTPUT(x6)

x6 = NOT(x2)
x0 = AND(i0, i1)
x1 = NAND(i0, i1)
x2 = OR(i0, i1)
x3 = NOR(i0, i1)
x4 = XOR(i0, i1)
x5 = BUF(i0)
x7 = gnd
x8 = vdd
x9 = XOR(  i0, i1 )
x10   =  gnd
x11 = AND(x0, x1, x2, x3)
";
        let net = read_bench(example.as_bytes()).unwrap();
        assert_eq!(net.nb_inputs(), 2);
        assert_eq!(net.nb_outputs(), 7);
        assert_eq!(net.output_name(4), "x4");
        assert_eq!(net.output(5), net.input(0));
        assert_eq!(net.output(6), !net.output(2));
        let values = simulate(&net, &[vec![true, false]]);
        assert_eq!(
            values[0],
            vec![false, true, true, false, true, true, false]
        );
    }

    #[test]
    fn test_registers() {
        let example = "INPUT(d)
INPUT(en)
INPUT(rst)
OUTPUT(q2)
q0 = DFF(x)
x = XOR(d, q2)
q1 = LATCH(q0, en)
q2 = DFFRSE(q1, rst, gnd, en)
";
        let net = read_bench(example.as_bytes()).unwrap();
        assert_eq!(net.nb_inputs(), 4);
        assert_eq!(net.input_name(3), IMPLICIT_CLOCK);
        assert_eq!(net.registers().count(), 3);
        let r2 = net.gate(2).register().unwrap();
        assert!(r2.has_clear());
        assert!(!r2.has_preset());
        assert_eq!(r2.kind(), RegisterKind::FlipFlop);
        assert_eq!(net.gate(1).register().unwrap().kind(), RegisterKind::Latch);
    }

    #[test]
    fn test_errors() {
        assert!(read_bench("INPUT(a)\nOUTPUT(b)\n".as_bytes()).is_err());
        assert!(read_bench("INPUT(a)\nx = FOO(a)\n".as_bytes()).is_err());
        assert!(read_bench("INPUT(a)\nx = NOT(a, a)\n".as_bytes()).is_err());
        assert!(read_bench("INPUT(a)\nx = AND(a, y)\ny = AND(a, x)\n".as_bytes()).is_err());
        assert!(read_bench("INPUT(a)\nINPUT(a)\n".as_bytes()).is_err());
        assert!(read_bench("WIRE(a)\n".as_bytes()).is_err());
    }

    #[test]
    fn test_write_mapped() {
        let example = "INPUT(a)
INPUT(b)
OUTPUT(y)
OUTPUT(q)
y = NAND(a, b)
q = DFF(y)
";
        let net = read_bench(example.as_bytes()).unwrap();
        let index = LibraryIndex::build(generic_library());
        let mapped = area_map(&net, &index).unwrap();
        let mut buf = Vec::new();
        write_mapped_bench(&mut buf, &mapped, index.library()).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.contains("INPUT(CK)"));
        assert!(s.contains("= NAND2("));
        assert!(s.contains("= DFF("));
        assert!(s.contains("OUTPUT(q)"));

        let patterns = vec![
            vec![true, true, false],
            vec![true, true, true],
            vec![false, true, false],
            vec![false, true, true],
        ];
        assert_eq!(
            simulate(&net, &patterns),
            simulate_mapped(&mapped, index.library(), &patterns)
        );
    }
}
