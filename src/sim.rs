//! Simulation of subject and mapped networks, used to check the mapping
//!
//! Simulation is cycle-based: at each timestep the inputs are applied and the combinatorial
//! logic is evaluated; between two timesteps, each register captures its data if its clock
//! is active, then asynchronous clear and preset are applied. Registers start at zero.

mod mapped_sim;
mod simple_sim;

use crate::library::CellLibrary;
use crate::techmap::MappedNetwork;
use crate::Network;

use mapped_sim::MappedSimulator;
use simple_sim::SimpleSimulator;

/// Simple conversion to 64b format
fn bool_to_multi(values: &[Vec<bool>]) -> Vec<Vec<u64>> {
    values
        .iter()
        .map(|v| v.iter().map(|b| if *b { !0 } else { 0 }).collect())
        .collect()
}

/// Simple conversion from 64b format
fn multi_to_bool(values: &[Vec<u64>]) -> Vec<Vec<bool>> {
    values
        .iter()
        .map(|v| v.iter().map(|b| *b != 0).collect())
        .collect()
}

/// Simulate a network over multiple timesteps; return the output values
pub fn simulate(network: &Network, input_values: &[Vec<bool>]) -> Vec<Vec<bool>> {
    multi_to_bool(&simulate_multi(network, &bool_to_multi(input_values)))
}

/// Simulate a combinatorial network; return the output values
pub fn simulate_comb(network: &Network, input_values: &[bool]) -> Vec<bool> {
    assert!(network.is_comb());
    let output = simulate(network, &[input_values.to_vec()]);
    output[0].clone()
}

/// Simulate a network over multiple timesteps with 64b inputs; return the output values
pub fn simulate_multi(network: &Network, input_values: &[Vec<u64>]) -> Vec<Vec<u64>> {
    let mut sim = SimpleSimulator::from_network(network);
    sim.run(input_values)
}

/// Simulate a mapped network over multiple timesteps; return the output values
pub fn simulate_mapped(
    network: &MappedNetwork,
    library: &CellLibrary,
    input_values: &[Vec<bool>],
) -> Vec<Vec<bool>> {
    multi_to_bool(&simulate_mapped_multi(
        network,
        library,
        &bool_to_multi(input_values),
    ))
}

/// Simulate a mapped network over multiple timesteps with 64b inputs; return the output values
pub fn simulate_mapped_multi(
    network: &MappedNetwork,
    library: &CellLibrary,
    input_values: &[Vec<u64>],
) -> Vec<Vec<u64>> {
    let mut sim = MappedSimulator::new(network, library);
    sim.run(input_values)
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::library::generic_library;
    use crate::network::generators;
    use crate::{area_map, LibraryIndex, Signal};

    fn random_patterns(nb_steps: usize, nb_inputs: usize, seed: u64) -> Vec<Vec<u64>> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..nb_steps)
            .map(|_| (0..nb_inputs).map(|_| rng.gen()).collect())
            .collect()
    }

    fn check_equivalent(network: &Network, index: &LibraryIndex, nb_steps: usize) {
        let mapped = area_map(network, index).unwrap();
        let patterns = random_patterns(nb_steps, network.nb_inputs(), 1);
        assert_eq!(
            simulate_multi(network, &patterns),
            simulate_mapped_multi(&mapped, index.library(), &patterns)
        );
    }

    #[test]
    fn test_basic() {
        let mut net = Network::new();
        let i0 = net.add_input();
        let i1 = net.add_input();
        let i2 = net.add_input();
        let x1 = net.xor(i0, i1);
        let x2 = net.and(i0, i2);
        let x3 = net.and(x2, !i1);
        net.add_output(x1);
        net.add_output(x3);

        assert_eq!(simulate_comb(&net, &[false, false, false]), vec![false, false]);
        assert_eq!(simulate_comb(&net, &[true, false, false]), vec![true, false]);
        assert_eq!(simulate_comb(&net, &[true, false, true]), vec![true, true]);
        assert_eq!(simulate_comb(&net, &[true, true, true]), vec![false, false]);
    }

    #[test]
    fn test_dff() {
        let mut net = Network::new();
        let d = net.add_input();
        let en = net.add_input();
        let res = net.add_input();
        let x = net.dff(d, en, res, Signal::zero());
        net.add_output(x);
        let pattern = vec![
            vec![false, false, false],
            vec![false, true, false],
            vec![true, true, false],
            vec![true, false, false],
            vec![true, false, true],
            vec![false, false, false],
        ];
        let expected = vec![
            vec![false],
            vec![false],
            vec![false],
            vec![true],
            vec![true],
            vec![false],
        ];
        assert_eq!(simulate(&net, &pattern), expected);
    }

    #[test]
    fn test_mapped_comb() {
        let index = LibraryIndex::build(generic_library());
        check_equivalent(&generators::adder::ripple_carry(4), &index, 1);
        for seed in 0..8 {
            let net = generators::random::random_logic(6, 60, 8, seed);
            check_equivalent(&net, &index, 1);
        }
    }

    #[test]
    fn test_mapped_seq() {
        let index = LibraryIndex::build(generic_library());
        for falling_edge in [false, true] {
            for has_clear in [false, true] {
                let net = generators::testcases::toggle_chain(3, falling_edge, has_clear);
                check_equivalent(&net, &index, 12);
            }
        }
    }
}
