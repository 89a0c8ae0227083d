//! Dense unitaries of small circuits.
//!
//! Used to check that two circuits implement the same operation, for example
//! that a custom instruction and its inlined body agree. Qubit `i` is bit `i`
//! of the basis-state index (little-endian), and a gate's matrix is written
//! in the same order over its own argument list.

use super::circuit::Circuit;
use super::error::CircuitError;
use super::gates::GateType;
use super::operations::Operation;
use nalgebra::DMatrix;
use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4};

/// Largest circuit, in qubits, whose unitary will be built.
pub const MAX_UNITARY_QUBITS: usize = 10;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn phase(angle: f64) -> Complex64 {
    Complex64::from_polar(1.0, angle)
}

fn single(entries: [Complex64; 4]) -> DMatrix<Complex64> {
    DMatrix::from_row_slice(2, 2, &entries)
}

fn u(theta: f64, phi: f64, lambda: f64) -> DMatrix<Complex64> {
    let (sin, cos) = (theta / 2.0).sin_cos();
    single([
        c(cos, 0.0),
        -phase(lambda) * sin,
        phase(phi) * sin,
        phase(phi + lambda) * cos,
    ])
}

fn hadamard() -> DMatrix<Complex64> {
    let h = c(FRAC_1_SQRT_2, 0.0);
    single([h, h, h, -h])
}

fn diagonal(angle: f64) -> DMatrix<Complex64> {
    single([c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), phase(angle)])
}

/// Adds `controls` control qubits in front of a single-qubit gate. The
/// controls are the low bits of the index, the target is the highest.
fn controlled(target: &DMatrix<Complex64>, controls: usize) -> DMatrix<Complex64> {
    let dim = 1 << (controls + 1);
    let mut m = DMatrix::identity(dim, dim);
    let off = (1 << controls) - 1;
    let on = off | (1 << controls);
    m[(off, off)] = target[(0, 0)];
    m[(off, on)] = target[(0, 1)];
    m[(on, off)] = target[(1, 0)];
    m[(on, on)] = target[(1, 1)];
    m
}

/// Matrix of a built-in gate.
pub fn gate_matrix(gate: &GateType, params: &[f64]) -> Result<DMatrix<Complex64>, CircuitError> {
    if let Some(expected) = gate.num_params() {
        if params.len() != expected {
            return Err(CircuitError::ParamCountMismatch {
                gate: gate.name().to_string(),
                expected,
                got: params.len(),
            });
        }
    }
    let zero = c(0.0, 0.0);
    let one = c(1.0, 0.0);
    let i = c(0.0, 1.0);
    let x = single([zero, one, one, zero]);
    let m = match gate {
        GateType::U | GateType::U3 => u(params[0], params[1], params[2]),
        GateType::U2 => u(FRAC_PI_2, params[0], params[1]),
        GateType::U1 | GateType::P => diagonal(params[0]),
        GateType::ID => DMatrix::identity(2, 2),
        GateType::X => x,
        GateType::Y => single([zero, -i, i, zero]),
        GateType::Z => diagonal(std::f64::consts::PI),
        GateType::H => hadamard(),
        GateType::S => diagonal(FRAC_PI_2),
        GateType::Sdg => diagonal(-FRAC_PI_2),
        GateType::T => diagonal(FRAC_PI_4),
        GateType::Tdg => diagonal(-FRAC_PI_4),
        GateType::SX => single([c(0.5, 0.5), c(0.5, -0.5), c(0.5, -0.5), c(0.5, 0.5)]),
        GateType::SXdg => single([c(0.5, -0.5), c(0.5, 0.5), c(0.5, 0.5), c(0.5, -0.5)]),
        GateType::RX => {
            let (sin, cos) = (params[0] / 2.0).sin_cos();
            single([c(cos, 0.0), c(0.0, -sin), c(0.0, -sin), c(cos, 0.0)])
        }
        GateType::RY => {
            let (sin, cos) = (params[0] / 2.0).sin_cos();
            single([c(cos, 0.0), c(-sin, 0.0), c(sin, 0.0), c(cos, 0.0)])
        }
        GateType::RZ => single([phase(-params[0] / 2.0), zero, zero, phase(params[0] / 2.0)]),
        GateType::CX => controlled(&x, 1),
        GateType::CY => controlled(&single([zero, -i, i, zero]), 1),
        GateType::CZ => controlled(&diagonal(std::f64::consts::PI), 1),
        GateType::CH => controlled(&hadamard(), 1),
        GateType::CCX => controlled(&x, 2),
        GateType::CRZ => controlled(
            &single([phase(-params[0] / 2.0), zero, zero, phase(params[0] / 2.0)]),
            1,
        ),
        GateType::CU1 => controlled(&diagonal(params[0]), 1),
        GateType::CU3 => controlled(&u(params[0], params[1], params[2]), 1),
        GateType::SWAP => {
            let mut m = DMatrix::zeros(4, 4);
            m[(0, 0)] = one;
            m[(1, 2)] = one;
            m[(2, 1)] = one;
            m[(3, 3)] = one;
            m
        }
        GateType::Custom(name) => return Err(CircuitError::OpaqueGate(name.clone())),
    };
    Ok(m)
}

/// Left-multiplies `unitary` by `gate` acting on `targets`.
fn apply(unitary: &mut DMatrix<Complex64>, gate: &DMatrix<Complex64>, targets: &[usize]) {
    let dim = unitary.nrows();
    let sub = 1usize << targets.len();
    let mask: usize = targets.iter().map(|&t| 1usize << t).sum();
    let mut indices = vec![0usize; sub];
    let mut scratch = vec![Complex64::new(0.0, 0.0); sub];
    for base in (0..dim).filter(|b| b & mask == 0) {
        for (s, index) in indices.iter_mut().enumerate() {
            *index = targets
                .iter()
                .enumerate()
                .filter(|(j, _)| (s >> *j) & 1 == 1)
                .fold(base, |acc, (_, &t)| acc | (1 << t));
        }
        for col in 0..dim {
            for (r, out) in scratch.iter_mut().enumerate() {
                *out = (0..sub).map(|k| gate[(r, k)] * unitary[(indices[k], col)]).sum();
            }
            for (r, value) in scratch.iter().enumerate() {
                unitary[(indices[r], col)] = *value;
            }
        }
    }
}

/// Builds the unitary of a circuit made only of gates and barriers.
///
/// Custom instructions are expanded first; opaque gates, measurements,
/// resets and conditional operations are rejected.
pub fn unitary(circuit: &Circuit) -> Result<DMatrix<Complex64>, CircuitError> {
    if circuit.num_qubits > MAX_UNITARY_QUBITS {
        return Err(CircuitError::TooManyQubits {
            got: circuit.num_qubits,
            max: MAX_UNITARY_QUBITS,
        });
    }
    let flat = circuit.flatten()?;
    let dim = 1usize << flat.num_qubits;
    let mut result = DMatrix::identity(dim, dim);
    for op in &flat.operations {
        match op {
            Operation::Gate {
                name,
                qubits,
                params,
            } => {
                let gate = gate_matrix(name, params)?;
                if gate.nrows().trailing_zeros() as usize != qubits.len() {
                    return Err(CircuitError::QubitCountMismatch {
                        gate: name.name().to_string(),
                        expected: gate.nrows().trailing_zeros() as usize,
                        got: qubits.len(),
                    });
                }
                if let Some(&q) = qubits.iter().find(|&&q| q >= flat.num_qubits) {
                    return Err(CircuitError::QubitOutOfRange {
                        gate: name.name().to_string(),
                        qubit: q,
                        available: flat.num_qubits,
                    });
                }
                apply(&mut result, &gate, qubits);
            }
            Operation::Barrier { .. } => {}
            other => return Err(CircuitError::NonUnitary(other.kind().to_string())),
        }
    }
    Ok(result)
}

/// Whether two circuits implement the same unitary up to a global phase.
pub fn equivalent(a: &Circuit, b: &Circuit, tolerance: f64) -> Result<bool, CircuitError> {
    if a.num_qubits != b.num_qubits {
        return Ok(false);
    }
    let ua = unitary(a)?;
    let ub = unitary(b)?;
    let Some((index, _)) = ua
        .iter()
        .enumerate()
        .max_by(|(_, x), (_, y)| x.norm().total_cmp(&y.norm()))
    else {
        return Ok(true);
    };
    let (pa, pb) = (ua.as_slice()[index], ub.as_slice()[index]);
    if pb.norm() < tolerance {
        return Ok(false);
    }
    let global = pb / pa;
    let global = global / global.norm();
    Ok(ua
        .iter()
        .zip(ub.iter())
        .all(|(x, y)| (x * global - y).norm() <= tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circuit_of(num_qubits: usize, gates: &[(GateType, Vec<usize>, Vec<f64>)]) -> Circuit {
        let mut circuit = Circuit::new(num_qubits, 0);
        for (gate, qubits, params) in gates {
            circuit.append(gate.clone(), qubits, params).unwrap();
        }
        circuit
    }

    #[test]
    fn test_s_times_sdg_is_identity() {
        let circuit = circuit_of(1, &[(GateType::S, vec![0], vec![]), (GateType::Sdg, vec![0], vec![])]);
        assert!(equivalent(&circuit, &Circuit::new(1, 0), 1e-12).unwrap());
    }

    #[test]
    fn test_hzh_is_x() {
        let hzh = circuit_of(
            1,
            &[
                (GateType::H, vec![0], vec![]),
                (GateType::Z, vec![0], vec![]),
                (GateType::H, vec![0], vec![]),
            ],
        );
        let x = circuit_of(1, &[(GateType::X, vec![0], vec![])]);
        assert!(equivalent(&hzh, &x, 1e-12).unwrap());
        let z = circuit_of(1, &[(GateType::Z, vec![0], vec![])]);
        assert!(!equivalent(&hzh, &z, 1e-12).unwrap());
    }

    #[test]
    fn test_rz_matches_u1_up_to_phase() {
        let rz = circuit_of(1, &[(GateType::RZ, vec![0], vec![0.3])]);
        let u1 = circuit_of(1, &[(GateType::U1, vec![0], vec![0.3])]);
        assert!(equivalent(&rz, &u1, 1e-12).unwrap());
    }

    #[test]
    fn test_cx_direction_matters() {
        let forward = circuit_of(2, &[(GateType::CX, vec![0, 1], vec![])]);
        let backward = circuit_of(2, &[(GateType::CX, vec![1, 0], vec![])]);
        assert!(!equivalent(&forward, &backward, 1e-12).unwrap());

        let m = unitary(&forward).unwrap();
        // |q1 q0> = |01> (index 1) goes to |11> (index 3).
        assert!((m[(3, 1)] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_swap_from_three_cx() {
        let three = circuit_of(
            2,
            &[
                (GateType::CX, vec![0, 1], vec![]),
                (GateType::CX, vec![1, 0], vec![]),
                (GateType::CX, vec![0, 1], vec![]),
            ],
        );
        let swap = circuit_of(2, &[(GateType::SWAP, vec![0, 1], vec![])]);
        assert!(equivalent(&three, &swap, 1e-12).unwrap());
    }

    #[test]
    fn test_measurement_is_not_unitary() {
        let mut circuit = Circuit::new(1, 1);
        circuit.add_op(Operation::Measure { qubit: 0, cbit: 0 });
        assert_eq!(
            unitary(&circuit),
            Err(CircuitError::NonUnitary("a measurement".to_string()))
        );
    }

    #[test]
    fn test_too_many_qubits() {
        let circuit = Circuit::new(MAX_UNITARY_QUBITS + 1, 0);
        assert!(matches!(
            unitary(&circuit),
            Err(CircuitError::TooManyQubits { .. })
        ));
    }
}
