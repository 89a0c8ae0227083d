//! OpenQASM 2.0 front end with first-class custom gates.
//!
//! A `gate` definition is registered in the parsed [`ir::Circuit`] and every
//! call to it stays a single instruction until it is expanded with
//! [`ir::Circuit::decompose`], [`ir::Circuit::flatten`] or the
//! [`transpiler::UnrollCustomGates`] pass.
//!
//! ```
//! use qasm_gates::ir::{Circuit, GateDefinition, GateType};
//! use qasm_gates::parser::parse_qasm;
//!
//! let parsed = parse_qasm(
//!     "OPENQASM 2.0; gate rinv q { sdg q; h q; sdg q; h q; } qreg q[1]; rinv q[0];",
//! )
//! .unwrap();
//!
//! let mut rinv = GateDefinition::new("rinv", vec![], vec!["q".to_string()]);
//! rinv.add_gate(GateType::Sdg, &[0], vec![])
//!     .add_gate(GateType::H, &[0], vec![])
//!     .add_gate(GateType::Sdg, &[0], vec![])
//!     .add_gate(GateType::H, &[0], vec![]);
//! let mut built = Circuit::new(0, 0);
//! built.add_qreg("q", 1).unwrap();
//! built.append_custom(&rinv, &[0], &[]).unwrap();
//!
//! assert_eq!(parsed, built);
//! assert_eq!(parsed.flatten().unwrap().operations.len(), 4);
//! ```

pub mod ir;
pub mod parser;
pub mod transpiler;
