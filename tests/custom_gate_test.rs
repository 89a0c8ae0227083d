use proptest::prelude::*;
use qasm_gates::ir::unitary::{equivalent, unitary};
use qasm_gates::ir::{Circuit, GateDefinition, GateType, Operation};
use qasm_gates::parser::{parse_qasm, parse_qasm_with, ParseOptions};
use qasm_gates::transpiler::{Pass, UnrollCustomGates};

const RINV: &str = r#"
    OPENQASM 2.0;
    include "qelib1.inc";
    gate rinv q { sdg q; h q; sdg q; h q; }
    qreg q[1];
    rinv q[0];
"#;

fn gate(name: GateType, qubits: Vec<usize>, params: Vec<f64>) -> Operation {
    Operation::Gate {
        name,
        qubits,
        params,
    }
}

fn hand_built_rinv() -> Circuit {
    let mut rinv = GateDefinition::new("rinv", vec![], vec!["q".to_string()]);
    rinv.add_gate(GateType::Sdg, &[0], vec![])
        .add_gate(GateType::H, &[0], vec![])
        .add_gate(GateType::Sdg, &[0], vec![])
        .add_gate(GateType::H, &[0], vec![]);

    let mut circuit = Circuit::new(0, 0);
    circuit.add_qreg("q", 1).unwrap();
    circuit.append_custom(&rinv, &[0], &[]).unwrap();
    circuit
}

#[test]
fn test_rinv_parses_to_hand_built_circuit() {
    let parsed = parse_qasm(RINV).expect("Failed to parse rinv");
    assert_eq!(parsed, hand_built_rinv());
}

#[test]
fn test_rinv_hand_built_from_sub_circuit() {
    let mut body = Circuit::new(0, 0);
    body.add_qreg("q", 1).unwrap();
    for g in [GateType::Sdg, GateType::H, GateType::Sdg, GateType::H] {
        body.append(g, &[0], &[]).unwrap();
    }
    let rinv = body.to_definition("rinv").unwrap();

    let mut circuit = Circuit::new(0, 0);
    circuit.add_qreg("q", 1).unwrap();
    circuit.append_custom(&rinv, &[0], &[]).unwrap();

    assert_eq!(parse_qasm(RINV).unwrap(), circuit);
}

#[test]
fn test_rinv_expands_in_order() {
    let expected = vec![
        gate(GateType::Sdg, vec![0], vec![]),
        gate(GateType::H, vec![0], vec![]),
        gate(GateType::Sdg, vec![0], vec![]),
        gate(GateType::H, vec![0], vec![]),
    ];
    assert_eq!(parse_qasm(RINV).unwrap().flatten().unwrap().operations, expected);
    assert_eq!(hand_built_rinv().decompose().unwrap().operations, expected);
    let unrolled = UnrollCustomGates::new().run(&hand_built_rinv()).unwrap();
    assert_eq!(unrolled.operations, expected);
}

#[test]
fn test_rinv_unitary_matches_inline_body() {
    let inline = parse_qasm("OPENQASM 2.0; qreg q[1]; sdg q[0]; h q[0]; sdg q[0]; h q[0];").unwrap();
    let parsed = parse_qasm(RINV).unwrap();
    assert!(equivalent(&parsed, &inline, 1e-9).unwrap());
    assert!(equivalent(&parsed, &hand_built_rinv(), 1e-9).unwrap());

    // Reversing the body gives a different operator.
    let reversed = parse_qasm("OPENQASM 2.0; qreg q[1]; h q[0]; sdg q[0]; h q[0]; sdg q[0];").unwrap();
    assert!(!equivalent(&parsed, &reversed, 1e-9).unwrap());
    assert_eq!(unitary(&parsed).unwrap().nrows(), 2);
}

#[test]
fn test_parameter_substitution() {
    let qasm = r#"
        OPENQASM 2.0;
        gate r(a) q { rz(a/2) q; }
        qreg q[1];
        r(pi) q[0];
    "#;
    let circuit = parse_qasm(qasm).unwrap();
    assert_eq!(
        circuit.operations,
        vec![gate(GateType::Custom("r".to_string()), vec![0], vec![std::f64::consts::PI])]
    );
    let flat = circuit.flatten().unwrap();
    assert_eq!(
        flat.operations,
        vec![gate(GateType::RZ, vec![0], vec![std::f64::consts::FRAC_PI_2])]
    );
}

#[test]
fn test_formal_qubit_permutation() {
    let qasm = r#"
        OPENQASM 2.0;
        gate rev a, b, c { cx c, a; ccx b, c, a; }
        qreg q[4];
        rev q[3], q[0], q[2];
    "#;
    let flat = parse_qasm(qasm).unwrap().flatten().unwrap();
    assert_eq!(
        flat.operations,
        vec![
            gate(GateType::CX, vec![2, 3], vec![]),
            gate(GateType::CCX, vec![0, 2, 3], vec![]),
        ]
    );
}

#[test]
fn test_nested_custom_gates() {
    let qasm = r#"
        OPENQASM 2.0;
        gate rinv q { sdg q; h q; sdg q; h q; }
        gate twice a, b { rinv a; cx a, b; rinv b; }
        qreg q[2];
        twice q[1], q[0];
    "#;
    let circuit = parse_qasm(qasm).unwrap();
    assert_eq!(circuit.operations.len(), 1);
    assert_eq!(circuit.definitions.len(), 2);

    let once = circuit.decompose().unwrap();
    assert_eq!(
        once.operations,
        vec![
            gate(GateType::Custom("rinv".to_string()), vec![1], vec![]),
            gate(GateType::CX, vec![1, 0], vec![]),
            gate(GateType::Custom("rinv".to_string()), vec![0], vec![]),
        ]
    );
    assert_eq!(once.definitions.len(), 1);

    let flat = circuit.flatten().unwrap();
    assert_eq!(flat.operations.len(), 9);
    assert!(flat.definitions.is_empty());
    assert_eq!(flat, once.flatten().unwrap());
}

#[test]
fn test_nested_gates_hand_built_from_sub_circuits() {
    let qasm = r#"
        OPENQASM 2.0;
        gate inner a { x a; }
        gate outer a { inner a; }
        qreg q[1];
        outer q[0];
    "#;
    let parsed = parse_qasm(qasm).unwrap();

    let mut inner_body = Circuit::new(0, 0);
    inner_body.add_qreg("a", 1).unwrap();
    inner_body.append(GateType::X, &[0], &[]).unwrap();

    let mut outer_body = Circuit::new(0, 0);
    outer_body.add_qreg("a", 1).unwrap();
    outer_body.append_circuit_as_gate(&inner_body, "inner", &[0]).unwrap();

    let mut built = Circuit::new(0, 0);
    built.add_qreg("q", 1).unwrap();
    built.append_circuit_as_gate(&outer_body, "outer", &[0]).unwrap();

    assert_eq!(parsed, built);
    assert_eq!(
        built.flatten().unwrap().operations,
        vec![gate(GateType::X, vec![0], vec![])]
    );
    assert_eq!(built.decompose().unwrap().operations[0].custom_gate(), Some("inner"));
}

#[test]
fn test_nested_rinv_hand_built_matches_parsed() {
    let qasm = r#"
        OPENQASM 2.0;
        gate rinv q { sdg q; h q; sdg q; h q; }
        gate pair a, b { rinv b; cx a, b; rinv a; }
        qreg q[3];
        pair q[2], q[0];
    "#;
    let parsed = parse_qasm(qasm).unwrap();

    let mut rinv_body = Circuit::new(0, 0);
    rinv_body.add_qreg("q", 1).unwrap();
    for g in [GateType::Sdg, GateType::H, GateType::Sdg, GateType::H] {
        rinv_body.append(g, &[0], &[]).unwrap();
    }
    let mut pair_body = Circuit::new(0, 0);
    pair_body.add_qreg("p", 2).unwrap();
    pair_body.append_circuit_as_gate(&rinv_body, "rinv", &[1]).unwrap();
    pair_body.append(GateType::CX, &[0, 1], &[]).unwrap();
    pair_body.append_circuit_as_gate(&rinv_body, "rinv", &[0]).unwrap();

    let mut built = Circuit::new(0, 0);
    built.add_qreg("q", 3).unwrap();
    built.append_circuit_as_gate(&pair_body, "pair", &[2, 0]).unwrap();

    assert_eq!(parsed, built);
    assert_eq!(parsed.flatten().unwrap(), built.flatten().unwrap());
    assert!(equivalent(&parsed, &built, 1e-9).unwrap());
}

#[test]
fn test_to_qasm_without_full_register_coverage_parses_back() {
    let mut circuit = Circuit::new(1, 0);
    circuit.add_qreg("r", 2).unwrap();
    circuit.append_custom(&hand_built_rinv().definitions[0], &[2], &[]).unwrap();
    circuit.append(GateType::CX, &[0, 1], &[]).unwrap();

    let reparsed = parse_qasm(&circuit.to_qasm()).unwrap();
    assert_eq!(reparsed.num_qubits, 3);
    assert_eq!(reparsed.operations, circuit.operations);
    assert_eq!(reparsed.definitions, circuit.definitions);
}

#[test]
fn test_qasm_output_of_evaluated_params_parses_back() {
    let qasm = "OPENQASM 2.0; qreg q[1]; rz(exp(10) * 1e-300) q[0]; rx(-2^0.5) q[0];";
    let circuit = parse_qasm(qasm).unwrap();
    assert_eq!(parse_qasm(&circuit.to_qasm()).unwrap(), circuit);
}

#[test]
fn test_custom_gate_broadcast() {
    let qasm = r#"
        OPENQASM 2.0;
        gate bell a, b { h a; cx a, b; }
        qreg a[2];
        qreg b[2];
        bell a, b;
        bell a[0], b;
    "#;
    let circuit = parse_qasm(qasm).unwrap();
    assert_eq!(
        circuit.operations,
        vec![
            gate(GateType::Custom("bell".to_string()), vec![0, 2], vec![]),
            gate(GateType::Custom("bell".to_string()), vec![1, 3], vec![]),
            gate(GateType::Custom("bell".to_string()), vec![0, 2], vec![]),
            gate(GateType::Custom("bell".to_string()), vec![0, 3], vec![]),
        ]
    );
}

#[test]
fn test_expand_option_matches_flatten() {
    let options = ParseOptions {
        expand_custom_gates: true,
        ..ParseOptions::default()
    };
    let expanded = parse_qasm_with(RINV, &options).unwrap();
    assert_eq!(expanded, parse_qasm(RINV).unwrap().flatten().unwrap());
}

#[test]
fn test_qasm_output_parses_back() {
    let qasm = r#"
        OPENQASM 2.0;
        gate r(a, b) q { rz(a/2) q; ry(-b) q; }
        gate pair(t) x, y { r(t, 2*t) y; cx x, y; }
        qreg q[2];
        creg c[2];
        pair(0.25) q[0], q[1];
        measure q -> c;
    "#;
    let circuit = parse_qasm(qasm).unwrap();
    let printed = circuit.to_qasm();
    assert!(printed.contains("gate pair(t) x,y { r(t,(2.0 * t)) y; cx x,y; }"));
    assert_eq!(parse_qasm(&printed).unwrap(), circuit);
}

#[test]
fn test_conditional_custom_gate_expands_under_condition() {
    let qasm = r#"
        OPENQASM 2.0;
        gate rinv q { sdg q; h q; sdg q; h q; }
        qreg q[1];
        creg c[1];
        if (c == 1) rinv q[0];
    "#;
    let flat = parse_qasm(qasm).unwrap().flatten().unwrap();
    assert_eq!(flat.operations.len(), 4);
    assert!(flat
        .operations
        .iter()
        .all(|op| matches!(op, Operation::Conditional { value: 1, .. })));
}

fn single_qubit_gate() -> impl Strategy<Value = (GateType, Vec<f64>)> {
    prop_oneof![
        Just((GateType::H, vec![])),
        Just((GateType::S, vec![])),
        Just((GateType::Sdg, vec![])),
        Just((GateType::T, vec![])),
        Just((GateType::X, vec![])),
        (-3.0f64..3.0).prop_map(|theta| (GateType::RZ, vec![theta])),
        (-3.0f64..3.0).prop_map(|theta| (GateType::RX, vec![theta])),
    ]
}

proptest! {
    #[test]
    fn flatten_equals_inline_body(
        body in prop::collection::vec(single_qubit_gate(), 1..8),
        target in 0usize..3,
    ) {
        let mut def = GateDefinition::new("g", vec![], vec!["a".to_string()]);
        for (name, params) in &body {
            def.add_gate(
                name.clone(),
                &[0],
                params.iter().map(|&p| qasm_gates::ir::Expr::Float(p)).collect(),
            );
        }
        let mut custom = Circuit::new(3, 0);
        custom.append_custom(&def, &[target], &[]).unwrap();

        let mut inline = Circuit::new(3, 0);
        for (name, params) in &body {
            inline.append(name.clone(), &[target], params).unwrap();
        }

        prop_assert_eq!(custom.operations.len(), 1);
        prop_assert_eq!(custom.flatten().unwrap(), inline);
    }
}
