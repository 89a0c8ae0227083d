use super::pass::Pass;
use crate::ir::{Circuit, CircuitError};

/// Replaces custom gate instructions by their bodies.
///
/// `max_depth: None` expands until only built-in and opaque gates are left;
/// `Some(n)` expands `n` levels of nesting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnrollCustomGates {
    pub max_depth: Option<usize>,
}

impl UnrollCustomGates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth(levels: usize) -> Self {
        Self {
            max_depth: Some(levels),
        }
    }
}

impl Pass for UnrollCustomGates {
    fn name(&self) -> &str {
        "UnrollCustomGates"
    }

    fn run(&self, circuit: &Circuit) -> Result<Circuit, CircuitError> {
        circuit.unroll(self.max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{GateDefinition, GateType, Operation};
    use crate::transpiler::PassManager;

    fn nested() -> Circuit {
        let mut inner = GateDefinition::new("inner", vec![], vec!["a".to_string()]);
        inner.add_gate(GateType::H, &[0], vec![]).add_gate(GateType::T, &[0], vec![]);
        let mut outer = GateDefinition::new("outer", vec![], vec!["a".to_string(), "b".to_string()]);
        outer
            .add_gate(GateType::Custom("inner".to_string()), &[1], vec![])
            .add_gate(GateType::CX, &[1, 0], vec![]);

        let mut circuit = Circuit::new(2, 0);
        circuit.add_definition(inner).unwrap();
        circuit.append_custom(&outer, &[0, 1], &[]).unwrap();
        circuit
    }

    #[test]
    fn test_full_unroll() {
        let out = UnrollCustomGates::new().run(&nested()).unwrap();
        let names: Vec<_> = out
            .operations
            .iter()
            .map(|op| match op {
                Operation::Gate { name, qubits, .. } => (name.clone(), qubits.clone()),
                other => panic!("Expected gate, got {:?}", other),
            })
            .collect();
        assert_eq!(
            names,
            vec![
                (GateType::H, vec![1]),
                (GateType::T, vec![1]),
                (GateType::CX, vec![1, 0]),
            ]
        );
        assert!(out.definitions.is_empty());
    }

    #[test]
    fn test_one_level() {
        let mut pm = PassManager::new();
        pm.add_pass(Box::new(UnrollCustomGates::with_depth(1)));
        let out = pm.run(&nested()).unwrap();
        assert_eq!(out.operations.len(), 2);
        assert_eq!(out.operations[0].custom_gate(), Some("inner"));
        // "outer" is no longer referenced.
        assert_eq!(out.definitions.len(), 1);
        assert_eq!(out.definitions[0].name, "inner");
    }
}
