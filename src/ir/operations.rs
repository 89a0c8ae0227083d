use super::gates::GateType;
use serde::{Deserialize, Serialize};

/// Represents a single operation in the quantum circuit.
///
/// Operations can be quantum gates, measurements, resets, barriers, or any of
/// those guarded by a classical condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A quantum gate application.
    Gate {
        /// Type of the gate (e.g., H, CX, or a custom gate by name).
        name: GateType,
        /// Indices of the qubits involved.
        qubits: Vec<usize>,
        /// Parameters for the gate (if any).
        params: Vec<f64>,
    },
    /// A measurement operation.
    Measure {
        /// Index of the qubit to measure.
        qubit: usize,
        /// Index of the classical bit to store the result.
        cbit: usize,
    },
    /// Reset a qubit to the |0> state.
    Reset {
        /// Index of the qubit to reset.
        qubit: usize,
    },
    /// A barrier to prevent optimizations across a boundary.
    Barrier {
        /// Indices of the qubits involved in the barrier.
        qubits: Vec<usize>,
    },
    /// `if (creg == value) op;`
    Conditional {
        /// Name of the classical register compared against `value`.
        creg: String,
        value: u64,
        op: Box<Operation>,
    },
}

impl Operation {
    /// Short human-readable kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Gate { .. } => "a gate",
            Operation::Measure { .. } => "a measurement",
            Operation::Reset { .. } => "a reset",
            Operation::Barrier { .. } => "a barrier",
            Operation::Conditional { .. } => "a conditional operation",
        }
    }

    /// Qubits touched by the operation.
    pub fn qubits(&self) -> Vec<usize> {
        match self {
            Operation::Gate { qubits, .. } | Operation::Barrier { qubits } => qubits.clone(),
            Operation::Measure { qubit, .. } | Operation::Reset { qubit } => vec![*qubit],
            Operation::Conditional { op, .. } => op.qubits(),
        }
    }

    /// Name of the custom gate this operation applies, looking through conditions.
    pub fn custom_gate(&self) -> Option<&str> {
        match self {
            Operation::Gate {
                name: GateType::Custom(name),
                ..
            } => Some(name.as_str()),
            Operation::Conditional { op, .. } => op.custom_gate(),
            _ => None,
        }
    }
}
