use super::expr::ExprError;
use thiserror::Error;

/// Errors raised while building, expanding or analysing a [`Circuit`](super::Circuit).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CircuitError {
    #[error("unknown gate '{0}'")]
    UnknownGate(String),

    #[error("gate '{gate}' expects {expected} qubits, got {got}")]
    QubitCountMismatch {
        gate: String,
        expected: usize,
        got: usize,
    },

    #[error("gate '{gate}' expects {expected} params, got {got}")]
    ParamCountMismatch {
        gate: String,
        expected: usize,
        got: usize,
    },

    #[error("qubit {qubit} is out of range for '{gate}' ({available} available)")]
    QubitOutOfRange {
        gate: String,
        qubit: usize,
        available: usize,
    },

    #[error("duplicate qubit {qubit} in application of '{gate}'")]
    DuplicateQubit { gate: String, qubit: usize },

    #[error("'{0}' is already defined")]
    AlreadyDefined(String),

    #[error("gate '{0}' must act on at least one qubit")]
    NoQubits(String),

    #[error("gate '{gate}' refers to undefined parameter '{name}'")]
    UndefinedParameter { gate: String, name: String },

    #[error("gate '{0}' is opaque and has no definition to expand")]
    OpaqueGate(String),

    #[error("gate '{0}' expands into itself")]
    RecursiveDefinition(String),

    #[error("only gates and barriers can form a gate definition, found {0}")]
    NotAGateCircuit(String),

    #[error("{0} is not unitary")]
    NonUnitary(String),

    #[error("register '{name}' of size {size} would exceed the limit of {max} bits")]
    RegisterTooLarge {
        name: String,
        size: usize,
        max: usize,
    },

    #[error("circuit has {got} qubits, unitaries are limited to {max}")]
    TooManyQubits { got: usize, max: usize },

    #[error(transparent)]
    Expression(#[from] ExprError),
}
