use serde::{Deserialize, Serialize};

/// Quantum Gate Types
///
/// This enum represents the set of built-in quantum gates: the OpenQASM 2.0
/// primitives `U` and `CX` plus the `qelib1.inc` standard library. Parameters
/// are not stored here; they travel with the [`Operation`](super::Operation)
/// that applies the gate.
///
/// Anything that is not built in is a `Custom` gate, which names a
/// [`GateDefinition`](super::GateDefinition) registered in the circuit.
///
/// # Examples
///
/// ```
/// use qasm_gates::ir::GateType;
/// assert_eq!(GateType::from_name("sdg"), GateType::Sdg);
/// assert_eq!(GateType::from_name("rinv"), GateType::Custom("rinv".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateType {
    /// General unitary primitive U(theta, phi, lambda)
    U,
    /// Controlled-NOT primitive
    CX,
    /// Identity gate (wait)
    ID,
    /// Pauli-X gate (NOT)
    X,
    /// Pauli-Y gate
    Y,
    /// Pauli-Z gate
    Z,
    /// Hadamard gate
    H,
    /// S gate (sqrt(Z))
    S,
    /// S-dagger gate (inverse of S)
    Sdg,
    /// T gate (sqrt(S))
    T,
    /// T-dagger gate (inverse of T)
    Tdg,
    /// sqrt(X) gate
    SX,
    /// Inverse of sqrt(X)
    SXdg,
    /// Rotation around X-axis with angle theta
    RX,
    /// Rotation around Y-axis with angle theta
    RY,
    /// Rotation around Z-axis with angle phi
    RZ,
    /// Phase gate with angle lambda
    P,
    /// u1(lambda), a phase gate
    U1,
    /// u2(phi, lambda) = U(pi/2, phi, lambda)
    U2,
    /// u3(theta, phi, lambda) = U(theta, phi, lambda)
    U3,
    /// Controlled-Y gate
    CY,
    /// Controlled-Z gate
    CZ,
    /// Controlled-Hadamard gate
    CH,
    /// Swap gate
    SWAP,
    /// Toffoli gate (CCX)
    CCX,
    /// Controlled RZ rotation
    CRZ,
    /// Controlled phase
    CU1,
    /// Controlled U3
    CU3,
    /// Custom user-defined gate
    Custom(String),
}

impl GateType {
    /// Maps an OpenQASM gate name to its type. Unknown names become `Custom`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "U" => GateType::U,
            "CX" => GateType::CX,
            "id" => GateType::ID,
            "x" => GateType::X,
            "y" => GateType::Y,
            "z" => GateType::Z,
            "h" => GateType::H,
            "s" => GateType::S,
            "sdg" => GateType::Sdg,
            "t" => GateType::T,
            "tdg" => GateType::Tdg,
            "sx" => GateType::SX,
            "sxdg" => GateType::SXdg,
            "rx" => GateType::RX,
            "ry" => GateType::RY,
            "rz" => GateType::RZ,
            "p" => GateType::P,
            "u1" => GateType::U1,
            "u2" => GateType::U2,
            "u3" => GateType::U3,
            "cx" => GateType::CX,
            "cy" => GateType::CY,
            "cz" => GateType::CZ,
            "ch" => GateType::CH,
            "swap" => GateType::SWAP,
            "ccx" => GateType::CCX,
            "crz" => GateType::CRZ,
            "cu1" => GateType::CU1,
            "cu3" => GateType::CU3,
            _ => GateType::Custom(name.to_string()),
        }
    }

    /// The name used when writing the gate back out as OpenQASM.
    pub fn name(&self) -> &str {
        match self {
            GateType::U => "U",
            GateType::CX => "cx",
            GateType::ID => "id",
            GateType::X => "x",
            GateType::Y => "y",
            GateType::Z => "z",
            GateType::H => "h",
            GateType::S => "s",
            GateType::Sdg => "sdg",
            GateType::T => "t",
            GateType::Tdg => "tdg",
            GateType::SX => "sx",
            GateType::SXdg => "sxdg",
            GateType::RX => "rx",
            GateType::RY => "ry",
            GateType::RZ => "rz",
            GateType::P => "p",
            GateType::U1 => "u1",
            GateType::U2 => "u2",
            GateType::U3 => "u3",
            GateType::CY => "cy",
            GateType::CZ => "cz",
            GateType::CH => "ch",
            GateType::SWAP => "swap",
            GateType::CCX => "ccx",
            GateType::CRZ => "crz",
            GateType::CU1 => "cu1",
            GateType::CU3 => "cu3",
            GateType::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, GateType::Custom(_))
    }

    /// Number of qubits a built-in gate acts on. `None` for custom gates,
    /// whose arity lives in their definition.
    pub fn num_qubits(&self) -> Option<usize> {
        match self {
            GateType::CX
            | GateType::CY
            | GateType::CZ
            | GateType::CH
            | GateType::SWAP
            | GateType::CRZ
            | GateType::CU1
            | GateType::CU3 => Some(2),
            GateType::CCX => Some(3),
            GateType::Custom(_) => None,
            _ => Some(1),
        }
    }

    /// Number of angle parameters a built-in gate takes.
    pub fn num_params(&self) -> Option<usize> {
        match self {
            GateType::RX
            | GateType::RY
            | GateType::RZ
            | GateType::P
            | GateType::U1
            | GateType::CRZ
            | GateType::CU1 => Some(1),
            GateType::U2 => Some(2),
            GateType::U | GateType::U3 | GateType::CU3 => Some(3),
            GateType::Custom(_) => None,
            _ => Some(0),
        }
    }
}
