use super::error::CircuitError;
use super::expr::Expr;
use super::gates::GateType;
use super::operations::Operation;
use serde::{Deserialize, Serialize};

/// One statement of a gate body. Qubits are positions in the definition's
/// formal qubit list and parameters may refer to its formal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefinitionOp {
    Gate {
        name: GateType,
        qubits: Vec<usize>,
        params: Vec<Expr>,
    },
    Barrier {
        qubits: Vec<usize>,
    },
}

/// A user-defined gate: `gate name(params) qubits { body }`.
///
/// Applying the gate to a circuit inserts a single
/// [`GateType::Custom`] instruction; the body only comes into play when the
/// instruction is expanded with [`GateDefinition::instantiate`]. An `opaque`
/// declaration has no body at all.
///
/// Equality ignores the names of the formal arguments, so two definitions
/// with the same signature and the same body are equal however their
/// arguments were spelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDefinition {
    pub name: String,
    /// Formal parameter names, used when printing.
    pub params: Vec<String>,
    /// Formal qubit names, used when printing.
    pub qubits: Vec<String>,
    pub body: Option<Vec<DefinitionOp>>,
}

impl PartialEq for GateDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params.len() == other.params.len()
            && self.qubits.len() == other.qubits.len()
            && self.body == other.body
    }
}

impl GateDefinition {
    /// Creates a definition with an empty body.
    pub fn new(name: impl Into<String>, params: Vec<String>, qubits: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            qubits,
            body: Some(Vec::new()),
        }
    }

    /// Creates an `opaque` declaration.
    pub fn opaque(name: impl Into<String>, params: Vec<String>, qubits: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            qubits,
            body: None,
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn is_opaque(&self) -> bool {
        self.body.is_none()
    }

    /// The body statements; empty for opaque gates.
    pub fn body(&self) -> &[DefinitionOp] {
        self.body.as_deref().unwrap_or(&[])
    }

    /// Appends a statement to the body.
    pub fn push(&mut self, op: DefinitionOp) {
        self.body.get_or_insert_with(Vec::new).push(op);
    }

    /// Appends a gate application on formal qubits.
    pub fn add_gate(&mut self, name: GateType, qubits: &[usize], params: Vec<Expr>) -> &mut Self {
        self.push(DefinitionOp::Gate {
            name,
            qubits: qubits.to_vec(),
            params,
        });
        self
    }

    /// Names of the custom gates the body applies, in order of first use.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for op in self.body() {
            if let DefinitionOp::Gate {
                name: GateType::Custom(dep),
                ..
            } = op
            {
                if !deps.contains(&dep.as_str()) {
                    deps.push(dep.as_str());
                }
            }
        }
        deps
    }

    /// Expands one application of this gate.
    ///
    /// Formal qubit `i` is replaced by `qubits[i]` and formal parameter `j`
    /// by `params[j]`; the body's statements come out in order. Custom gates
    /// inside the body are not expanded further.
    pub fn instantiate(&self, qubits: &[usize], params: &[f64]) -> Result<Vec<Operation>, CircuitError> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| CircuitError::OpaqueGate(self.name.clone()))?;
        if qubits.len() != self.num_qubits() {
            return Err(CircuitError::QubitCountMismatch {
                gate: self.name.clone(),
                expected: self.num_qubits(),
                got: qubits.len(),
            });
        }
        if params.len() != self.num_params() {
            return Err(CircuitError::ParamCountMismatch {
                gate: self.name.clone(),
                expected: self.num_params(),
                got: params.len(),
            });
        }

        let actual = |formal: &[usize]| -> Result<Vec<usize>, CircuitError> {
            formal
                .iter()
                .map(|&i| {
                    qubits.get(i).copied().ok_or(CircuitError::QubitOutOfRange {
                        gate: self.name.clone(),
                        qubit: i,
                        available: qubits.len(),
                    })
                })
                .collect()
        };

        let mut ops = Vec::with_capacity(body.len());
        for op in body {
            match op {
                DefinitionOp::Gate {
                    name,
                    qubits: formal,
                    params: exprs,
                } => {
                    let values = exprs
                        .iter()
                        .map(|e| e.evaluate_with(params))
                        .collect::<Result<Vec<_>, _>>()?;
                    ops.push(Operation::Gate {
                        name: name.clone(),
                        qubits: actual(formal)?,
                        params: values,
                    });
                }
                DefinitionOp::Barrier { qubits: formal } => {
                    ops.push(Operation::Barrier {
                        qubits: actual(formal)?,
                    });
                }
            }
        }
        Ok(ops)
    }

    /// Renders the definition as an OpenQASM `gate` (or `opaque`) statement.
    pub fn to_qasm(&self) -> String {
        let mut header = self.name.clone();
        if !self.params.is_empty() {
            header.push_str(&format!("({})", self.params.join(",")));
        }
        header.push(' ');
        header.push_str(&self.qubits.join(","));

        let Some(body) = &self.body else {
            return format!("opaque {};", header);
        };
        let formal = |indices: &[usize]| {
            indices
                .iter()
                .map(|&i| self.qubits.get(i).cloned().unwrap_or_else(|| format!("q{}", i)))
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut statements = Vec::with_capacity(body.len());
        for op in body {
            match op {
                DefinitionOp::Gate {
                    name,
                    qubits,
                    params,
                } => {
                    let mut stmt = name.name().to_string();
                    if !params.is_empty() {
                        let rendered: Vec<String> =
                            params.iter().map(|p| p.to_qasm(&self.params)).collect();
                        stmt.push_str(&format!("({})", rendered.join(",")));
                    }
                    statements.push(format!("{} {};", stmt, formal(qubits)));
                }
                DefinitionOp::Barrier { qubits } => {
                    statements.push(format!("barrier {};", formal(qubits)));
                }
            }
        }
        if statements.is_empty() {
            format!("gate {} {{ }}", header)
        } else {
            format!("gate {} {{ {} }}", header, statements.join(" "))
        }
    }
}
