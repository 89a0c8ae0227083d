use super::definition::{DefinitionOp, GateDefinition};
use super::error::CircuitError;
use super::expr::Expr;
use super::gates::GateType;
use super::operations::Operation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

/// A named, contiguous slice of the circuit's qubits or classical bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    pub name: String,
    /// Index of the register's first bit in the circuit.
    pub start: usize,
    pub size: usize,
}

impl Register {
    fn label(&self, index: usize) -> Option<String> {
        (index >= self.start && index < self.start + self.size)
            .then(|| format!("{}[{}]", self.name, index - self.start))
    }
}

/// Most qubits, and separately most classical bits, a circuit can declare
/// through registers.
pub const MAX_REGISTER_BITS: usize = 1 << 24;

/// Bit count after adding a register of `size` bits to `current`.
fn grow(current: usize, name: &str, size: usize) -> Result<usize, CircuitError> {
    current
        .checked_add(size)
        .filter(|&total| total <= MAX_REGISTER_BITS)
        .ok_or_else(|| CircuitError::RegisterTooLarge {
            name: name.to_string(),
            size,
            max: MAX_REGISTER_BITS,
        })
}

/// Whether `registers` account for every one of `total` bits.
fn covers(registers: &[Register], total: usize) -> bool {
    registers.iter().map(|r| r.size).sum::<usize>() == total
}

/// Register declarations for `to_qasm`. Bits outside any register (from
/// [`Circuit::new`]) are printed as one flat register named `fallback`
/// holding all `total` bits.
fn declarations(keyword: &str, fallback: &str, registers: &[Register], total: usize) -> Vec<String> {
    if covers(registers, total) {
        registers
            .iter()
            .map(|r| format!("{} {}[{}];", keyword, r.name, r.size))
            .collect()
    } else {
        vec![format!("{} {}[{}];", keyword, fallback, total)]
    }
}

/// Intermediate Representation of a Quantum Circuit.
///
/// A `Circuit` consists of a sequence of operations, metadata about the
/// number of qubits and classical bits required, and the registry of custom
/// gate definitions its operations may refer to.
///
/// Custom gates are kept as single instructions until they are expanded with
/// [`Circuit::decompose`] or [`Circuit::flatten`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Total number of qubits in the circuit.
    pub num_qubits: usize,
    /// Total number of classical bits in the circuit.
    pub num_cbits: usize,
    /// Quantum registers, in declaration order.
    pub qregs: Vec<Register>,
    /// Classical registers, in declaration order.
    pub cregs: Vec<Register>,
    /// Custom gate definitions, in registration order. A definition only
    /// refers to gates registered before it.
    pub definitions: Vec<GateDefinition>,
    /// Sequence of operations (gates, measurements, etc.).
    pub operations: Vec<Operation>,
}

impl Circuit {
    /// Creates a new empty circuit.
    ///
    /// # Arguments
    ///
    /// * `num_qubits` - The number of qubits to allocate.
    /// * `num_cbits` - The number of classical bits to allocate.
    pub fn new(num_qubits: usize, num_cbits: usize) -> Self {
        Self {
            num_qubits,
            num_cbits,
            ..Default::default()
        }
    }

    /// Adds an operation to the circuit without any validation.
    pub fn add_op(&mut self, op: Operation) {
        self.operations.push(op);
    }

    fn register_name_taken(&self, name: &str) -> bool {
        self.qregs.iter().chain(self.cregs.iter()).any(|r| r.name == name)
    }

    /// Declares a quantum register after the existing qubits and returns its
    /// first index.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: usize) -> Result<usize, CircuitError> {
        let name = name.into();
        if self.register_name_taken(&name) {
            return Err(CircuitError::AlreadyDefined(name));
        }
        let start = self.num_qubits;
        self.num_qubits = grow(start, &name, size)?;
        self.qregs.push(Register { name, start, size });
        Ok(start)
    }

    /// Declares a classical register after the existing bits and returns its
    /// first index.
    pub fn add_creg(&mut self, name: impl Into<String>, size: usize) -> Result<usize, CircuitError> {
        let name = name.into();
        if self.register_name_taken(&name) {
            return Err(CircuitError::AlreadyDefined(name));
        }
        let start = self.num_cbits;
        self.num_cbits = grow(start, &name, size)?;
        self.cregs.push(Register { name, start, size });
        Ok(start)
    }

    pub fn qreg(&self, name: &str) -> Option<&Register> {
        self.qregs.iter().find(|r| r.name == name)
    }

    pub fn creg(&self, name: &str) -> Option<&Register> {
        self.cregs.iter().find(|r| r.name == name)
    }

    /// Looks up a custom gate definition by name.
    pub fn definition(&self, name: &str) -> Option<&GateDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// `(num_qubits, num_params)` of a gate known to this circuit.
    pub fn signature(&self, gate: &GateType) -> Result<(usize, usize), CircuitError> {
        match (gate.num_qubits(), gate.num_params()) {
            (Some(qubits), Some(params)) => Ok((qubits, params)),
            _ => self
                .definition(gate.name())
                .map(|d| (d.num_qubits(), d.num_params()))
                .ok_or_else(|| CircuitError::UnknownGate(gate.name().to_string())),
        }
    }

    fn check_qubits(gate: &str, qubits: &[usize], available: usize) -> Result<(), CircuitError> {
        let mut seen = HashSet::with_capacity(qubits.len());
        for &qubit in qubits {
            if qubit >= available {
                return Err(CircuitError::QubitOutOfRange {
                    gate: gate.to_string(),
                    qubit,
                    available,
                });
            }
            if !seen.insert(qubit) {
                return Err(CircuitError::DuplicateQubit {
                    gate: gate.to_string(),
                    qubit,
                });
            }
        }
        Ok(())
    }

    fn check_application(
        &self,
        gate: &GateType,
        qubits: &[usize],
        num_params: usize,
        available: usize,
    ) -> Result<(), CircuitError> {
        let (expected_qubits, expected_params) = self.signature(gate)?;
        if qubits.len() != expected_qubits {
            return Err(CircuitError::QubitCountMismatch {
                gate: gate.name().to_string(),
                expected: expected_qubits,
                got: qubits.len(),
            });
        }
        if num_params != expected_params {
            return Err(CircuitError::ParamCountMismatch {
                gate: gate.name().to_string(),
                expected: expected_params,
                got: num_params,
            });
        }
        Self::check_qubits(gate.name(), qubits, available)
    }

    /// Appends a gate application after checking its arity and qubits.
    ///
    /// Custom gates must already be registered with
    /// [`Circuit::add_definition`]; they are appended as a single instruction.
    pub fn append(&mut self, gate: GateType, qubits: &[usize], params: &[f64]) -> Result<(), CircuitError> {
        self.check_application(&gate, qubits, params.len(), self.num_qubits)?;
        self.operations.push(Operation::Gate {
            name: gate,
            qubits: qubits.to_vec(),
            params: params.to_vec(),
        });
        Ok(())
    }

    fn validate_definition(&self, def: &GateDefinition) -> Result<(), CircuitError> {
        if def.num_qubits() == 0 {
            return Err(CircuitError::NoQubits(def.name.clone()));
        }
        for op in def.body() {
            match op {
                DefinitionOp::Gate {
                    name,
                    qubits,
                    params,
                } => {
                    if name.name() == def.name {
                        return Err(CircuitError::RecursiveDefinition(def.name.clone()));
                    }
                    self.check_application(name, qubits, params.len(), def.num_qubits())?;
                    for param in params {
                        if let Some(var) = param.free_variable() {
                            return Err(CircuitError::UndefinedParameter {
                                gate: def.name.clone(),
                                name: var.to_string(),
                            });
                        }
                        if let Some(index) = param.max_param().filter(|&i| i >= def.num_params()) {
                            return Err(CircuitError::UndefinedParameter {
                                gate: def.name.clone(),
                                name: format!("#{}", index),
                            });
                        }
                    }
                }
                DefinitionOp::Barrier { qubits } => {
                    Self::check_qubits("barrier", qubits, def.num_qubits())?;
                }
            }
        }
        Ok(())
    }

    /// Registers a custom gate definition.
    ///
    /// The name must not clash with a built-in gate or an existing
    /// definition, and every gate in the body must already be known.
    pub fn add_definition(&mut self, def: GateDefinition) -> Result<(), CircuitError> {
        if !GateType::from_name(&def.name).is_custom() || self.definition(&def.name).is_some() {
            return Err(CircuitError::AlreadyDefined(def.name));
        }
        self.validate_definition(&def)?;
        debug!(
            gate = %def.name,
            params = def.num_params(),
            qubits = def.num_qubits(),
            statements = def.body().len(),
            opaque = def.is_opaque(),
            "registered gate definition"
        );
        self.definitions.push(def);
        Ok(())
    }

    /// Copies the definitions of `other` that this circuit does not have yet.
    /// A definition with the same name but a different body is an error.
    pub fn import_definitions(&mut self, other: &Circuit) -> Result<(), CircuitError> {
        for def in &other.definitions {
            match self.definition(&def.name) {
                Some(existing) if existing == def => {}
                Some(_) => return Err(CircuitError::AlreadyDefined(def.name.clone())),
                None => self.add_definition(def.clone())?,
            }
        }
        Ok(())
    }

    /// Registers `def` if needed and appends one application of it.
    ///
    /// This is the programmatic counterpart of a `gate` statement followed
    /// by a call: the circuit ends up with the definition in its registry and
    /// a single custom instruction on `qubits`. Custom gates used by `def`
    /// must already be registered; [`Circuit::append_circuit_as_gate`] brings
    /// them along from a sub-circuit.
    pub fn append_custom(
        &mut self,
        def: &GateDefinition,
        qubits: &[usize],
        params: &[f64],
    ) -> Result<(), CircuitError> {
        match self.definition(&def.name) {
            Some(existing) if existing == def => {}
            Some(_) => return Err(CircuitError::AlreadyDefined(def.name.clone())),
            None => self.add_definition(def.clone())?,
        }
        self.append(GateType::Custom(def.name.clone()), qubits, params)
    }

    /// Turns `body` into the gate `name` and appends one application of it
    /// on `qubits`.
    ///
    /// The definitions `body` relies on are imported first, in their
    /// registration order, so gates nested through sub-circuits end up with
    /// the same registry as the equivalent chain of `gate` statements.
    pub fn append_circuit_as_gate(
        &mut self,
        body: &Circuit,
        name: impl Into<String>,
        qubits: &[usize],
    ) -> Result<(), CircuitError> {
        let def = body.to_definition(name)?;
        self.import_definitions(body)?;
        self.append_custom(&def, qubits, &[])
    }

    /// Turns this circuit into a gate definition acting on all its qubits.
    ///
    /// Only gates and barriers are allowed. Formal qubits are named `q0`,
    /// `q1`, ... and the definition takes no parameters.
    pub fn to_definition(&self, name: impl Into<String>) -> Result<GateDefinition, CircuitError> {
        let qubits = (0..self.num_qubits).map(|i| format!("q{}", i)).collect();
        let mut def = GateDefinition::new(name, Vec::new(), qubits);
        for op in &self.operations {
            match op {
                Operation::Gate {
                    name,
                    qubits,
                    params,
                } => {
                    def.add_gate(
                        name.clone(),
                        qubits,
                        params.iter().map(|&p| Expr::Float(p)).collect(),
                    );
                }
                Operation::Barrier { qubits } => def.push(DefinitionOp::Barrier {
                    qubits: qubits.clone(),
                }),
                other => return Err(CircuitError::NotAGateCircuit(other.kind().to_string())),
            }
        }
        Ok(def)
    }

    /// Expands custom instructions one level deep.
    pub fn decompose(&self) -> Result<Circuit, CircuitError> {
        self.unroll(Some(1))
    }

    /// Expands custom instructions recursively until only built-in and opaque
    /// gates remain.
    pub fn flatten(&self) -> Result<Circuit, CircuitError> {
        self.unroll(None)
    }

    /// Expands custom instructions `levels` deep (`None` for all the way).
    ///
    /// Definitions no longer referenced by the result are dropped from its
    /// registry. Opaque gates are kept as they are.
    pub fn unroll(&self, levels: Option<usize>) -> Result<Circuit, CircuitError> {
        let mut operations = Vec::with_capacity(self.operations.len());
        for op in &self.operations {
            self.expand_into(op, levels, 0, &mut operations)?;
        }
        trace!(
            before = self.operations.len(),
            after = operations.len(),
            ?levels,
            "unrolled custom gates"
        );
        let mut unrolled = Circuit {
            num_qubits: self.num_qubits,
            num_cbits: self.num_cbits,
            qregs: self.qregs.clone(),
            cregs: self.cregs.clone(),
            definitions: self.definitions.clone(),
            operations,
        };
        unrolled.prune_definitions();
        Ok(unrolled)
    }

    fn expand_into(
        &self,
        op: &Operation,
        levels: Option<usize>,
        depth: usize,
        out: &mut Vec<Operation>,
    ) -> Result<(), CircuitError> {
        match op {
            Operation::Gate {
                name: GateType::Custom(gate),
                qubits,
                params,
            } if levels.map_or(true, |max| depth < max) => {
                let def = self
                    .definition(gate)
                    .ok_or_else(|| CircuitError::UnknownGate(gate.clone()))?;
                if def.is_opaque() {
                    out.push(op.clone());
                    return Ok(());
                }
                if depth > self.definitions.len() {
                    return Err(CircuitError::RecursiveDefinition(gate.clone()));
                }
                for inner in def.instantiate(qubits, params)? {
                    self.expand_into(&inner, levels, depth + 1, out)?;
                }
            }
            Operation::Conditional { creg, value, op } => {
                let mut expanded = Vec::new();
                self.expand_into(op, levels, depth, &mut expanded)?;
                out.extend(expanded.into_iter().map(|inner| Operation::Conditional {
                    creg: creg.clone(),
                    value: *value,
                    op: Box::new(inner),
                }));
            }
            _ => out.push(op.clone()),
        }
        Ok(())
    }

    fn prune_definitions(&mut self) {
        let mut used: HashSet<String> = self
            .operations
            .iter()
            .filter_map(|op| op.custom_gate())
            .map(str::to_string)
            .collect();
        // Dependencies are registered before their users.
        for def in self.definitions.iter().rev() {
            if used.contains(&def.name) {
                for dep in def.dependencies() {
                    used.insert(dep.to_string());
                }
            }
        }
        self.definitions.retain(|d| used.contains(&d.name));
    }

    /// Number of operations per gate name (`measure`, `reset` and `barrier`
    /// included).
    pub fn gate_counts(&self) -> BTreeMap<String, usize> {
        fn key(op: &Operation) -> String {
            match op {
                Operation::Gate { name, .. } => name.name().to_string(),
                Operation::Measure { .. } => "measure".to_string(),
                Operation::Reset { .. } => "reset".to_string(),
                Operation::Barrier { .. } => "barrier".to_string(),
                Operation::Conditional { op, .. } => key(op),
            }
        }
        let mut counts = BTreeMap::new();
        for op in &self.operations {
            *counts.entry(key(op)).or_insert(0) += 1;
        }
        counts
    }

    /// Number of layers of operations, barriers excluded.
    pub fn depth(&self) -> usize {
        let mut levels = vec![0usize; self.num_qubits];
        for op in &self.operations {
            if matches!(op, Operation::Barrier { .. }) {
                continue;
            }
            let qubits = op.qubits();
            if let Some(&max) = qubits.iter().max() {
                if max >= levels.len() {
                    levels.resize(max + 1, 0);
                }
            }
            let level = qubits.iter().map(|&q| levels[q]).max().unwrap_or(0) + 1;
            for q in qubits {
                levels[q] = level;
            }
        }
        levels.into_iter().max().unwrap_or(0)
    }

    fn qubit_label(&self, index: usize) -> String {
        if covers(&self.qregs, self.num_qubits) {
            if let Some(label) = self.qregs.iter().find_map(|r| r.label(index)) {
                return label;
            }
        }
        format!("q[{}]", index)
    }

    fn cbit_label(&self, index: usize) -> String {
        if covers(&self.cregs, self.num_cbits) {
            if let Some(label) = self.cregs.iter().find_map(|r| r.label(index)) {
                return label;
            }
        }
        format!("c[{}]", index)
    }

    fn op_to_qasm(&self, op: &Operation) -> String {
        match op {
            Operation::Gate {
                name,
                qubits,
                params,
            } => {
                let mut stmt = name.name().to_string();
                if !params.is_empty() {
                    let rendered: Vec<String> = params.iter().map(|p| format!("{:?}", p)).collect();
                    stmt.push_str(&format!("({})", rendered.join(",")));
                }
                let args: Vec<String> = qubits.iter().map(|&q| self.qubit_label(q)).collect();
                format!("{} {};", stmt, args.join(","))
            }
            Operation::Measure { qubit, cbit } => format!(
                "measure {} -> {};",
                self.qubit_label(*qubit),
                self.cbit_label(*cbit)
            ),
            Operation::Reset { qubit } => format!("reset {};", self.qubit_label(*qubit)),
            Operation::Barrier { qubits } => {
                let args: Vec<String> = qubits.iter().map(|&q| self.qubit_label(q)).collect();
                format!("barrier {};", args.join(","))
            }
            Operation::Conditional { creg, value, op } => {
                format!("if({}=={}) {}", creg, value, self.op_to_qasm(op))
            }
        }
    }

    /// Writes the circuit back out as an OpenQASM 2.0 program, definitions
    /// included.
    pub fn to_qasm(&self) -> String {
        let mut lines = vec![
            "OPENQASM 2.0;".to_string(),
            "include \"qelib1.inc\";".to_string(),
        ];
        lines.extend(self.definitions.iter().map(GateDefinition::to_qasm));
        lines.extend(declarations("qreg", "q", &self.qregs, self.num_qubits));
        lines.extend(declarations("creg", "c", &self.cregs, self.num_cbits));
        lines.extend(self.operations.iter().map(|op| self.op_to_qasm(op)));
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
