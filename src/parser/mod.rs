pub mod ast;
pub mod error;
pub mod options;
pub mod rules;

pub use self::error::{Location, ParseError};
pub use self::options::ParseOptions;

use self::ast::{Argument, Expr, ParsedStatement};
use self::rules::{openqasm_version, sp, statement};
use crate::ir::{Circuit, CircuitError, DefinitionOp, GateDefinition, GateType, Operation};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, trace};

/// Parses an OpenQASM 2.0 program with the default [`ParseOptions`].
pub fn parse_qasm(input: &str) -> Result<Circuit, ParseError> {
    parse_qasm_with(input, &ParseOptions::default())
}

/// Reads and parses an OpenQASM 2.0 file.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Circuit, ParseError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = source.len(), "read OpenQASM source");
    parse_qasm_with(&source, options)
}

fn skip_trivia(input: &str) -> &str {
    sp(input).map_or(input, |(rest, _)| rest)
}

fn snippet(input: &str) -> String {
    let line = input.lines().next().unwrap_or_default().trim();
    line.chars().take(40).collect()
}

/// Parses an OpenQASM 2.0 program.
///
/// Every `gate` definition is registered in the returned circuit and each
/// call to it becomes a single [`GateType::Custom`] instruction, unless
/// `options.expand_custom_gates` asks for the inlined form.
pub fn parse_qasm_with(input: &str, options: &ParseOptions) -> Result<Circuit, ParseError> {
    // 1. Skip initial comments/whitespace and parse Header
    let current_input = skip_trivia(input);
    let (rem, version) =
        openqasm_version(current_input).map_err(|_| ParseError::MissingHeader)?;
    if version != "2.0" {
        return Err(ParseError::UnsupportedVersion(version));
    }

    // 2. Parse remaining statements
    let mut ctx = ParseContext {
        source: input,
        options,
        circuit: Circuit::new(0, 0),
        offset: 0,
    };
    let mut current_input = rem;
    loop {
        current_input = skip_trivia(current_input);
        if current_input.is_empty() {
            break;
        }
        ctx.offset = input.len() - current_input.len();

        let (rem, stmt) = statement(current_input).map_err(|_| ParseError::Syntax {
            near: snippet(current_input),
            location: ctx.location(),
        })?;
        current_input = rem;

        trace!(offset = ctx.offset, ?stmt, "lowering statement");
        ctx.lower(stmt)?;
    }

    let circuit = ctx.circuit;
    debug!(
        qubits = circuit.num_qubits,
        cbits = circuit.num_cbits,
        definitions = circuit.definitions.len(),
        operations = circuit.operations.len(),
        "parsed OpenQASM program"
    );
    if options.expand_custom_gates {
        return circuit.flatten().map_err(|source| ParseError::Circuit {
            source,
            location: Location::from_offset(input, input.len()),
        });
    }
    Ok(circuit)
}

struct ParseContext<'a> {
    source: &'a str,
    options: &'a ParseOptions,
    circuit: Circuit,
    /// Byte offset of the statement being lowered.
    offset: usize,
}

impl ParseContext<'_> {
    fn location(&self) -> Location {
        Location::from_offset(self.source, self.offset)
    }

    fn circuit_error(&self, source: CircuitError) -> ParseError {
        ParseError::Circuit {
            source,
            location: self.location(),
        }
    }

    fn invalid(&self, message: impl Into<String>) -> ParseError {
        ParseError::Invalid {
            message: message.into(),
            location: self.location(),
        }
    }

    fn redefinition(&self, name: &str) -> ParseError {
        ParseError::Redefinition {
            name: name.to_string(),
            location: self.location(),
        }
    }

    /// Registers, built-in gates and custom gates share one namespace.
    fn name_taken(&self, name: &str) -> bool {
        self.circuit.qreg(name).is_some()
            || self.circuit.creg(name).is_some()
            || self.circuit.definition(name).is_some()
            || !GateType::from_name(name).is_custom()
    }

    fn lower(&mut self, stmt: ParsedStatement) -> Result<(), ParseError> {
        match stmt {
            ParsedStatement::Include(filename) => {
                if !self.options.builtin_includes.contains(&filename) {
                    return Err(ParseError::UnsupportedInclude {
                        file: filename,
                        location: self.location(),
                    });
                }
                debug!(file = %filename, "include satisfied by built-in gates");
            }
            ParsedStatement::QReg(name, size) => {
                if self.name_taken(&name) {
                    return Err(self.redefinition(&name));
                }
                self.circuit
                    .add_qreg(name, size)
                    .map_err(|e| self.circuit_error(e))?;
            }
            ParsedStatement::CReg(name, size) => {
                if self.name_taken(&name) {
                    return Err(self.redefinition(&name));
                }
                self.circuit
                    .add_creg(name, size)
                    .map_err(|e| self.circuit_error(e))?;
            }
            ParsedStatement::GateDef(name, params, qubits, body) => {
                self.define_gate(name, params, qubits, Some(body))?;
            }
            ParsedStatement::Opaque(name, params, qubits) => {
                self.define_gate(name, params, qubits, None)?;
            }
            ParsedStatement::Gate(name, qubits, params) => {
                self.apply_gate(&name, &qubits, &params)?;
            }
            ParsedStatement::Measure(qubit, cbit) => {
                let q_indices = self.resolve_qubits(&qubit)?;
                let c_indices = self.resolve_cbits(&cbit)?;
                if q_indices.len() != c_indices.len() {
                    return Err(ParseError::BroadcastMismatch {
                        statement: "measure",
                        location: self.location(),
                    });
                }
                for (q, c) in q_indices.into_iter().zip(c_indices) {
                    self.circuit.add_op(Operation::Measure { qubit: q, cbit: c });
                }
            }
            ParsedStatement::Reset(qubit) => {
                for q in self.resolve_qubits(&qubit)? {
                    self.circuit.add_op(Operation::Reset { qubit: q });
                }
            }
            ParsedStatement::Barrier(args) => {
                let mut qubits: Vec<usize> = Vec::new();
                let mut seen = HashSet::new();
                for arg in &args {
                    for q in self.resolve_qubits(arg)? {
                        if seen.insert(q) {
                            qubits.push(q);
                        }
                    }
                }
                self.circuit.add_op(Operation::Barrier { qubits });
            }
            ParsedStatement::If(creg, value, op) => {
                if self.circuit.creg(&creg).is_none() {
                    return Err(ParseError::UndefinedRegister {
                        kind: "classical",
                        name: creg,
                        location: self.location(),
                    });
                }
                let start = self.circuit.operations.len();
                self.lower(*op)?;
                let guarded = self.circuit.operations.split_off(start);
                self.circuit
                    .operations
                    .extend(guarded.into_iter().map(|op| Operation::Conditional {
                        creg: creg.clone(),
                        value,
                        op: Box::new(op),
                    }));
            }
        }
        Ok(())
    }

    // --- Gate definitions ---

    fn define_gate(
        &mut self,
        name: String,
        params: Vec<String>,
        qubits: Vec<String>,
        body: Option<Vec<ParsedStatement>>,
    ) -> Result<(), ParseError> {
        if qubits.is_empty() {
            return Err(self.invalid(format!("gate '{}' must act on at least one qubit", name)));
        }
        let mut param_index = HashMap::new();
        for (i, param) in params.iter().enumerate() {
            // `pi` is a constant in every expression.
            if param == "pi" || param_index.insert(param.clone(), i).is_some() {
                return Err(self.redefinition(param));
            }
        }
        let mut qubit_index = HashMap::new();
        for (i, qubit) in qubits.iter().enumerate() {
            if param_index.contains_key(qubit) || qubit_index.insert(qubit.clone(), i).is_some() {
                return Err(self.redefinition(qubit));
            }
        }

        let lowered_body = match &body {
            Some(stmts) => Some(
                stmts
                    .iter()
                    .map(|stmt| self.lower_body_statement(&name, &param_index, &qubit_index, stmt))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        let builtin = GateType::from_name(&name);
        if !builtin.is_custom() {
            // qelib1.inc restates the standard gates; a matching signature
            // keeps the built-in.
            if builtin.num_qubits() == Some(qubits.len()) && builtin.num_params() == Some(params.len())
            {
                debug!(gate = %name, "keeping built-in gate over matching definition");
                return Ok(());
            }
            return Err(self.redefinition(&name));
        }
        if self.name_taken(&name) {
            return Err(self.redefinition(&name));
        }

        let definition = GateDefinition {
            name,
            params,
            qubits,
            body: lowered_body,
        };
        self.circuit
            .add_definition(definition)
            .map_err(|e| self.circuit_error(e))
    }

    fn lower_body_statement(
        &self,
        gate: &str,
        param_index: &HashMap<String, usize>,
        qubit_index: &HashMap<String, usize>,
        stmt: &ParsedStatement,
    ) -> Result<DefinitionOp, ParseError> {
        let formal = |arg: &Argument| -> Result<usize, ParseError> {
            let (name, idx) = arg;
            if idx.is_some() {
                return Err(self.invalid(format!("Cannot index a qubit argument: {}", name)));
            }
            qubit_index.get(name).copied().ok_or_else(|| {
                self.invalid(format!("'{}' is not a qubit argument of gate '{}'", name, gate))
            })
        };
        match stmt {
            ParsedStatement::Gate(name, args, exprs) => {
                let qubits = args.iter().map(formal).collect::<Result<Vec<_>, _>>()?;
                let params = exprs
                    .iter()
                    .map(|e| {
                        e.resolve(param_index).map_err(|source| ParseError::Expression {
                            source,
                            location: self.location(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DefinitionOp::Gate {
                    name: GateType::from_name(name),
                    qubits,
                    params,
                })
            }
            ParsedStatement::Barrier(args) => Ok(DefinitionOp::Barrier {
                qubits: args.iter().map(formal).collect::<Result<Vec<_>, _>>()?,
            }),
            _ => Err(self.invalid(format!(
                "only gate applications are valid within the body of gate '{}'",
                gate
            ))),
        }
    }

    // --- Resolution & Mapping ---

    fn resolve_qubits(&self, arg: &Argument) -> Result<Vec<usize>, ParseError> {
        let (name, idx) = arg;
        let register = self
            .circuit
            .qreg(name)
            .ok_or_else(|| ParseError::UndefinedRegister {
                kind: "quantum",
                name: name.clone(),
                location: self.location(),
            })?;
        self.index_register(name, register.start, register.size, *idx)
    }

    fn resolve_cbits(&self, arg: &Argument) -> Result<Vec<usize>, ParseError> {
        let (name, idx) = arg;
        let register = self
            .circuit
            .creg(name)
            .ok_or_else(|| ParseError::UndefinedRegister {
                kind: "classical",
                name: name.clone(),
                location: self.location(),
            })?;
        self.index_register(name, register.start, register.size, *idx)
    }

    fn index_register(
        &self,
        name: &str,
        start: usize,
        size: usize,
        idx: Option<usize>,
    ) -> Result<Vec<usize>, ParseError> {
        match idx {
            Some(i) if i < size => Ok(vec![start + i]),
            Some(i) => Err(ParseError::IndexOutOfBounds {
                name: name.to_string(),
                index: i,
                size,
                location: self.location(),
            }),
            // Broadcasting: return all bits in register
            None => Ok((start..start + size).collect()),
        }
    }

    fn apply_gate(&mut self, name: &str, args: &[Argument], exprs: &[Expr]) -> Result<(), ParseError> {
        let gate = GateType::from_name(name);
        self.circuit
            .signature(&gate)
            .map_err(|e| self.circuit_error(e))?;

        let params = exprs
            .iter()
            .map(Expr::evaluate)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ParseError::Expression {
                source,
                location: self.location(),
            })?;

        let mut args_indices = Vec::with_capacity(args.len());
        for arg in args {
            args_indices.push(self.resolve_qubits(arg)?);
        }
        let max_len = args_indices.iter().map(Vec::len).max().unwrap_or(1);

        // Validate broadcasting
        if args_indices
            .iter()
            .any(|indices| indices.len() != 1 && indices.len() != max_len)
        {
            return Err(ParseError::BroadcastMismatch {
                statement: "gate call",
                location: self.location(),
            });
        }

        for i in 0..max_len {
            let qubits: Vec<usize> = args_indices
                .iter()
                .map(|indices| if indices.len() == 1 { indices[0] } else { indices[i] })
                .collect();
            self.circuit
                .append(gate.clone(), &qubits, &params)
                .map_err(|e| self.circuit_error(e))?;
        }
        Ok(())
    }
}
