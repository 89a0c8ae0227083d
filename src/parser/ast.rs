/// Internal AST for parsed statements
pub use crate::ir::Expr;

/// A register or formal argument reference, optionally indexed: `q` or `q[0]`.
pub type Argument = (String, Option<usize>);

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStatement {
    QReg(String, usize),
    CReg(String, usize),
    Gate(String, Vec<Argument>, Vec<Expr>), // Name, Qubits, Params
    Measure(Argument, Argument),            // Qubit -> Cbit
    Reset(Argument),
    Include(String),                                                 // Filename
    Barrier(Vec<Argument>),                                          // Qubits
    GateDef(String, Vec<String>, Vec<String>, Vec<ParsedStatement>), // Name, Params, Qubits, Body
    Opaque(String, Vec<String>, Vec<String>),                        // Name, Params, Qubits
    If(String, u64, Box<ParsedStatement>),                           // CReg, Val, Op
}
