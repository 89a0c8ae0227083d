pub mod circuit;
pub mod definition;
pub mod error;
pub mod expr;
pub mod gates;
pub mod operations;
pub mod unitary;

// Re-export for easier access
pub use circuit::{Circuit, Register, MAX_REGISTER_BITS};
pub use definition::{DefinitionOp, GateDefinition};
pub use error::CircuitError;
pub use expr::{Expr, ExprError, Function};
pub use gates::GateType;
pub use operations::Operation;
