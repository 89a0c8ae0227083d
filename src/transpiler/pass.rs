use crate::ir::{Circuit, CircuitError};
use tracing::debug;

/// A trait for transpiler passes.
///
/// A pass takes a circuit and returns a transformed circuit, or the reason it
/// could not transform it.
pub trait Pass {
    /// Returns the name of the pass.
    fn name(&self) -> &str;

    /// Runs the pass on the given circuit.
    fn run(&self, circuit: &Circuit) -> Result<Circuit, CircuitError>;
}

/// Runs a sequence of transpiler passes, stopping at the first failure.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Runs all passes in sequence on the given circuit.
    pub fn run(&self, circuit: &Circuit) -> Result<Circuit, CircuitError> {
        let mut current_circuit = circuit.clone();
        for pass in &self.passes {
            current_circuit = pass.run(&current_circuit)?;
            debug!(
                pass = pass.name(),
                operations = current_circuit.operations.len(),
                "pass finished"
            );
        }
        Ok(current_circuit)
    }
}
