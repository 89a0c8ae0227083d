pub mod pass;
pub mod unroll;

pub use self::pass::{Pass, PassManager};
pub use self::unroll::UnrollCustomGates;
