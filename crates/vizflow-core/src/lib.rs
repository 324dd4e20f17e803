mod plan;
mod validation;
mod workflow;

pub use plan::*;
pub use validation::*;
pub use workflow::*;
