pub mod diagnostic;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod sources;
pub mod texts;
pub mod value;

pub use diagnostic::*;
pub use error::*;
pub use evaluator::*;
pub use expression::*;
pub use functions::*;
pub use sources::*;
pub use texts::*;
pub use value::*;


#[cfg(test)]
mod tests_functions;

#[cfg(test)]
mod tests_data_access;
