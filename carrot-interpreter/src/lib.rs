pub mod builtins;
pub mod environment;
pub mod evaluator;
pub mod heap;
pub mod object;
pub mod operators;
pub mod print_handler;

pub use evaluator::Evaluator;
pub use object::EvaluationError;
pub use print_handler::PrintHandler;
