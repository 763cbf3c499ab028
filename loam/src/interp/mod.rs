//! Tree-walking interpreter: values, environments, and the evaluator

pub mod env;
pub mod error;
pub mod eval;
pub mod value;

pub use env::{EnvRef, Environment, assign_at, child_env, get_at};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{Flow, INITIALIZER_NAME, Interpreter};
pub use value::{Class, Function, Instance, NativeFn, Value};
