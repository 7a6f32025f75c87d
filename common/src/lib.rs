pub mod ast;
mod builder;
pub mod constants;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parameters;
pub mod parser;
pub mod profiles;
pub mod tags;
mod validate;
pub mod value;
mod writer;

pub use constants::*;
pub use error::*;
pub use parameters::*;
pub use profiles::*;
pub use tags::*;
pub use value::*;
