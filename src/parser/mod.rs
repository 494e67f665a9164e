// Field grammars for the engagement dataset

pub mod date;
pub mod lexer;

// Public API re-exports
pub use date::{parse_slash_date, SlashDate};
