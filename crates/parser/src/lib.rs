//! Go lexer and parser.
//!
//! - The lexer uses Logos and implements Go semicolon insertion.
//! - The parser is a hand-written recursive-descent parser producing an arena AST that
//!   keeps byte spans for every node, so callers can splice edits into the original text.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
mod parser_support;
pub mod pos;
pub mod walk;

pub use error::{Diag, ParseFailure};
pub use lexer::Lexer;
pub use parser::{parse_source, SyntaxTree};
