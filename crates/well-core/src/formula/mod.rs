//! Fórmulas: lexer, parser, sustitución de etiquetas y compilador.

pub mod compiler;
pub mod labels;
pub mod lexer;
pub mod parser;

pub use compiler::{CompiledFormula, CompiledFormulas, FormulaCompiler};
pub use labels::substitute_labels;
pub use parser::{parse, BinOp, Expr};
