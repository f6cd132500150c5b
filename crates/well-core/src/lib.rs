//! well-core: compilación de fórmulas, evaluación y motor de cálculo de
//! los reportes de producción.
pub mod checkpoint;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod eval;
pub mod formula;
pub mod hashing;
pub mod session;
pub mod watcher;

pub use checkpoint::{Checkpoint, CheckpointData, FileCheckpoint, InMemoryCheckpoint};
pub use engine::{CalculationEngine, RecomputeSummary};
pub use errors::{CoreError, EvalError, FormulaError};
pub use eval::{evaluate, format_number, Outcome, Value};
pub use formula::{CompiledFormula, CompiledFormulas, FormulaCompiler};
pub use session::{LiveState, ReportSession};
pub use watcher::{definitions_hash, FormulaSource, FormulaWatcher, InMemoryFormulaSource, TickOutcome, WatcherHandle};
