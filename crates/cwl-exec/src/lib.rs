//! `cwl-execution` — expression evaluation, input coercion and command-line
//! materialization for documents loaded by `commonwl`.

pub mod coerce;
pub mod command;
pub mod docker;
pub mod environment;
pub mod error;
pub mod expression;
pub mod platform;
pub mod runtime;
pub mod shell;

pub use coerce::coerce_inputs;
pub use command::{build_command, MaterializedCommand};
pub use environment::RuntimeEnvironment;
pub use error::InspectionError;
pub use platform::Platform;
pub use runtime::Runtime;
pub use shell::assemble_shell_command;
