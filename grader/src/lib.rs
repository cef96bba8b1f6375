// Grader
// Compares function calls and lambda definitions between a student program
// and a solution program, producing templated feedback.
pub mod checks;
pub mod compare;
pub mod config;
pub mod equality;
pub mod error;
pub mod feedback;
pub mod index;
pub mod reporter;
pub mod state;

pub use checks::{CallCheck, Check, CheckResult, LambdaCheck};
pub use config::{ConfigError, GraderConfig};
pub use equality::EqualityMode;
pub use error::{AuthoringError, ProgramError};
pub use feedback::{Feedback, FeedbackMessage, Outcome};
pub use reporter::{Report, Reporter};
pub use state::{MatchState, Program, State};
