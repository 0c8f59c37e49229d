//! Terminal output helpers.

pub mod progress;

pub use progress::CategoryProgress;

/// Whether stdout is an interactive terminal (colours allowed).
pub fn stdout_is_terminal() -> bool {
    is_terminal::is_terminal(std::io::stdout())
}

/// Whether stderr is an interactive terminal (progress bars allowed).
pub fn stderr_is_terminal() -> bool {
    is_terminal::is_terminal(std::io::stderr())
}
