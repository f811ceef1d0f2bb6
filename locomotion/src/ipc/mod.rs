//! Command interface: s-expression messages in, s-expression responses out.

pub mod dispatch;
pub mod sexp;

pub use dispatch::handle_message;
