//! Middleware stack, outermost to innermost:
//! 1. Panic recovery — never let a handler panic take the process down.
//! 2. Request logging — method, path, status, duration, identifiers.

pub mod logging;
pub mod recovery;
