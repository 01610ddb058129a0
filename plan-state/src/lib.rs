//! Plan state is an untyped, JSON-shaped tree of values that plan steps use to
//! carry configuration and results from one step to the next.
//!
//! The engine that runs the steps treats a [`State`] as an opaque
//! accumulator:
//! 1. it reads inputs with [`State::get`] and the typed accessors, by dotted
//!    path, e.g. `state.get_number("cluster.nodes")`;
//! 2. it records outputs with [`State::set`] and [`State::merge`];
//! 3. it compares snapshots with `==` to detect whether a step changed
//!    anything, and can record what changed as a JSON Patch with
//!    [`State::diff`].
//!
//! ## Coercion
//!
//! The typed accessors accept a string where a number or boolean is asked
//! for, if the string parses as one. Coercion is type directed: `"0.2"` is a
//! number but not a boolean, `"true"` is a boolean but not a number, and a
//! number is never a boolean or a string.

pub mod error;
pub mod state;
pub mod value;

pub use error::{Result, StateError};
pub use state::State;
pub use value::{Value, ValueType};
