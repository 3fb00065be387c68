//! # iris_core
//!
//! Shared foundation for the Iris dynamic dispatch runtime: the boxed
//! [`Value`] representation, the [`TypeTag`] guards are built from, global
//! string interning, and the runtime error type.
//!
//! Everything here is deliberately small and `Copy`-friendly; the binder
//! and dispatch crates move values around by the sliceful.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod intern;
pub mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use intern::{intern, InternedString};
pub use value::{TypeTag, Value};
