//! # iris_binder
//!
//! The argument-binding subsystem: given a candidate signature and one
//! observed argument list, produce a reusable argument plan or reject the
//! candidate with a precise reason.
//!
//! # Architecture
//!
//! - [`param`]: parameter descriptors and validated [`Signature`]s.
//! - [`builder`]: the closed set of [`ArgBuilder`] variants, one per
//!   formal parameter, each declaring priority and consumption.
//! - [`assemble`]: the assembler that orders builders, partitions the
//!   argument positions, verifies coverage, and reassembles the emitted
//!   nodes in declaration order.
//! - [`expr`]: the argument plan itself, a small position-based
//!   expression tree.
//! - [`guard`]: per-position type guards and shape fingerprints, the key
//!   under which plans are cached.
//! - [`storage`]: registered storage types and the per-bind cells
//!   constructed from them.
//!
//! Synthetic parameters (ambient context, call-site storage) resolve
//! before every caller-supplied one and consume no argument positions;
//! callers never see them.
//!
//! # Usage
//!
//! ```ignore
//! let registry = StorageRegistry::new();
//! let sig = Signature::new(vec![
//!     ParamSpec::context("ctx"),
//!     ParamSpec::positional("a"),
//!     ParamSpec::positional("b"),
//! ])?;
//! let env = BindEnv::new(&registry).with_context();
//! let bound = bind(&sig, &args, &env)?;
//! assert_eq!(bound.exprs().to_string(), "(<context>, arg[0], arg[1])");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assemble;
pub mod builder;
pub mod error;
pub mod expr;
pub mod guard;
pub mod param;
pub mod storage;

pub use assemble::{bind, BindEnv, BoundArgs};
pub use builder::{ArgBuilder, BuilderSlot, Claim, Consumption, SYNTHETIC_PRIORITY};
pub use error::{BindError, BindResult, SignatureError};
pub use expr::{ArgExpr, ArgListExpr, InvokeExpr, TargetId};
pub use guard::{ArgShape, PACKED_SHAPE_MAX};
pub use param::{ArityRange, ParamKind, ParamSpec, Signature};
pub use storage::{StorageCell, StorageFactory, StorageRegistry, StorageTypeId};
