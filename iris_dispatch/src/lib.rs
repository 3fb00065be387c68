//! # iris_dispatch
//!
//! Dynamic call sites over the argument binder: overload sets with native
//! targets, compiled calls that replay a bound plan, and a per-site
//! rebind cache keyed by argument shape.
//!
//! # Architecture
//!
//! - [`overload`]: candidates, the [`HostFn`] target type, and the
//!   [`ArgPack`] a target receives with synthetic slots already filled.
//! - [`compiled`]: a bind product fused with its target into a
//!   replayable [`CompiledCall`] owning its storage cells.
//! - [`site`]: the [`CallSite`] itself, with a monomorphic fast slot, a
//!   sharded shape table, first-completed-bind-wins insertion, and a
//!   megamorphic cap.
//! - [`context`]: the runtime-owned [`EvalContext`] threaded into every
//!   invocation.
//! - [`config`], [`stats`]: per-site tuning and counters.
//!
//! A guard miss anywhere in the lookup path is a signal to look further
//! or rebind; it is never surfaced to the caller as an error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiled;
pub mod config;
pub mod context;
pub mod overload;
pub mod site;
pub mod stats;

pub use compiled::CompiledCall;
pub use config::{SiteConfig, DEFAULT_SHAPE_LIMIT};
pub use context::EvalContext;
pub use overload::{ArgPack, ArgSlot, HostFn, Overload, OverloadSet, OverloadSetRef};
pub use site::{CallSite, SiteClassification};
pub use stats::SiteStats;
