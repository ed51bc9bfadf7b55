//! The configured objects that mission-script identifiers refer to.
//!
//! An [ObjectStore] maps names to shared [ObjectRef] handles. Objects are property bags
//! ([Object]) built from the [catalog](Object::spacecraft) of supported kinds, plus the
//! Parameter objects: user Variables, Arrays and Strings, and system Parameters that are
//! computed from an owner object (e.g. `sat1.Earth.SMA`).
//!
//! System Parameters are created on demand by a [ParameterFactory]. Creation is idempotent by
//! name, so asking twice for `sat1.SMA` returns the same object.
//!
//! Lookups go through an [ObjectScope], which searches a local store first and then an
//! optional global store, so that function-local interpretation can see script-level objects.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use catalog::AXIS_TYPES;
pub use error::*;
pub use names::*;
pub use object::*;
pub use parameter::*;
pub use store::*;

mod catalog;
mod error;
mod names;
mod object;
mod parameter;
mod store;
