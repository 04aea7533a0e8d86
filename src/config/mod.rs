//! Lock options for lockmark.
//!
//! `LockOptions` controls how markers are created and checked. It can be built
//! in code or loaded from YAML so that embedding applications can carry it in
//! their own configuration files. Unknown fields are ignored and every field
//! has a default.

mod model;
mod operations;


pub use model::LockOptions;
