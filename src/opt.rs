//! Netlist-level optimizers of the compiler midend.

mod dead;

pub use dead::{dead_all, dead_all_scoped, dead_dtypes, dead_dtypes_scoped, dead_modules};
