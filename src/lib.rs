pub use {slab, smol_str};

pub mod ast;
pub mod base;
pub mod diag;
pub mod opt;
pub mod testing;

/// netlist-ir uses SmolStr as symbol string so that
/// it can optimize for both memory usage and performance
pub type SymbolStr = smol_str::SmolStr;
