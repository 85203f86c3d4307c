use bitflags::bitflags;

use crate::{SymbolStr, ast::NodeCommon, base::ISlabID};

/// Module or package definition. Modules sit in the netlist's root list,
/// ordered by instantiation level; they never nest in the tree (a [`CellObj`]
/// points at its target module instead).
///
/// [`CellObj`]: crate::ast::CellObj
#[derive(Debug, Clone)]
pub struct ModuleObj {
    pub name: SymbolStr,
    pub kind: ModuleKind,
    /// 实例层级: 1 是合成的 wrapper, 2 是用户顶层模块.
    pub level: u32,
    pub flags: ModuleFlags,
    pub common: NodeCommon,
}

impl ModuleObj {
    pub fn new(name: impl Into<SymbolStr>, kind: ModuleKind, level: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            level,
            flags: ModuleFlags::empty(),
            common: NodeCommon::new(),
        }
    }

    pub fn is_package(&self) -> bool {
        self.kind == ModuleKind::Package
    }
    pub fn is_internal(&self) -> bool {
        self.flags.contains(ModuleFlags::INTERNAL)
    }

    /// 模块体是否为空 (没有任何语句或声明).
    pub fn is_hollow(&self) -> bool {
        self.common.children.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Module,
    Package,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModuleFlags: u8 {
        /// Compiler-generated support module, never deletable.
        const INTERNAL = 1 << 0;
        const PUBLIC   = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleID(pub u32);

impl ISlabID for ModuleID {
    type RefObject = ModuleObj;

    fn from_handle(handle: u32) -> Self {
        ModuleID(handle)
    }
    fn into_handle(self) -> u32 {
        self.0
    }
}
