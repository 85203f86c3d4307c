use bitflags::bitflags;

use crate::{
    SymbolStr,
    ast::{NodeCommon, ScopeID},
    base::ISlabID,
};

/// Variable declaration inside a module.
#[derive(Debug, Clone)]
pub struct VarObj {
    pub name: SymbolStr,
    pub flags: VarFlags,
    pub common: NodeCommon,
}

impl VarObj {
    pub fn new(name: impl Into<SymbolStr>, flags: VarFlags) -> Self {
        Self { name: name.into(), flags, common: NodeCommon::new() }
    }

    pub fn is_io(&self) -> bool {
        self.flags.contains(VarFlags::IO)
    }
    pub fn is_sig_public(&self) -> bool {
        self.flags.contains(VarFlags::SIG_PUBLIC)
    }
    pub fn is_traced(&self) -> bool {
        self.flags.contains(VarFlags::TRACED)
    }
    pub fn is_temp(&self) -> bool {
        self.flags.contains(VarFlags::TEMP)
    }
    pub fn is_param(&self) -> bool {
        self.flags.contains(VarFlags::PARAM)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VarFlags: u8 {
        /// Port of a module (input/output/inout).
        const IO         = 1 << 0;
        /// 对外部可见的信号, 任何模式下都不能删.
        const SIG_PUBLIC = 1 << 1;
        /// 被选入波形输出的信号.
        const TRACED     = 1 << 2;
        /// 编译器引入的临时变量.
        const TEMP       = 1 << 3;
        const PARAM      = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarID(pub u32);

impl ISlabID for VarID {
    type RefObject = VarObj;

    fn from_handle(handle: u32) -> Self {
        VarID(handle)
    }
    fn into_handle(self) -> u32 {
        self.0
    }
}

/// 变量在某个具体 scope 下的实例. scoping 之后每个变量引用都会
/// 解析到一个 VarScope.
#[derive(Debug, Clone)]
pub struct VarScopeObj {
    /// The backing variable declaration.
    pub varp: VarID,
    /// The owning scope.
    pub scope: ScopeID,
    pub common: NodeCommon,
}

impl VarScopeObj {
    pub fn new(varp: VarID, scope: ScopeID) -> Self {
        Self { varp, scope, common: NodeCommon::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarScopeID(pub u32);

impl ISlabID for VarScopeID {
    type RefObject = VarScopeObj;

    fn from_handle(handle: u32) -> Self {
        VarScopeID(handle)
    }
    fn into_handle(self) -> u32 {
        self.0
    }
}
