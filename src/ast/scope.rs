use crate::{
    SymbolStr,
    ast::{AstAllocs, ModuleID, NodeCommon, NodeID, StmtKind},
    base::{INullableValue, ISlabID},
};

/// Elaborated instance of a module in the instance hierarchy. Scopes are laid
/// out flat under their module; nesting is expressed through the `above`
/// cross-reference, not through tree edges.
#[derive(Debug, Clone)]
pub struct ScopeObj {
    pub name: SymbolStr,
    /// 上一层 scope; 顶层 scope 为空.
    pub above: ScopeID,
    pub is_top: bool,
    pub common: NodeCommon,
}

impl ScopeObj {
    pub fn new(name: impl Into<SymbolStr>) -> Self {
        Self {
            name: name.into(),
            above: ScopeID::new_null(),
            is_top: false,
            common: NodeCommon::new(),
        }
    }

    /// Scope 里既没有变量实例, 也没有函数块和 final-clock 条目.
    /// 只有这样的 scope 才可能成为删除候选.
    pub fn is_hollow(&self, allocs: &AstAllocs) -> bool {
        self.common.children.iter().all(|kid| match kid {
            NodeID::VarScope(_) => false,
            NodeID::Stmt(st) => !matches!(
                st.deref(&allocs.stmts).kind,
                StmtKind::CFunc(_) | StmtKind::FinalClk
            ),
            _ => true,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeID(pub u32);

impl ISlabID for ScopeID {
    type RefObject = ScopeObj;

    fn from_handle(handle: u32) -> Self {
        ScopeID(handle)
    }
    fn into_handle(self) -> u32 {
        self.0
    }
}

/// 一个模块里对另一个模块的实例化.
#[derive(Debug, Clone)]
pub struct CellObj {
    pub name: SymbolStr,
    /// The instantiated module.
    pub modp: ModuleID,
    pub common: NodeCommon,
}

impl CellObj {
    pub fn new(name: impl Into<SymbolStr>, modp: ModuleID) -> Self {
        Self { name: name.into(), modp, common: NodeCommon::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellID(pub u32);

impl ISlabID for CellID {
    type RefObject = CellObj;

    fn from_handle(handle: u32) -> Self {
        CellID(handle)
    }
    fn into_handle(self) -> u32 {
        self.0
    }
}
