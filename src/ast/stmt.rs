use std::cell::Cell;

use crate::{
    SymbolStr,
    ast::{ModuleID, NodeCommon, ScopeID, VarID, VarScopeID},
    base::ISlabID,
};

/// 语句层节点: 过程语句、表达式、以及若干 scoping 之后残留的声明类节点
/// 共用一个 slab, 用 [`StmtKind`] 区分.
#[derive(Debug, Clone)]
pub struct StmtObj {
    pub kind: StmtKind,
    pub common: NodeCommon,
}

impl StmtObj {
    pub fn new(kind: StmtKind) -> Self {
        Self { kind, common: NodeCommon::new() }
    }

    pub fn as_var_use(&self) -> Option<&VarUse> {
        match &self.kind {
            StmtKind::VarUse(vu) => Some(vu),
            _ => None,
        }
    }
    pub fn as_assign(&self) -> Option<&Assign> {
        match &self.kind {
            StmtKind::Assign(asn) => Some(asn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    VarUse(VarUse),
    FTaskCall(FTaskCall),
    EnumItemUse(EnumItemUse),
    Assign(Assign),
    Typedef(Typedef),
    Modport(Modport),
    CFunc(CFunc),
    /// Scope final-clock list entry.
    FinalClk,
    Exec(Exec),
}

/// 对变量的引用. scoping 之后 `vscp` 指向具体的变量实例;
/// `package` 是残留的包回指, cell 消除模式下被遍历清空.
#[derive(Debug, Clone)]
pub struct VarUse {
    pub varp: VarID,
    pub vscp: VarScopeID,
    pub package: Cell<ModuleID>,
}

/// 函数/任务调用点, 指向定义它的 [`CFunc`] 节点.
#[derive(Debug, Clone)]
pub struct FTaskCall {
    pub funcp: StmtID,
    pub package: Cell<ModuleID>,
}

#[derive(Debug, Clone)]
pub struct EnumItemUse {
    pub package: Cell<ModuleID>,
}

/// 简单赋值. `lhs`/`rhs` 同时也是树上的孩子.
#[derive(Debug, Clone)]
pub struct Assign {
    pub lhs: StmtID,
    pub rhs: StmtID,
}

#[derive(Debug, Clone)]
pub struct Typedef {
    pub name: SymbolStr,
    /// Marked public by a source attribute; survives cell elimination.
    pub attr_public: bool,
}

/// 接口成员的方向视图, 它的变量引用挂在孩子里.
#[derive(Debug, Clone)]
pub struct Modport {
    pub name: SymbolStr,
}

/// 函数/任务定义体.
#[derive(Debug, Clone)]
pub struct CFunc {
    pub name: SymbolStr,
    pub scope: ScopeID,
}

/// 剩余的表达式/语句类节点. `outputter` 标记求值有可观察效果的节点
/// (显示任务、文件写入等).
#[derive(Debug, Clone)]
pub struct Exec {
    pub op: SymbolStr,
    pub outputter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtID(pub u32);

impl ISlabID for StmtID {
    type RefObject = StmtObj;

    fn from_handle(handle: u32) -> Self {
        StmtID(handle)
    }
    fn into_handle(self) -> u32 {
        self.0
    }
}
