//! 网表 AST: 经过 elaborate 与 scoping 之后的类型化语法树.
//!
//! 树形结构以 [`Netlist`] 为根, 节点按种类分别存放在 [`AstAllocs`] 的
//! slab 分配器里, 节点间的树边与交叉引用都用带类型的句柄表示.

use crate::base::{INullableValue, ISlabID};

mod allocs;
mod netlist;
mod node;

pub mod builder;
pub mod dtype;
pub mod module;
pub mod scope;
pub mod scratch;
pub mod stmt;
pub mod var;
pub mod writer;

pub use self::{
    allocs::AstAllocs,
    builder::NetlistBuilder,
    dtype::{
        BasicDType, BasicTypeKind, ClassDType, DTypeID, DTypeKind, DTypeObj, EnumDType,
        MemberDType, RefDType, TypeTable,
    },
    module::{ModuleFlags, ModuleID, ModuleKind, ModuleObj},
    netlist::{Netlist, TreeError, TreeRes},
    node::NodeCommon,
    scope::{CellID, CellObj, ScopeID, ScopeObj},
    scratch::ScratchCounters,
    stmt::{
        Assign, CFunc, EnumItemUse, Exec, FTaskCall, Modport, StmtID, StmtKind, StmtObj, Typedef,
        VarUse,
    },
    var::{VarFlags, VarID, VarObj, VarScopeID, VarScopeObj},
};

/// 全种类节点句柄. 树边 (parent/children) 一律使用这个和类型无关的形式,
/// 跨引用则使用各自的带类型句柄.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeID {
    None,
    Module(ModuleID),
    Scope(ScopeID),
    Cell(CellID),
    Var(VarID),
    VarScope(VarScopeID),
    DType(DTypeID),
    Stmt(StmtID),
}

impl NodeID {
    pub fn is_none(self) -> bool {
        matches!(self, NodeID::None)
    }

    pub fn try_common(self, allocs: &AstAllocs) -> Option<&NodeCommon> {
        match self {
            NodeID::None => None,
            NodeID::Module(m) => m.try_deref(&allocs.modules).map(|o| &o.common),
            NodeID::Scope(s) => s.try_deref(&allocs.scopes).map(|o| &o.common),
            NodeID::Cell(c) => c.try_deref(&allocs.cells).map(|o| &o.common),
            NodeID::Var(v) => v.try_deref(&allocs.vars).map(|o| &o.common),
            NodeID::VarScope(vs) => vs.try_deref(&allocs.varscopes).map(|o| &o.common),
            NodeID::DType(dt) => dt.try_deref(&allocs.dtypes).map(|o| &o.common),
            NodeID::Stmt(st) => st.try_deref(&allocs.stmts).map(|o| &o.common),
        }
    }
    pub fn common(self, allocs: &AstAllocs) -> &NodeCommon {
        self.try_common(allocs)
            .expect("NodeID::common: dangling node reference")
    }

    pub fn try_common_mut(self, allocs: &mut AstAllocs) -> Option<&mut NodeCommon> {
        match self {
            NodeID::None => None,
            NodeID::Module(m) => m.try_deref_mut(&mut allocs.modules).map(|o| &mut o.common),
            NodeID::Scope(s) => s.try_deref_mut(&mut allocs.scopes).map(|o| &mut o.common),
            NodeID::Cell(c) => c.try_deref_mut(&mut allocs.cells).map(|o| &mut o.common),
            NodeID::Var(v) => v.try_deref_mut(&mut allocs.vars).map(|o| &mut o.common),
            NodeID::VarScope(vs) => {
                vs.try_deref_mut(&mut allocs.varscopes).map(|o| &mut o.common)
            }
            NodeID::DType(dt) => dt.try_deref_mut(&mut allocs.dtypes).map(|o| &mut o.common),
            NodeID::Stmt(st) => st.try_deref_mut(&mut allocs.stmts).map(|o| &mut o.common),
        }
    }
    pub fn common_mut(self, allocs: &mut AstAllocs) -> &mut NodeCommon {
        self.try_common_mut(allocs)
            .expect("NodeID::common_mut: dangling node reference")
    }

    /// 节点是否还在分配器中存活.
    pub fn is_alive(self, allocs: &AstAllocs) -> bool {
        self.try_common(allocs).is_some()
    }

    /// 节点的 dtype 回指 (可能为空, DType 节点可能指向自身).
    pub fn dtype_of(self, allocs: &AstAllocs) -> DTypeID {
        self.try_common(allocs)
            .map(|c| c.dtype.get())
            .unwrap_or_else(DTypeID::new_null)
    }
}
