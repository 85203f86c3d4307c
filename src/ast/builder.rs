//! Netlist construction helper.
//!
//! 测试与上游 pass 用它搭建网表: 它负责维持 parent/children 树边、
//! dtype 回指和模块列表的一致性, 手搓 slab 的代码不应该出现在别处.

use std::cell::Cell;

use crate::{
    SymbolStr,
    ast::{
        Assign, BasicTypeKind, CFunc, CellID, CellObj, ClassDType, DTypeID, DTypeKind, DTypeObj,
        EnumDType, EnumItemUse, Exec, FTaskCall, MemberDType, Modport, ModuleFlags, ModuleID,
        ModuleKind, ModuleObj, Netlist, NodeID, RefDType, ScopeID, ScopeObj, StmtID, StmtKind,
        StmtObj, Typedef, VarFlags, VarID, VarObj, VarScopeID, VarScopeObj, VarUse,
    },
    base::{INullableValue, ISlabID},
};

pub struct NetlistBuilder {
    netlist: Netlist,
}

impl NetlistBuilder {
    pub fn new(name: impl Into<SymbolStr>) -> Self {
        Self { netlist: Netlist::new(name) }
    }

    pub fn finish(self) -> Netlist {
        self.netlist
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    // ===== dtypes =====

    pub fn basic_dtype(&mut self, keyword: BasicTypeKind, width: u32) -> DTypeID {
        self.netlist.types.find_basic(&mut self.netlist.allocs, keyword, width)
    }
    pub fn basic_logic(&mut self, width: u32) -> DTypeID {
        self.basic_dtype(BasicTypeKind::Logic, width)
    }

    /// 非驻留的根级 DType, 自身 dtype 自环, 挂在类型表的所有权列表上.
    fn root_dtype(&mut self, kind: DTypeKind) -> DTypeID {
        let obj = DTypeObj::new(kind);
        let id = DTypeID::from_handle(self.netlist.allocs.dtypes.insert(obj) as u32);
        id.deref(&self.netlist.allocs.dtypes).common.dtype.set(id);
        self.netlist.types.adopt(id);
        id
    }

    pub fn class_dtype(&mut self, name: impl Into<SymbolStr>, packed: bool) -> DTypeID {
        self.root_dtype(DTypeKind::Class(ClassDType { name: name.into(), packed }))
    }

    pub fn enum_dtype(&mut self, name: impl Into<SymbolStr>) -> DTypeID {
        self.root_dtype(DTypeKind::Enum(EnumDType { name: name.into() }))
    }

    pub fn ref_dtype(
        &mut self,
        name: impl Into<SymbolStr>,
        target: DTypeID,
        package: ModuleID,
    ) -> DTypeID {
        self.root_dtype(DTypeKind::Ref(RefDType {
            name: name.into(),
            ref_dtype: Cell::new(target),
            package: Cell::new(package),
        }))
    }

    /// Struct member; the tree child of its class, its `dtype` pointing at
    /// the member's storage type instead of itself.
    pub fn member_dtype(
        &mut self,
        class: DTypeID,
        name: impl Into<SymbolStr>,
        storage: DTypeID,
    ) -> DTypeID {
        let obj = DTypeObj::new(DTypeKind::Member(MemberDType { name: name.into() }));
        let id = DTypeID::from_handle(self.netlist.allocs.dtypes.insert(obj) as u32);
        id.deref(&self.netlist.allocs.dtypes).common.dtype.set(storage);
        self.adopt_child(NodeID::DType(class), NodeID::DType(id));
        id
    }

    // ===== modules =====

    pub fn add_module(&mut self, name: impl Into<SymbolStr>, level: u32) -> ModuleID {
        self.add_module_kind(name, ModuleKind::Module, level)
    }
    pub fn add_package(&mut self, name: impl Into<SymbolStr>, level: u32) -> ModuleID {
        self.add_module_kind(name, ModuleKind::Package, level)
    }
    fn add_module_kind(
        &mut self,
        name: impl Into<SymbolStr>,
        kind: ModuleKind,
        level: u32,
    ) -> ModuleID {
        let obj = ModuleObj::new(name, kind, level);
        let id = ModuleID::from_handle(self.netlist.allocs.modules.insert(obj) as u32);
        self.netlist.modules.push(id);
        id
    }

    pub fn set_module_flags(&mut self, module: ModuleID, flags: ModuleFlags) {
        module.deref_mut(&mut self.netlist.allocs.modules).flags |= flags;
    }

    // ===== declarations =====

    pub fn add_var(
        &mut self,
        module: ModuleID,
        name: impl Into<SymbolStr>,
        dtype: DTypeID,
        flags: VarFlags,
    ) -> VarID {
        let obj = VarObj::new(name, flags);
        let id = VarID::from_handle(self.netlist.allocs.vars.insert(obj) as u32);
        id.deref(&self.netlist.allocs.vars).common.dtype.set(dtype);
        self.adopt_child(NodeID::Module(module), NodeID::Var(id));
        id
    }

    pub fn add_scope(
        &mut self,
        module: ModuleID,
        name: impl Into<SymbolStr>,
        above: ScopeID,
        is_top: bool,
    ) -> ScopeID {
        let mut obj = ScopeObj::new(name);
        obj.above = above;
        obj.is_top = is_top;
        let id = ScopeID::from_handle(self.netlist.allocs.scopes.insert(obj) as u32);
        self.adopt_child(NodeID::Module(module), NodeID::Scope(id));
        id
    }

    pub fn add_var_scope(&mut self, scope: ScopeID, varp: VarID) -> VarScopeID {
        let obj = VarScopeObj::new(varp, scope);
        let id = VarScopeID::from_handle(self.netlist.allocs.varscopes.insert(obj) as u32);
        let dtype = NodeID::Var(varp).dtype_of(&self.netlist.allocs);
        id.deref(&self.netlist.allocs.varscopes).common.dtype.set(dtype);
        self.adopt_child(NodeID::Scope(scope), NodeID::VarScope(id));
        id
    }

    pub fn add_cell(
        &mut self,
        module: ModuleID,
        name: impl Into<SymbolStr>,
        target: ModuleID,
    ) -> CellID {
        let obj = CellObj::new(name, target);
        let id = CellID::from_handle(self.netlist.allocs.cells.insert(obj) as u32);
        self.adopt_child(NodeID::Module(module), NodeID::Cell(id));
        id
    }

    // ===== statements =====

    fn add_stmt(&mut self, parent: NodeID, kind: StmtKind, dtype: DTypeID) -> StmtID {
        let obj = StmtObj::new(kind);
        let id = StmtID::from_handle(self.netlist.allocs.stmts.insert(obj) as u32);
        id.deref(&self.netlist.allocs.stmts).common.dtype.set(dtype);
        if !parent.is_none() {
            self.adopt_child(parent, NodeID::Stmt(id));
        }
        id
    }

    /// 变量引用. `parent` 传 `NodeID::None` 时先不挂树, 等着被
    /// [`add_assign`] 收养.
    ///
    /// [`add_assign`]: NetlistBuilder::add_assign
    pub fn add_var_use(
        &mut self,
        parent: NodeID,
        varp: VarID,
        vscp: VarScopeID,
    ) -> StmtID {
        let dtype = NodeID::Var(varp).dtype_of(&self.netlist.allocs);
        self.add_stmt(
            parent,
            StmtKind::VarUse(VarUse {
                varp,
                vscp,
                package: Cell::new(ModuleID::new_null()),
            }),
            dtype,
        )
    }

    pub fn set_stmt_package(&mut self, stmt: StmtID, package: ModuleID) {
        match &stmt.deref(&self.netlist.allocs.stmts).kind {
            StmtKind::VarUse(vu) => vu.package.set(package),
            StmtKind::FTaskCall(c) => c.package.set(package),
            StmtKind::EnumItemUse(e) => e.package.set(package),
            other => panic!("set_stmt_package: {other:?} carries no package link"),
        }
    }

    /// 简单赋值. `lhs`/`rhs` 必须是尚未挂树的语句节点, 赋值节点收养它们.
    pub fn add_assign(&mut self, parent: NodeID, lhs: StmtID, rhs: StmtID) -> StmtID {
        let dtype = NodeID::Stmt(lhs).dtype_of(&self.netlist.allocs);
        let id = self.add_stmt(parent, StmtKind::Assign(Assign { lhs, rhs }), dtype);
        self.adopt_child(NodeID::Stmt(id), NodeID::Stmt(lhs));
        self.adopt_child(NodeID::Stmt(id), NodeID::Stmt(rhs));
        id
    }

    pub fn add_exec(
        &mut self,
        parent: NodeID,
        op: impl Into<SymbolStr>,
        outputter: bool,
    ) -> StmtID {
        self.add_stmt(
            parent,
            StmtKind::Exec(Exec { op: op.into(), outputter }),
            DTypeID::new_null(),
        )
    }

    pub fn set_stmt_dtype(&mut self, stmt: StmtID, dtype: DTypeID) {
        stmt.deref(&self.netlist.allocs.stmts).common.dtype.set(dtype);
    }

    /// 独立跟踪的 child dtype 回指 (比如声明自带的未驻留类型).
    pub fn set_child_dtype(&mut self, node: NodeID, dtype: DTypeID) {
        node.common(&self.netlist.allocs).child_dtype.set(dtype);
    }

    pub fn add_typedef(
        &mut self,
        parent: NodeID,
        name: impl Into<SymbolStr>,
        dtype: DTypeID,
        attr_public: bool,
    ) -> StmtID {
        self.add_stmt(
            parent,
            StmtKind::Typedef(Typedef { name: name.into(), attr_public }),
            dtype,
        )
    }

    pub fn add_modport(&mut self, parent: NodeID, name: impl Into<SymbolStr>) -> StmtID {
        self.add_stmt(
            parent,
            StmtKind::Modport(Modport { name: name.into() }),
            DTypeID::new_null(),
        )
    }

    pub fn add_cfunc(
        &mut self,
        parent: NodeID,
        name: impl Into<SymbolStr>,
        scope: ScopeID,
    ) -> StmtID {
        self.add_stmt(
            parent,
            StmtKind::CFunc(CFunc { name: name.into(), scope }),
            DTypeID::new_null(),
        )
    }

    pub fn add_ftask_call(&mut self, parent: NodeID, funcp: StmtID) -> StmtID {
        self.add_stmt(
            parent,
            StmtKind::FTaskCall(FTaskCall {
                funcp,
                package: Cell::new(ModuleID::new_null()),
            }),
            DTypeID::new_null(),
        )
    }

    pub fn add_enum_item_use(&mut self, parent: NodeID, dtype: DTypeID) -> StmtID {
        self.add_stmt(
            parent,
            StmtKind::EnumItemUse(EnumItemUse { package: Cell::new(ModuleID::new_null()) }),
            dtype,
        )
    }

    pub fn add_final_clk(&mut self, parent: NodeID) -> StmtID {
        self.add_stmt(parent, StmtKind::FinalClk, DTypeID::new_null())
    }

    // ===== plumbing =====

    fn adopt_child(&mut self, parent: NodeID, child: NodeID) {
        child.common_mut(&mut self.netlist.allocs).parent = parent;
        parent.common_mut(&mut self.netlist.allocs).children.push(child);
    }
}
