//! Dead code elimination.
//!
//! 消除网表中不再被引用的模块、变量、变量实例、数据类型、scope 和 cell.
//! 算法是引用计数式的: 一趟标记遍历给每个被引用的节点记账 (user1 计数槽),
//! 随后各类清扫器按固定顺序迭代到不动点, 把计数为零的候选节点连同子树
//! 一起摘除. 删除一个节点会冲掉它对外引用的账, 所以清扫器内部需要重试.
//!
//! scoping 之后包回指 (packagep) 不再有语义, 但它们的存在会让空包
//! 删不掉; cell 消除模式下遍历会顺手把这些回指清空, 好让空包在模块
//! 清扫时一起消失.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::{
    ast::{
        AstAllocs, CellID, DTypeID, ModuleID, Netlist, NodeID, ScopeID, ScratchCounters, StmtID,
        StmtKind, VarID, VarObj, VarScopeID,
        writer::write_tree_to_file_quiet,
    },
    base::{INullableValue, ISlabID},
};

/// Remove any module the instance hierarchy never reaches. Variables and
/// varscopes proven dead are always reaped as well.
pub fn dead_modules(netlist: &mut Netlist) {
    deadify(netlist, DeadFlags::none(), "deadModules.tree");
}

/// Additionally reap unreferenced data types. Runs after widthing, when
/// dtypes stop being created.
pub fn dead_dtypes(netlist: &mut Netlist) {
    deadify(netlist, DeadFlags { dtypes: true, ..DeadFlags::none() }, "deadDtypes.tree");
}

/// Like [`dead_dtypes`], plus empty scopes. Only legal once the hierarchy
/// has been flattened, otherwise scope usage cannot be decided locally.
pub fn dead_dtypes_scoped(netlist: &mut Netlist) {
    deadify(
        netlist,
        DeadFlags { dtypes: true, scopes: true, ..DeadFlags::none() },
        "deadDtypesScoped.tree",
    );
}

/// Post-trace full elimination: user variables, dtypes and cells.
pub fn dead_all(netlist: &mut Netlist) {
    deadify(
        netlist,
        DeadFlags { user_vars: true, dtypes: true, cells: true, ..DeadFlags::none() },
        "deadAll.tree",
    );
}

/// [`dead_all`] plus empty-scope elimination for flattened netlists.
pub fn dead_all_scoped(netlist: &mut Netlist) {
    deadify(
        netlist,
        DeadFlags { user_vars: true, dtypes: true, scopes: true, cells: true },
        "deadAllScoped.tree",
    );
}

#[derive(Debug, Clone, Copy)]
struct DeadFlags {
    user_vars: bool,
    dtypes: bool,
    scopes: bool,
    cells: bool,
}

impl DeadFlags {
    fn none() -> Self {
        Self { user_vars: false, dtypes: false, scopes: false, cells: false }
    }
}

fn deadify(netlist: &mut Netlist, flags: DeadFlags, dump: &str) {
    log::debug!("dead pass on \"{}\": {flags:?}", netlist.name);
    // 中途会删 DType, 类型表缓存先失效
    netlist.types.clear_cache();
    {
        let mut pass = DeadPass::new(netlist, flags);
        pass.mark_netlist(netlist);
        pass.flush_deferred(netlist);

        pass.dead_check_var(netlist);
        // 只有打平之后的结构才能消除 scope, 否则没有廉价的办法知道
        // 一个 scope 是否还被用到
        if pass.flags.scopes {
            pass.dead_check_scope(netlist);
        }
        if pass.flags.cells {
            pass.dead_check_cells(netlist);
        }
        // 模块清扫放在变量之后: 可能有要删的变量住在要删的模块里
        pass.dead_check_mod(netlist);
        // pass 析构归还 user1 计数槽
    }
    netlist.types.repair_cache(&netlist.allocs);

    if log::log_enabled!(log::Level::Debug) {
        write_tree_to_file_quiet(netlist, dump);
    }
}

type AssignMap = HashMap<VarScopeID, SmallVec<[StmtID; 2]>>;

/// One invocation of the pass: the marking traversal state plus the
/// per-kind candidate worklists the sweepers consume.
struct DeadPass {
    flags: DeadFlags,
    counters: ScratchCounters,
    /// Module currently being traversed.
    cur_module: ModuleID,
    /// Side effects discovered in the assign RHS being traversed.
    side_effect: bool,
    vars: Vec<VarID>,
    vscps: Vec<VarScopeID>,
    dtypes: Vec<DTypeID>,
    scopes: Vec<ScopeID>,
    cells: Vec<CellID>,
    /// 每个变量实例的简单赋值, 实例死了赋值跟着一起删.
    assign_map: AssignMap,
    /// In-traversal deletions (modports, typedefs) wait here until the
    /// iterator has unwound from them.
    deferred: Vec<StmtID>,
}

impl DeadPass {
    fn new(netlist: &Netlist, flags: DeadFlags) -> Self {
        Self {
            flags,
            counters: ScratchCounters::rent(netlist),
            cur_module: ModuleID::new_null(),
            side_effect: false,
            vars: Vec::new(),
            vscps: Vec::new(),
            dtypes: Vec::new(),
            scopes: Vec::new(),
            cells: Vec::new(),
            assign_map: AssignMap::new(),
            deferred: Vec::new(),
        }
    }

    // ===== marking traversal =====

    fn mark_netlist(&mut self, netlist: &Netlist) {
        let allocs = &netlist.allocs;
        for &m in &netlist.modules {
            self.mark_module(allocs, m);
        }
        for &dt in &netlist.types.owned {
            self.mark_dtype(allocs, dt);
        }
    }

    fn mark_node(&mut self, allocs: &AstAllocs, node: NodeID) {
        match node {
            NodeID::None => {}
            NodeID::Module(m) => self.mark_module(allocs, m),
            NodeID::Scope(s) => self.mark_scope(allocs, s),
            NodeID::Cell(c) => self.mark_cell(allocs, c),
            NodeID::Var(v) => self.mark_var(allocs, v),
            NodeID::VarScope(vs) => self.mark_varscope(allocs, vs),
            NodeID::DType(dt) => self.mark_dtype(allocs, dt),
            NodeID::Stmt(st) => self.mark_stmt(allocs, st),
        }
    }

    fn mark_children(&mut self, allocs: &AstAllocs, node: NodeID) {
        for &kid in &node.common(allocs).children {
            self.mark_node(allocs, kid);
        }
    }

    /// 给节点的 dtype 回指记账. DType 自环不算引用.
    fn check_all(&mut self, allocs: &AstAllocs, node: NodeID) {
        let common = node.common(allocs);
        let dt = common.dtype.get();
        if dt.is_nonnull() && NodeID::DType(dt) != node {
            self.counters.credit(NodeID::DType(dt));
        }
        let cdt = common.child_dtype.get();
        if cdt.is_nonnull() {
            self.counters.credit(NodeID::DType(cdt));
        }
    }

    fn check_dtype(&mut self, allocs: &AstAllocs, dt: DTypeID) {
        let obj = dt.deref(&allocs.dtypes);
        // generic 基础类型永不删; 成员的生命期由所属的 class 决定
        if self.flags.dtypes && !obj.generic && !obj.is_member() {
            self.dtypes.push(dt);
        }
        let refd = obj.virt_ref_dtype();
        if refd.is_nonnull() {
            self.counters.credit(NodeID::DType(refd));
        }
    }

    /// 包回指: cell 消除模式下直接清掉, 否则给包记账.
    fn mark_package(&mut self, cell: &std::cell::Cell<ModuleID>) {
        let pkg = cell.get();
        if pkg.is_nonnull() {
            if self.flags.cells {
                cell.set(ModuleID::new_null());
            } else {
                self.counters.credit(NodeID::Module(pkg));
            }
        }
    }

    fn cur_module_is_package(&self, allocs: &AstAllocs) -> bool {
        self.cur_module.is_nonnull()
            && self.cur_module.deref(&allocs.modules).is_package()
    }

    fn mark_module(&mut self, allocs: &AstAllocs, m: ModuleID) {
        self.cur_module = m;
        self.mark_children(allocs, NodeID::Module(m));
        self.check_all(allocs, NodeID::Module(m));
        self.cur_module = ModuleID::new_null();
    }

    fn mark_scope(&mut self, allocs: &AstAllocs, s: ScopeID) {
        self.mark_children(allocs, NodeID::Scope(s));
        self.check_all(allocs, NodeID::Scope(s));
        let obj = s.deref(&allocs.scopes);
        if obj.above.is_nonnull() {
            self.counters.credit(NodeID::Scope(obj.above));
        }
        if !obj.is_top && obj.is_hollow(allocs) {
            self.scopes.push(s);
        }
    }

    fn mark_cell(&mut self, allocs: &AstAllocs, c: CellID) {
        self.mark_children(allocs, NodeID::Cell(c));
        self.check_all(allocs, NodeID::Cell(c));
        self.cells.push(c);
        self.counters.credit(NodeID::Module(c.deref(&allocs.cells).modp));
    }

    fn mark_var(&mut self, allocs: &AstAllocs, v: VarID) {
        self.mark_children(allocs, NodeID::Var(v));
        self.check_all(allocs, NodeID::Var(v));
        let obj = v.deref(&allocs.vars);
        // 只有公有变量的包不能消失
        if obj.is_sig_public() && self.cur_module_is_package(allocs) {
            self.counters.credit(NodeID::Module(self.cur_module));
        }
        if self.might_elim_var(obj) {
            self.vars.push(v);
        }
    }

    fn mark_varscope(&mut self, allocs: &AstAllocs, vs: VarScopeID) {
        self.mark_children(allocs, NodeID::VarScope(vs));
        self.check_all(allocs, NodeID::VarScope(vs));
        let obj = vs.deref(&allocs.varscopes);
        if obj.scope.is_nonnull() {
            self.counters.credit(NodeID::Scope(obj.scope));
        }
        if self.might_elim_var(obj.varp.deref(&allocs.vars)) {
            self.vscps.push(vs);
        }
    }

    fn mark_dtype(&mut self, allocs: &AstAllocs, dt: DTypeID) {
        self.mark_children(allocs, NodeID::DType(dt));
        self.check_dtype(allocs, dt);
        self.check_all(allocs, NodeID::DType(dt));
        if let crate::ast::DTypeKind::Ref(r) = &dt.deref(&allocs.dtypes).kind {
            self.mark_package(&r.package);
        }
    }

    fn mark_stmt(&mut self, allocs: &AstAllocs, st: StmtID) {
        match &st.deref(&allocs.stmts).kind {
            StmtKind::VarUse(_) => self.mark_var_use(allocs, st),
            StmtKind::FTaskCall(_) | StmtKind::EnumItemUse(_) => {
                self.mark_package_bearer(allocs, st)
            }
            StmtKind::Assign(_) => self.mark_assign(allocs, st),
            StmtKind::Typedef(_) => self.mark_typedef(allocs, st),
            StmtKind::Modport(_) => self.mark_modport(allocs, st),
            StmtKind::CFunc(_) => self.mark_cfunc(allocs, st),
            StmtKind::FinalClk | StmtKind::Exec(_) => self.mark_exec(allocs, st),
        }
    }

    fn mark_var_use(&mut self, allocs: &AstAllocs, st: StmtID) {
        self.mark_children(allocs, NodeID::Stmt(st));
        self.check_all(allocs, NodeID::Stmt(st));
        let Some(vu) = st.deref(&allocs.stmts).as_var_use() else { unreachable!() };
        if vu.vscp.is_nonnull() {
            self.counters.credit(NodeID::VarScope(vu.vscp));
            let backing = vu.vscp.deref(&allocs.varscopes).varp;
            self.counters.credit(NodeID::Var(backing));
        }
        if vu.varp.is_nonnull() {
            self.counters.credit(NodeID::Var(vu.varp));
        }
        self.mark_package(&vu.package);
    }

    fn mark_package_bearer(&mut self, allocs: &AstAllocs, st: StmtID) {
        self.mark_children(allocs, NodeID::Stmt(st));
        self.check_all(allocs, NodeID::Stmt(st));
        match &st.deref(&allocs.stmts).kind {
            StmtKind::FTaskCall(c) => self.mark_package(&c.package),
            StmtKind::EnumItemUse(e) => self.mark_package(&e.package),
            _ => unreachable!(),
        }
    }

    /// 简单赋值有机会跟着死掉的目标一起被删: 右边无副作用、左边是
    /// 带 varscope 的直接变量引用时, 不按普通路径访问左边 (不给目标
    /// 记账), 只登记到赋值索引并跟踪左边的 dtype.
    fn mark_assign(&mut self, allocs: &AstAllocs, st: StmtID) {
        self.side_effect = false;
        let Some(asn) = st.deref(&allocs.stmts).as_assign() else { unreachable!() };
        let (lhs, rhs) = (asn.lhs, asn.rhs);
        self.mark_node(allocs, NodeID::Stmt(rhs));
        self.check_all(allocs, NodeID::Stmt(st));

        let simple_target = match lhs.deref(&allocs.stmts).as_var_use() {
            // 只处理 scoping 之后的简单写
            Some(vu) if !self.side_effect && vu.vscp.is_nonnull() => Some(vu.vscp),
            _ => None,
        };
        match simple_target {
            Some(vscp) => {
                self.assign_map.entry(vscp).or_default().push(st);
                // 目标不记账, 但它的 dtype 仍要跟踪
                self.check_all(allocs, NodeID::Stmt(lhs));
            }
            None => self.mark_node(allocs, NodeID::Stmt(lhs)),
        }
    }

    fn mark_typedef(&mut self, allocs: &AstAllocs, st: StmtID) {
        self.mark_children(allocs, NodeID::Stmt(st));
        let StmtKind::Typedef(td) = &st.deref(&allocs.stmts).kind else { unreachable!() };
        let attr_public = td.attr_public;
        if self.flags.cells && !attr_public {
            self.deferred.push(st);
            return;
        }
        self.check_all(allocs, NodeID::Stmt(st));
        // 只装着公有 typedef 的包不能消失; 普通模块可以, 比如参数化
        // 展开后原模板被整个丢弃的情形
        if attr_public && self.cur_module_is_package(allocs) {
            self.counters.credit(NodeID::Module(self.cur_module));
        }
    }

    fn mark_modport(&mut self, allocs: &AstAllocs, st: StmtID) {
        self.mark_children(allocs, NodeID::Stmt(st));
        if self.flags.cells && NodeID::Stmt(st).common(allocs).children.is_empty() {
            self.deferred.push(st);
            return;
        }
        self.check_all(allocs, NodeID::Stmt(st));
    }

    fn mark_cfunc(&mut self, allocs: &AstAllocs, st: StmtID) {
        self.mark_children(allocs, NodeID::Stmt(st));
        self.check_all(allocs, NodeID::Stmt(st));
        let StmtKind::CFunc(f) = &st.deref(&allocs.stmts).kind else { unreachable!() };
        if f.scope.is_nonnull() {
            self.counters.credit(NodeID::Scope(f.scope));
        }
    }

    fn mark_exec(&mut self, allocs: &AstAllocs, st: StmtID) {
        if let StmtKind::Exec(e) = &st.deref(&allocs.stmts).kind {
            if e.outputter {
                self.side_effect = true;
            }
        }
        self.mark_children(allocs, NodeID::Stmt(st));
        self.check_all(allocs, NodeID::Stmt(st));
    }

    fn might_elim_var(&self, var: &VarObj) -> bool {
        !var.is_sig_public() // Can't elim publics!
            && !var.is_io()
            && (var.is_temp()
                || (var.is_param() && !var.is_traced())
                || self.flags.user_vars) // Post-Trace can kill most anything
    }

    // ===== deferred in-traversal deletions =====

    fn flush_deferred(&mut self, netlist: &mut Netlist) {
        for st in std::mem::take(&mut self.deferred) {
            log::debug!("dead: deferred delete {st:?}");
            netlist
                .unplug_subtree(NodeID::Stmt(st))
                .expect("DeadPass: failed to unplug deferred node");
        }
    }

    // ===== sweepers =====

    fn dead_check_var(&mut self, netlist: &mut Netlist) {
        // varscope 先走: 实例死了, 它的简单赋值跟着一起删
        for at in 0..self.vscps.len() {
            let vscp = self.vscps[at];
            if self.counters.count(NodeID::VarScope(vscp)) != 0 {
                continue;
            }
            log::debug!("dead varscope {vscp:?}");
            if let Some(assigns) = self.assign_map.remove(&vscp) {
                for asn in assigns {
                    log::debug!("dead assign {asn:?}");
                    let dt = NodeID::Stmt(asn).dtype_of(&netlist.allocs);
                    if dt.is_nonnull() {
                        self.counters.debit(NodeID::DType(dt));
                    }
                    netlist
                        .unplug_subtree(NodeID::Stmt(asn))
                        .expect("DeadPass: failed to unplug dead assign");
                }
            }
            let (scope, dt) = {
                let obj = vscp.deref(&netlist.allocs.varscopes);
                (obj.scope, obj.common.dtype.get())
            };
            if scope.is_nonnull() {
                self.counters.debit(NodeID::Scope(scope));
            }
            if dt.is_nonnull() {
                self.counters.debit(NodeID::DType(dt));
            }
            netlist
                .unplug_subtree(NodeID::VarScope(vscp))
                .expect("DeadPass: failed to unplug dead varscope");
        }

        // 变量要迭代到不动点: 删掉一个变量会冲掉它 dtype 的账,
        // 但不会让别的变量复活, 所以一遍一遍重扫直到没有新删除
        let mut retry = true;
        while retry {
            retry = false;
            for at in 0..self.vars.len() {
                let v = self.vars[at];
                if v.is_null() {
                    continue;
                }
                if self.counters.count(NodeID::Var(v)) != 0 {
                    continue;
                }
                log::debug!("dead var {v:?}");
                let dt = NodeID::Var(v).dtype_of(&netlist.allocs);
                if dt.is_nonnull() {
                    self.counters.debit(NodeID::DType(dt));
                }
                netlist
                    .unplug_subtree(NodeID::Var(v))
                    .expect("DeadPass: failed to unplug dead var");
                self.vars[at] = VarID::new_null();
                retry = true;
            }
        }

        // dtype 单遍扫描. class 类型可能只有成员被引用而本体没有,
        // 这种情况要留着本体
        for at in 0..self.dtypes.len() {
            let dt = self.dtypes[at];
            if self.counters.count(NodeID::DType(dt)) != 0 {
                continue;
            }
            if dt.deref(&netlist.allocs.dtypes).is_class() {
                let members_alive = NodeID::DType(dt)
                    .common(&netlist.allocs)
                    .children
                    .iter()
                    .any(|&kid| {
                        matches!(kid, NodeID::DType(_)) && self.counters.count(kid) != 0
                    });
                if members_alive {
                    continue;
                }
            }
            log::debug!("dead dtype {dt:?}");
            netlist
                .unplug_subtree(NodeID::DType(dt))
                .expect("DeadPass: failed to unplug dead dtype");
        }
    }

    fn dead_check_scope(&mut self, netlist: &mut Netlist) {
        // 内层 scope 死掉才能冲掉外层 scope 的账, 所以要迭代
        let mut retry = true;
        while retry {
            retry = false;
            for at in 0..self.scopes.len() {
                let s = self.scopes[at];
                if s.is_null() {
                    continue;
                }
                if self.counters.count(NodeID::Scope(s)) != 0 {
                    continue;
                }
                log::debug!("dead scope {s:?}");
                let (above, dt) = {
                    let obj = s.deref(&netlist.allocs.scopes);
                    (obj.above, obj.common.dtype.get())
                };
                if above.is_nonnull() {
                    self.counters.debit(NodeID::Scope(above));
                }
                if dt.is_nonnull() {
                    self.counters.debit(NodeID::DType(dt));
                }
                netlist
                    .unplug_subtree(NodeID::Scope(s))
                    .expect("DeadPass: failed to unplug dead scope");
                self.scopes[at] = ScopeID::new_null();
                retry = true;
            }
        }
    }

    fn dead_check_cells(&mut self, netlist: &mut Netlist) {
        // 死 cell 不会再让别的 cell 死掉, 一遍就够
        for at in 0..self.cells.len() {
            let c = self.cells[at];
            if self.counters.count(NodeID::Cell(c)) != 0 {
                continue;
            }
            let modp = c.deref(&netlist.allocs.cells).modp;
            if !modp.deref(&netlist.allocs.modules).is_hollow() {
                continue;
            }
            log::debug!("dead cell {c:?}");
            self.counters.debit(NodeID::Module(modp));
            netlist
                .unplug_subtree(NodeID::Cell(c))
                .expect("DeadPass: failed to unplug dead cell");
        }
    }

    fn dead_check_mod(&mut self, netlist: &mut Netlist) {
        let mut retry = true;
        while retry {
            retry = false;
            let mods: Vec<ModuleID> = netlist.modules.clone();
            for m in mods {
                let (level, internal) = {
                    let obj = m.deref(&netlist.allocs.modules);
                    (obj.level, obj.is_internal())
                };
                // level 1 是 wrapper, level 2 是用户顶层
                if level <= 2 || internal {
                    continue;
                }
                if self.counters.count(NodeID::Module(m)) != 0 {
                    continue;
                }
                log::debug!("dead module {:?} \"{}\"", m, m.deref(&netlist.allocs.modules).name);
                // 死模块的孩子现在也可能可删了, 把账修正回去. cell 可能
                // 埋在 generate 块里而不是直接挂在模块下, 要整棵子树扫
                DeadModScan { counters: &mut self.counters }
                    .scan(&netlist.allocs, NodeID::Module(m));
                netlist
                    .unplug_subtree(NodeID::Module(m))
                    .expect("DeadPass: failed to unplug dead module");
                retry = true;
            }
        }
    }
}

/// In a module that is dead, clean up the in-use counts of the modules its
/// interior cells instantiate. Shares the user1 discipline with [`DeadPass`].
struct DeadModScan<'pass> {
    counters: &'pass mut ScratchCounters,
}

impl DeadModScan<'_> {
    fn scan(&mut self, allocs: &AstAllocs, node: NodeID) {
        if let NodeID::Cell(c) = node {
            self.counters.debit(NodeID::Module(c.deref(&allocs.cells).modp));
        }
        for &kid in &node.common(allocs).children {
            self.scan(allocs, kid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        BasicTypeKind, ModuleFlags, NetlistBuilder, VarFlags, writer::netlist_to_string,
    };
    use crate::testing::cases::*;

    fn module_alive(netlist: &Netlist, m: ModuleID) -> bool {
        netlist.modules.contains(&m) && m.is_alive(&netlist.allocs.modules)
    }

    /// I4/P1: 每条幸存节点的类型化出边都必须指向幸存节点.
    fn assert_no_dangling(netlist: &Netlist) {
        let allocs = &netlist.allocs;
        let check_dtype = |dt: DTypeID, what: &str| {
            assert!(dt.is_null() || dt.is_alive(&allocs.dtypes), "dangling dtype from {what}");
        };
        for (_, obj) in allocs.vars.iter() {
            check_dtype(obj.common.dtype.get(), "var");
        }
        for (_, obj) in allocs.varscopes.iter() {
            assert!(obj.varp.is_alive(&allocs.vars), "varscope with dangling var");
            assert!(obj.scope.is_null() || obj.scope.is_alive(&allocs.scopes));
            check_dtype(obj.common.dtype.get(), "varscope");
        }
        for (_, obj) in allocs.cells.iter() {
            assert!(obj.modp.is_alive(&allocs.modules), "cell with dangling module");
        }
        for (_, obj) in allocs.scopes.iter() {
            assert!(obj.above.is_null() || obj.above.is_alive(&allocs.scopes));
        }
        for (_, obj) in allocs.stmts.iter() {
            check_dtype(obj.common.dtype.get(), "stmt");
            match &obj.kind {
                StmtKind::VarUse(vu) => {
                    assert!(vu.varp.is_null() || vu.varp.is_alive(&allocs.vars));
                    assert!(vu.vscp.is_null() || vu.vscp.is_alive(&allocs.varscopes));
                    let pkg = vu.package.get();
                    assert!(pkg.is_null() || pkg.is_alive(&allocs.modules));
                }
                StmtKind::FTaskCall(c) => {
                    let pkg = c.package.get();
                    assert!(pkg.is_null() || pkg.is_alive(&allocs.modules));
                }
                StmtKind::EnumItemUse(e) => {
                    let pkg = e.package.get();
                    assert!(pkg.is_null() || pkg.is_alive(&allocs.modules));
                }
                StmtKind::Assign(asn) => {
                    assert!(asn.lhs.is_alive(&allocs.stmts));
                    assert!(asn.rhs.is_alive(&allocs.stmts));
                }
                StmtKind::CFunc(f) => {
                    assert!(f.scope.is_null() || f.scope.is_alive(&allocs.scopes));
                }
                _ => {}
            }
        }
        for (_, obj) in allocs.dtypes.iter() {
            check_dtype(obj.virt_ref_dtype(), "ref dtype");
        }
    }

    #[test]
    fn unused_temp_is_reaped_with_its_assign() {
        let case = case_unused_temp();
        let mut netlist = case.netlist;
        dead_all(&mut netlist);
        assert!(!case.t.is_alive(&netlist.allocs.vars));
        assert!(!case.vsc_t.is_alive(&netlist.allocs.varscopes));
        assert!(!case.assign.is_alive(&netlist.allocs.stmts));
        // IO 端口和模块本体留下
        assert!(case.a.is_alive(&netlist.allocs.vars));
        assert!(case.b.is_alive(&netlist.allocs.vars));
        assert!(module_alive(&netlist, case.top));
        assert_no_dangling(&netlist);
    }

    #[test]
    fn side_effect_assign_keeps_its_target() {
        let case = case_side_effect_assign();
        let mut netlist = case.netlist;
        dead_all(&mut netlist);
        // 右边有 outputter, 赋值按普通语句跟踪, 目标保持存活
        assert!(case.t.is_alive(&netlist.allocs.vars));
        assert!(case.vsc_t.is_alive(&netlist.allocs.varscopes));
        assert!(case.assign.is_alive(&netlist.allocs.stmts));
    }

    #[test]
    fn unused_parameter_is_reaped() {
        let case = case_unused_param();
        let mut netlist = case.netlist;
        dead_all(&mut netlist);
        assert!(!case.param.is_alive(&netlist.allocs.vars));
        assert!(module_alive(&netlist, case.top));
    }

    #[test]
    fn traced_parameter_survives() {
        let mut b = NetlistBuilder::new("traced_param");
        let int32 = b.basic_dtype(BasicTypeKind::Int, 32);
        let top = b.add_module("top", 2);
        let param = b.add_var(top, "P", int32, VarFlags::PARAM | VarFlags::TRACED);
        let mut netlist = b.finish();
        dead_modules(&mut netlist);
        assert!(param.is_alive(&netlist.allocs.vars));
    }

    #[test]
    fn public_var_survives_every_entry() {
        let entries: [fn(&mut Netlist); 5] =
            [dead_modules, dead_dtypes, dead_dtypes_scoped, dead_all, dead_all_scoped];
        for entry in entries {
            let case = case_public_var();
            let mut netlist = case.netlist;
            entry(&mut netlist);
            assert!(case.s.is_alive(&netlist.allocs.vars));
            assert!(case.vsc_s.is_alive(&netlist.allocs.varscopes));
        }
    }

    #[test]
    fn empty_package_is_reaped_once_links_clear() {
        let case = case_empty_package();
        let mut netlist = case.netlist;
        dead_all(&mut netlist);
        assert!(!module_alive(&netlist, case.pkg));
        // 遍历清掉了包回指
        let vu = case.var_use.deref(&netlist.allocs.stmts).as_var_use().unwrap();
        assert!(vu.package.get().is_null());
        assert_no_dangling(&netlist);
    }

    #[test]
    fn package_link_keeps_package_without_cell_elim() {
        let case = case_empty_package();
        let mut netlist = case.netlist;
        dead_modules(&mut netlist);
        assert!(module_alive(&netlist, case.pkg));
        let vu = case.var_use.deref(&netlist.allocs.stmts).as_var_use().unwrap();
        assert!(vu.package.get().is_nonnull());
    }

    #[test]
    fn orphan_module_chain_is_reaped() {
        let case = case_orphan_module();
        let mut netlist = case.netlist;
        dead_modules(&mut netlist);
        assert!(!module_alive(&netlist, case.orphan));
        // orphan 的内部 cell 冲账之后, 下一轮不动点把它的子模块也删掉
        assert!(!module_alive(&netlist, case.orphan_child));
        assert!(module_alive(&netlist, case.wrapper));
        assert!(module_alive(&netlist, case.top));
        assert_no_dangling(&netlist);
    }

    #[test]
    fn internal_module_is_protected() {
        let mut b = NetlistBuilder::new("internal_mod");
        b.add_module("$wrapper", 1);
        b.add_module("top", 2);
        let support = b.add_module("$support", 7);
        b.set_module_flags(support, ModuleFlags::INTERNAL);
        let mut netlist = b.finish();
        dead_all_scoped(&mut netlist);
        assert!(module_alive(&netlist, support));
    }

    #[test]
    fn class_dtype_with_live_member_is_retained() {
        let case = case_class_member(true);
        let mut netlist = case.netlist;
        dead_dtypes(&mut netlist);
        assert!(case.class.is_alive(&netlist.allocs.dtypes));
        assert!(case.member_a.is_alive(&netlist.allocs.dtypes));
        assert!(case.member_b.is_alive(&netlist.allocs.dtypes));
    }

    #[test]
    fn class_dtype_without_live_members_is_reaped() {
        let case = case_class_member(false);
        let mut netlist = case.netlist;
        dead_dtypes(&mut netlist);
        assert!(!case.class.is_alive(&netlist.allocs.dtypes));
        assert!(!case.member_a.is_alive(&netlist.allocs.dtypes));
        assert!(!case.member_b.is_alive(&netlist.allocs.dtypes));
        assert_no_dangling(&netlist);
    }

    #[test]
    fn generic_dtypes_are_never_candidates() {
        let mut b = NetlistBuilder::new("generic_keep");
        let logic8 = b.basic_logic(8);
        b.add_module("top", 2);
        let mut netlist = b.finish();
        // 没有任何引用, 但 generic 基础类型要留下
        dead_dtypes(&mut netlist);
        assert!(logic8.is_alive(&netlist.allocs.dtypes));
    }

    #[test]
    fn hollow_scope_chain_is_reaped_when_scoped() {
        let mut b = NetlistBuilder::new("scope_chain");
        let top = b.add_module("top", 2);
        let top_scope = b.add_scope(top, "top", crate::ast::ScopeID::new_null(), true);
        let outer = b.add_scope(top, "top.u0", top_scope, false);
        let inner = b.add_scope(top, "top.u0.u1", outer, false);
        let mut netlist = b.finish();
        dead_dtypes_scoped(&mut netlist);
        // 内层先死, 冲掉外层的账, 外层在下一轮不动点里跟上
        assert!(!inner.is_alive(&netlist.allocs.scopes));
        assert!(!outer.is_alive(&netlist.allocs.scopes));
        // 顶层 scope 从不参与候选
        assert!(top_scope.is_alive(&netlist.allocs.scopes));
        assert_no_dangling(&netlist);
    }

    #[test]
    fn scopes_survive_without_scope_elimination() {
        let mut b = NetlistBuilder::new("scope_keep");
        let top = b.add_module("top", 2);
        let top_scope = b.add_scope(top, "top", crate::ast::ScopeID::new_null(), true);
        let sub = b.add_scope(top, "top.u0", top_scope, false);
        let mut netlist = b.finish();
        dead_all(&mut netlist);
        assert!(sub.is_alive(&netlist.allocs.scopes));
    }

    #[test]
    fn cfunc_scope_link_keeps_scope_alive() {
        let mut b = NetlistBuilder::new("cfunc_scope");
        let top = b.add_module("top", 2);
        let top_scope = b.add_scope(top, "top", crate::ast::ScopeID::new_null(), true);
        let sub = b.add_scope(top, "top.u0", top_scope, false);
        b.add_cfunc(NodeID::Module(top), "_eval", sub);
        let mut netlist = b.finish();
        dead_all_scoped(&mut netlist);
        assert!(sub.is_alive(&netlist.allocs.scopes));
    }

    #[test]
    fn dead_cell_of_hollow_module_is_reaped() {
        let mut b = NetlistBuilder::new("dead_cell");
        b.add_module("$wrapper", 1);
        let top = b.add_module("top", 2);
        let hollow = b.add_module("hollow", 3);
        let cell = b.add_cell(top, "u_hollow", hollow);
        let mut netlist = b.finish();
        dead_all(&mut netlist);
        assert!(!cell.is_alive(&netlist.allocs.cells));
        // cell 冲账之后模块清扫把空模块也删掉
        assert!(!module_alive(&netlist, hollow));
        assert!(module_alive(&netlist, top));
    }

    #[test]
    fn cells_survive_without_cell_elimination() {
        let mut b = NetlistBuilder::new("keep_cell");
        b.add_module("$wrapper", 1);
        let top = b.add_module("top", 2);
        let hollow = b.add_module("hollow", 3);
        let cell = b.add_cell(top, "u_hollow", hollow);
        let mut netlist = b.finish();
        dead_modules(&mut netlist);
        assert!(cell.is_alive(&netlist.allocs.cells));
        assert!(module_alive(&netlist, hollow));
    }

    #[test]
    fn nonhollow_cell_target_is_kept() {
        let mut b = NetlistBuilder::new("busy_cell");
        let logic1 = b.basic_logic(1);
        b.add_module("$wrapper", 1);
        let top = b.add_module("top", 2);
        let busy = b.add_module("busy", 3);
        b.add_var(busy, "x", logic1, VarFlags::IO);
        let cell = b.add_cell(top, "u_busy", busy);
        let mut netlist = b.finish();
        dead_all(&mut netlist);
        assert!(cell.is_alive(&netlist.allocs.cells));
        assert!(module_alive(&netlist, busy));
    }

    #[test]
    fn empty_modport_is_deferred_deleted() {
        let mut b = NetlistBuilder::new("modport");
        let logic1 = b.basic_logic(1);
        let top = b.add_module("top", 2);
        let scope = b.add_scope(top, "top", crate::ast::ScopeID::new_null(), true);
        let v = b.add_var(top, "sig", logic1, VarFlags::IO);
        let vs = b.add_var_scope(scope, v);
        let empty = b.add_modport(NodeID::Module(top), "mp_empty");
        let full = b.add_modport(NodeID::Module(top), "mp_full");
        b.add_var_use(NodeID::Stmt(full), v, vs);
        let mut netlist = b.finish();
        dead_all(&mut netlist);
        assert!(!empty.is_alive(&netlist.allocs.stmts));
        assert!(full.is_alive(&netlist.allocs.stmts));
    }

    #[test]
    fn modports_survive_without_cell_elimination() {
        let mut b = NetlistBuilder::new("modport_keep");
        let top = b.add_module("top", 2);
        let empty = b.add_modport(NodeID::Module(top), "mp_empty");
        let mut netlist = b.finish();
        dead_dtypes(&mut netlist);
        assert!(empty.is_alive(&netlist.allocs.stmts));
    }

    #[test]
    fn private_typedef_is_deferred_deleted() {
        let mut b = NetlistBuilder::new("typedef_priv");
        let top = b.add_module("top", 2);
        let class = b.class_dtype("t_priv", false);
        let td = b.add_typedef(NodeID::Module(top), "priv_t", class, false);
        let mut netlist = b.finish();
        dead_all(&mut netlist);
        assert!(!td.is_alive(&netlist.allocs.stmts));
        // typedef 死了, 没人引用的 class 也跟着死
        assert!(!class.is_alive(&netlist.allocs.dtypes));
    }

    #[test]
    fn public_typedef_keeps_its_package() {
        let mut b = NetlistBuilder::new("typedef_pub");
        b.add_module("$wrapper", 1);
        b.add_module("top", 2);
        let pkg = b.add_package("pkg", 3);
        let class = b.class_dtype("t_pub", false);
        let td = b.add_typedef(NodeID::Module(pkg), "pub_t", class, true);
        let mut netlist = b.finish();
        dead_all(&mut netlist);
        assert!(td.is_alive(&netlist.allocs.stmts));
        assert!(module_alive(&netlist, pkg));
        // 公有 typedef 的 check_all 给 class 记了账
        assert!(class.is_alive(&netlist.allocs.dtypes));
    }

    #[test]
    fn public_var_keeps_its_package() {
        let mut b = NetlistBuilder::new("pkg_pub_var");
        let int32 = b.basic_dtype(BasicTypeKind::Int, 32);
        b.add_module("$wrapper", 1);
        b.add_module("top", 2);
        let pkg = b.add_package("pkg", 3);
        b.add_var(pkg, "cfg", int32, VarFlags::SIG_PUBLIC);
        let mut netlist = b.finish();
        dead_all(&mut netlist);
        assert!(module_alive(&netlist, pkg));
    }

    #[test]
    fn ref_dtype_credits_its_target() {
        let mut b = NetlistBuilder::new("ref_target");
        let class = b.class_dtype("base_t", false);
        let alias = b.ref_dtype("alias_t", class, crate::ast::ModuleID::new_null());
        let top = b.add_module("top", 2);
        // 变量只经由别名引用 class
        b.add_var(top, "v", alias, VarFlags::IO);
        let mut netlist = b.finish();
        dead_dtypes(&mut netlist);
        assert!(alias.is_alive(&netlist.allocs.dtypes));
        assert!(class.is_alive(&netlist.allocs.dtypes));
        assert_no_dangling(&netlist);
    }

    #[test]
    fn unreferenced_ref_dtype_is_reaped() {
        let mut b = NetlistBuilder::new("ref_unused");
        let class = b.class_dtype("base_t", false);
        let alias = b.ref_dtype("alias_t", class, crate::ast::ModuleID::new_null());
        b.add_module("top", 2);
        let mut netlist = b.finish();
        dead_dtypes(&mut netlist);
        // 别名没人用, 本次调用删掉别名. dtype 清扫是单遍的, class 身上
        // 还挂着别名记的账, 要到下一次调用才会消失
        assert!(!alias.is_alive(&netlist.allocs.dtypes));
        assert!(class.is_alive(&netlist.allocs.dtypes));
        dead_dtypes(&mut netlist);
        assert!(!class.is_alive(&netlist.allocs.dtypes));
    }

    #[test]
    fn child_dtype_edge_is_always_counted() {
        let mut b = NetlistBuilder::new("child_dtype");
        let logic1 = b.basic_logic(1);
        let class = b.class_dtype("shadow_t", false);
        let top = b.add_module("top", 2);
        let v = b.add_var(top, "x", logic1, VarFlags::IO);
        b.set_child_dtype(crate::ast::NodeID::Var(v), class);
        let mut netlist = b.finish();
        dead_dtypes(&mut netlist);
        // class 只被 child dtype 边引用, 也要留下
        assert!(class.is_alive(&netlist.allocs.dtypes));
    }

    #[test]
    fn final_clk_entry_pins_its_scope() {
        let mut b = NetlistBuilder::new("final_clk");
        let top = b.add_module("top", 2);
        let top_scope = b.add_scope(top, "top", crate::ast::ScopeID::new_null(), true);
        let sub = b.add_scope(top, "top.u0", top_scope, false);
        b.add_final_clk(NodeID::Scope(sub));
        let mut netlist = b.finish();
        dead_all_scoped(&mut netlist);
        // final-clock 条目让 scope 不算空, 进不了候选
        assert!(sub.is_alive(&netlist.allocs.scopes));
    }

    #[test]
    fn ftask_call_package_link_follows_mode() {
        let build = || {
            let mut b = NetlistBuilder::new("ftask_pkg");
            b.add_module("$wrapper", 1);
            let top = b.add_module("top", 2);
            let pkg = b.add_package("pkg", 3);
            let scope = b.add_scope(top, "top", crate::ast::ScopeID::new_null(), true);
            let func = b.add_cfunc(NodeID::Module(top), "do_task", scope);
            let call = b.add_ftask_call(NodeID::Module(top), func);
            b.set_stmt_package(call, pkg);
            (b.finish(), pkg, call)
        };

        let (mut netlist, pkg, _call) = build();
        dead_modules(&mut netlist);
        assert!(module_alive(&netlist, pkg));

        let (mut netlist, pkg, call) = build();
        dead_all(&mut netlist);
        assert!(!module_alive(&netlist, pkg));
        let StmtKind::FTaskCall(c) = &call.deref(&netlist.allocs.stmts).kind else {
            panic!("call node changed kind")
        };
        assert!(c.package.get().is_null());
    }

    #[test]
    fn enum_item_use_credits_its_dtype() {
        let mut b = NetlistBuilder::new("enum_use");
        let en = b.enum_dtype("state_t");
        let top = b.add_module("top", 2);
        b.add_enum_item_use(NodeID::Module(top), en);
        let mut netlist = b.finish();
        dead_dtypes(&mut netlist);
        assert!(en.is_alive(&netlist.allocs.dtypes));
    }

    #[test]
    fn idempotent_on_settled_netlists() {
        // P2: 第二次运行同一入口不再改变任何东西
        let case = case_unused_temp();
        let mut netlist = case.netlist;
        dead_all(&mut netlist);
        let first = netlist_to_string(&netlist);
        dead_all(&mut netlist);
        let second = netlist_to_string(&netlist);
        assert_eq!(first, second);

        let case = case_orphan_module();
        let mut netlist = case.netlist;
        dead_modules(&mut netlist);
        let first = netlist_to_string(&netlist);
        dead_modules(&mut netlist);
        let second = netlist_to_string(&netlist);
        assert_eq!(first, second);
    }

    #[test]
    fn dead_all_refines_dead_dtypes() {
        // P6: dead_dtypes 删的 dead_all 也删
        let mut n_dtypes = case_class_member(false).netlist;
        let mut n_all = case_class_member(false).netlist;
        dead_dtypes(&mut n_dtypes);
        dead_all(&mut n_all);
        assert!(n_all.allocs.node_count() <= n_dtypes.allocs.node_count());
        assert_eq!(n_dtypes.allocs.dtypes.len(), n_all.allocs.dtypes.len());
    }

    #[test]
    fn type_cache_is_repaired_after_the_pass() {
        let mut b = NetlistBuilder::new("cache_repair");
        let logic8 = b.basic_logic(8);
        b.add_module("top", 2);
        let mut netlist = b.finish();
        dead_all(&mut netlist);
        assert!(netlist.types.cache_ok());
        // 修好的缓存还能命中同一个驻留类型
        let again = netlist.types.find_basic(&mut netlist.allocs, BasicTypeKind::Logic, 8);
        assert_eq!(again, logic8);
    }

    #[test]
    fn scratch_rental_is_returned_between_entries() {
        // 两个入口背靠背跑, 说明计数槽确实归还了
        let mut netlist = case_unused_temp().netlist;
        dead_dtypes(&mut netlist);
        dead_all_scoped(&mut netlist);
    }
}
