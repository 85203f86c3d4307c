//! Canned netlists exercising the dead-code elimination pass.
//!
//! 每个构造函数都返回一个刚 elaborate 完的小网表, 结构对应一个
//! 有代表性的消除场景. 句柄通过返回值结构体暴露出来, 方便断言.

use crate::{
    ast::{
        DTypeID, ModuleID, Netlist, NetlistBuilder, NodeID, ScopeID, StmtID, VarFlags, VarID,
        VarScopeID,
    },
    base::INullableValue,
};

/// ```verilog
/// module top(input a, input b);
///   /*temp*/ logic t;
///   assign t = a + b;   // t never read
/// endmodule
/// ```
pub struct UnusedTempCase {
    pub netlist: Netlist,
    pub top: ModuleID,
    pub a: VarID,
    pub b: VarID,
    pub t: VarID,
    pub vsc_t: VarScopeID,
    pub assign: StmtID,
}

pub fn case_unused_temp() -> UnusedTempCase {
    let mut b = NetlistBuilder::new("unused_temp");
    let logic1 = b.basic_logic(1);
    let top = b.add_module("top", 2);
    let scope = b.add_scope(top, "top", ScopeID::new_null(), true);
    let var_a = b.add_var(top, "a", logic1, VarFlags::IO);
    let var_b = b.add_var(top, "b", logic1, VarFlags::IO);
    let var_t = b.add_var(top, "t", logic1, VarFlags::TEMP);
    let vsc_a = b.add_var_scope(scope, var_a);
    let vsc_b = b.add_var_scope(scope, var_b);
    let vsc_t = b.add_var_scope(scope, var_t);

    let lhs = b.add_var_use(NodeID::None, var_t, vsc_t);
    let rhs = b.add_exec(NodeID::None, "add", false);
    b.add_var_use(NodeID::Stmt(rhs), var_a, vsc_a);
    b.add_var_use(NodeID::Stmt(rhs), var_b, vsc_b);
    let assign = b.add_assign(NodeID::Module(top), lhs, rhs);

    UnusedTempCase {
        netlist: b.finish(),
        top,
        a: var_a,
        b: var_b,
        t: var_t,
        vsc_t,
        assign,
    }
}

/// 写入端有副作用的变体: `assign t = $getint();` 之类. 即使 `t` 没人读,
/// 赋值也不能删.
pub struct SideEffectAssignCase {
    pub netlist: Netlist,
    pub t: VarID,
    pub vsc_t: VarScopeID,
    pub assign: StmtID,
}

pub fn case_side_effect_assign() -> SideEffectAssignCase {
    let mut b = NetlistBuilder::new("side_effect_assign");
    let logic1 = b.basic_logic(1);
    let top = b.add_module("top", 2);
    let scope = b.add_scope(top, "top", ScopeID::new_null(), true);
    let var_t = b.add_var(top, "t", logic1, VarFlags::TEMP);
    let vsc_t = b.add_var_scope(scope, var_t);

    let lhs = b.add_var_use(NodeID::None, var_t, vsc_t);
    let rhs = b.add_exec(NodeID::None, "syscall", true);
    let assign = b.add_assign(NodeID::Module(top), lhs, rhs);

    SideEffectAssignCase { netlist: b.finish(), t: var_t, vsc_t, assign }
}

/// `parameter int P = 3;`, 没人用.
pub struct UnusedParamCase {
    pub netlist: Netlist,
    pub top: ModuleID,
    pub param: VarID,
}

pub fn case_unused_param() -> UnusedParamCase {
    let mut b = NetlistBuilder::new("unused_param");
    let int32 = b.basic_dtype(crate::ast::BasicTypeKind::Int, 32);
    let top = b.add_module("top", 2);
    let param = b.add_var(top, "P", int32, VarFlags::PARAM);
    UnusedParamCase { netlist: b.finish(), top, param }
}

/// `public int s;`, 没人读. 公有信号任何模式下都要留下.
pub struct PublicVarCase {
    pub netlist: Netlist,
    pub s: VarID,
    pub vsc_s: VarScopeID,
}

pub fn case_public_var() -> PublicVarCase {
    let mut b = NetlistBuilder::new("public_var");
    let int32 = b.basic_dtype(crate::ast::BasicTypeKind::Int, 32);
    let top = b.add_module("top", 2);
    let scope = b.add_scope(top, "top", ScopeID::new_null(), true);
    let s = b.add_var(top, "s", int32, VarFlags::SIG_PUBLIC);
    let vsc_s = b.add_var_scope(scope, s);
    PublicVarCase { netlist: b.finish(), s, vsc_s }
}

/// 只剩 late-stage 包回指撑着的空包.
pub struct EmptyPackageCase {
    pub netlist: Netlist,
    pub pkg: ModuleID,
    pub var_use: StmtID,
}

pub fn case_empty_package() -> EmptyPackageCase {
    let mut b = NetlistBuilder::new("empty_package");
    let logic1 = b.basic_logic(1);
    let top = b.add_module("top", 2);
    let pkg = b.add_package("pkg", 3);
    let scope = b.add_scope(top, "top", ScopeID::new_null(), true);
    let var_x = b.add_var(top, "x", logic1, VarFlags::IO);
    let vsc_x = b.add_var_scope(scope, var_x);
    // x 的引用带着一个指向 pkg 的残留包回指
    let var_use = b.add_var_use(NodeID::Module(top), var_x, vsc_x);
    b.set_stmt_package(var_use, pkg);
    EmptyPackageCase { netlist: b.finish(), pkg, var_use }
}

/// level 5 的孤儿模块, 内部还实例化了一个只有它用的子模块.
pub struct OrphanModuleCase {
    pub netlist: Netlist,
    pub wrapper: ModuleID,
    pub top: ModuleID,
    pub orphan: ModuleID,
    pub orphan_child: ModuleID,
}

pub fn case_orphan_module() -> OrphanModuleCase {
    let mut b = NetlistBuilder::new("orphan_module");
    let logic1 = b.basic_logic(1);
    let wrapper = b.add_module("$wrapper", 1);
    let top = b.add_module("top", 2);
    b.add_cell(wrapper, "top_inst", top);
    let orphan = b.add_module("orphan", 5);
    let orphan_child = b.add_module("orphan_child", 6);
    // 谁也不实例化 orphan; orphan 自己实例化 orphan_child
    b.add_cell(orphan, "child_inst", orphan_child);
    b.add_var(orphan_child, "x", logic1, VarFlags::IO);
    OrphanModuleCase { netlist: b.finish(), wrapper, top, orphan, orphan_child }
}

/// `struct { int a; int b; }`: 只有成员 a 被引用, 本体没人引用.
pub struct ClassMemberCase {
    pub netlist: Netlist,
    pub class: DTypeID,
    pub member_a: DTypeID,
    pub member_b: DTypeID,
}

/// `live_member` 为 false 时连成员都没人引用.
pub fn case_class_member(live_member: bool) -> ClassMemberCase {
    let mut b = NetlistBuilder::new("class_member");
    let int32 = b.basic_dtype(crate::ast::BasicTypeKind::Int, 32);
    let class = b.class_dtype("pair_t", false);
    let member_a = b.member_dtype(class, "a", int32);
    let member_b = b.member_dtype(class, "b", int32);
    let top = b.add_module("top", 2);
    if live_member {
        // 经由成员选择表达式引用 S.a, 不引用 S 本身
        let sel = b.add_exec(NodeID::Module(top), "member_sel", false);
        b.set_stmt_dtype(sel, member_a);
    }
    ClassMemberCase { netlist: b.finish(), class, member_a, member_b }
}
