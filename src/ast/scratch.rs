use std::{cell::Cell, rc::Rc};

use crate::{
    ast::{Netlist, NodeID},
    base::ISlabID,
};

/// 每个节点一格的 user1 计数槽, 按 slab 句柄做稠密下标.
///
/// 计数槽是进程级独占资源: 通过 [`rent`] 从网表租借, 同一时刻只能有
/// 一个持有者; 析构时自动归还, pass 中途 panic 也不例外.
///
/// [`rent`]: ScratchCounters::rent
pub struct ScratchCounters {
    modules: Vec<i32>,
    scopes: Vec<i32>,
    cells: Vec<i32>,
    vars: Vec<i32>,
    varscopes: Vec<i32>,
    dtypes: Vec<i32>,
    stmts: Vec<i32>,
    rented: Rc<Cell<bool>>,
}

impl ScratchCounters {
    /// 租借计数槽. 重复租借说明上一个 pass 没有归还, 属于内部不一致,
    /// 直接终止.
    pub fn rent(netlist: &Netlist) -> Self {
        let flag = netlist.scratch_flag();
        if flag.get() {
            log::error!("user1 scratch slot already rented by another pass");
            panic!("ScratchCounters: user1 scratch slot already rented");
        }
        flag.set(true);
        let allocs = &netlist.allocs;
        Self {
            modules: vec![0; allocs.modules.capacity()],
            scopes: vec![0; allocs.scopes.capacity()],
            cells: vec![0; allocs.cells.capacity()],
            vars: vec![0; allocs.vars.capacity()],
            varscopes: vec![0; allocs.varscopes.capacity()],
            dtypes: vec![0; allocs.dtypes.capacity()],
            stmts: vec![0; allocs.stmts.capacity()],
            rented: flag,
        }
    }

    pub fn credit(&mut self, node: NodeID) {
        *self.slot(node) += 1;
    }
    pub fn debit(&mut self, node: NodeID) {
        *self.slot(node) -= 1;
    }

    /// 当前计数. 从未被记过账的节点返回 0.
    pub fn count(&self, node: NodeID) -> i32 {
        let (bucket, at) = match node {
            NodeID::None => return 0,
            NodeID::Module(m) => (&self.modules, m.into_handle()),
            NodeID::Scope(s) => (&self.scopes, s.into_handle()),
            NodeID::Cell(c) => (&self.cells, c.into_handle()),
            NodeID::Var(v) => (&self.vars, v.into_handle()),
            NodeID::VarScope(vs) => (&self.varscopes, vs.into_handle()),
            NodeID::DType(dt) => (&self.dtypes, dt.into_handle()),
            NodeID::Stmt(st) => (&self.stmts, st.into_handle()),
        };
        bucket.get(at as usize).copied().unwrap_or(0)
    }

    fn slot(&mut self, node: NodeID) -> &mut i32 {
        let (bucket, at) = match node {
            NodeID::None => panic!("ScratchCounters: accounting against the null node"),
            NodeID::Module(m) => (&mut self.modules, m.into_handle()),
            NodeID::Scope(s) => (&mut self.scopes, s.into_handle()),
            NodeID::Cell(c) => (&mut self.cells, c.into_handle()),
            NodeID::Var(v) => (&mut self.vars, v.into_handle()),
            NodeID::VarScope(vs) => (&mut self.varscopes, vs.into_handle()),
            NodeID::DType(dt) => (&mut self.dtypes, dt.into_handle()),
            NodeID::Stmt(st) => (&mut self.stmts, st.into_handle()),
        };
        let at = at as usize;
        if at >= bucket.len() {
            bucket.resize(at + 1, 0);
        }
        &mut bucket[at]
    }
}

impl Drop for ScratchCounters {
    fn drop(&mut self) {
        self.rented.set(false);
    }
}
