use slab::Slab;

use crate::{
    ast::{CellObj, DTypeObj, ModuleObj, NodeID, ScopeObj, StmtObj, VarObj, VarScopeObj},
    base::ISlabID,
};

/// Per-kind slab allocators of the whole netlist.
pub struct AstAllocs {
    pub modules: Slab<ModuleObj>,
    pub scopes: Slab<ScopeObj>,
    pub cells: Slab<CellObj>,
    pub vars: Slab<VarObj>,
    pub varscopes: Slab<VarScopeObj>,
    pub dtypes: Slab<DTypeObj>,
    pub stmts: Slab<StmtObj>,
}

impl AstAllocs {
    pub fn new() -> Self {
        Self {
            modules: Slab::new(),
            scopes: Slab::new(),
            cells: Slab::new(),
            vars: Slab::new(),
            varscopes: Slab::new(),
            dtypes: Slab::new(),
            stmts: Slab::new(),
        }
    }
    pub fn with_capacity(base_capacity: usize) -> Self {
        Self {
            modules: Slab::with_capacity(base_capacity),
            scopes: Slab::with_capacity(base_capacity),
            cells: Slab::with_capacity(base_capacity),
            vars: Slab::with_capacity(base_capacity),
            varscopes: Slab::with_capacity(base_capacity),
            dtypes: Slab::with_capacity(base_capacity),
            stmts: Slab::with_capacity(base_capacity),
        }
    }

    /// 先序收集以 `root` 为根的整棵子树. 只顺着树边走, 不追跨引用.
    pub fn collect_subtree(&self, root: NodeID, out: &mut Vec<NodeID>) {
        if root.is_none() {
            return;
        }
        out.push(root);
        let mut at = out.len() - 1;
        while at < out.len() {
            let node = out[at];
            for &kid in &node.common(self).children {
                out.push(kid);
            }
            at += 1;
        }
    }

    /// 把单个节点从所属 slab 中移除. 不处理树边, 调用方负责先解链.
    pub(crate) fn free_node(&mut self, node: NodeID) {
        match node {
            NodeID::None => {}
            NodeID::Module(m) => {
                m.free(&mut self.modules);
            }
            NodeID::Scope(s) => {
                s.free(&mut self.scopes);
            }
            NodeID::Cell(c) => {
                c.free(&mut self.cells);
            }
            NodeID::Var(v) => {
                v.free(&mut self.vars);
            }
            NodeID::VarScope(vs) => {
                vs.free(&mut self.varscopes);
            }
            NodeID::DType(dt) => {
                dt.free(&mut self.dtypes);
            }
            NodeID::Stmt(st) => {
                st.free(&mut self.stmts);
            }
        }
    }

    /// Total number of live nodes across every slab.
    pub fn node_count(&self) -> usize {
        self.modules.len()
            + self.scopes.len()
            + self.cells.len()
            + self.vars.len()
            + self.varscopes.len()
            + self.dtypes.len()
            + self.stmts.len()
    }
}

impl Default for AstAllocs {
    fn default() -> Self {
        Self::new()
    }
}
