use std::{cell::Cell, rc::Rc};

use thiserror::Error;

use crate::{
    SymbolStr,
    ast::{AstAllocs, ModuleID, NodeID, TypeTable},
};

#[derive(Debug, Clone, Copy, Error)]
pub enum TreeError {
    #[error("node {0:?} is not a child of its recorded parent")]
    NotAChild(NodeID),
    #[error("root node {0:?} is not owned by the netlist")]
    RootNotOwned(NodeID),
    #[error("dangling node reference {0:?}")]
    InvalidRef(NodeID),
}

pub type TreeRes<T = ()> = Result<T, TreeError>;

/// AST 的根. 持有全部节点分配器、按层级排序的模块列表和类型表.
pub struct Netlist {
    pub name: SymbolStr,
    pub allocs: AstAllocs,
    /// Root list of module/package definitions, wrapper first.
    pub modules: Vec<ModuleID>,
    pub types: TypeTable,
    /// user1 计数槽的租借标记, 同一时刻只允许一个 pass 持有.
    scratch_rented: Rc<Cell<bool>>,
}

impl Netlist {
    pub fn new(name: impl Into<SymbolStr>) -> Self {
        Self {
            name: name.into(),
            allocs: AstAllocs::new(),
            modules: Vec::new(),
            types: TypeTable::new(),
            scratch_rented: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn scratch_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.scratch_rented)
    }

    /// 把节点从它父亲的孩子链上摘下来. 根节点 (模块、根级 DType)
    /// 改为从网表的所有权列表里摘除.
    pub fn unlink_from_parent(&mut self, node: NodeID) -> TreeRes {
        let parent = node
            .try_common(&self.allocs)
            .ok_or(TreeError::InvalidRef(node))?
            .parent;
        match parent {
            NodeID::None => match node {
                NodeID::Module(m) => {
                    let at = self
                        .modules
                        .iter()
                        .position(|&x| x == m)
                        .ok_or(TreeError::RootNotOwned(node))?;
                    self.modules.remove(at);
                    Ok(())
                }
                NodeID::DType(dt) => {
                    let at = self
                        .types
                        .owned
                        .iter()
                        .position(|&x| x == dt)
                        .ok_or(TreeError::RootNotOwned(node))?;
                    self.types.owned.remove(at);
                    Ok(())
                }
                _ => Err(TreeError::RootNotOwned(node)),
            },
            p => {
                let kids = &mut p.common_mut(&mut self.allocs).children;
                let at = kids
                    .iter()
                    .position(|&x| x == node)
                    .ok_or(TreeError::NotAChild(node))?;
                kids.remove(at);
                Ok(())
            }
        }
    }

    /// 解链并销毁整棵子树. 子树成员全部从 slab 中释放;
    /// 指向它们的跨引用从此悬空, 由调用方的计数纪律保证不再被读取.
    pub fn unplug_subtree(&mut self, node: NodeID) -> TreeRes {
        self.unlink_from_parent(node)?;
        let mut doomed = Vec::new();
        self.allocs.collect_subtree(node, &mut doomed);
        for dead in doomed {
            self.allocs.free_node(dead);
        }
        Ok(())
    }
}
