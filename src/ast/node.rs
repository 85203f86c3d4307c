use std::cell::Cell;

use crate::{
    ast::{DTypeID, NodeID},
    base::INullableValue,
};

/// 所有节点共享的头部: 树边与 dtype 回指.
///
/// `dtype` 与 `child_dtype` 是跨引用而不是树边; 删除节点时不会顺着它们
/// 递归销毁. DType 节点的 `dtype` 可能指向自身.
#[derive(Debug, Clone)]
pub struct NodeCommon {
    pub parent: NodeID,
    pub children: Vec<NodeID>,
    pub dtype: Cell<DTypeID>,
    pub child_dtype: Cell<DTypeID>,
}

impl NodeCommon {
    pub fn new() -> Self {
        Self {
            parent: NodeID::None,
            children: Vec::new(),
            dtype: Cell::new(DTypeID::new_null()),
            child_dtype: Cell::new(DTypeID::new_null()),
        }
    }
}

impl Default for NodeCommon {
    fn default() -> Self {
        Self::new()
    }
}
