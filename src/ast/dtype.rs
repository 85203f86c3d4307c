use std::{cell::Cell, collections::HashMap};

use crate::{
    SymbolStr,
    ast::{AstAllocs, ModuleID, NodeCommon},
    base::{INullableValue, ISlabID},
};

/// 数据类型节点. 描述信号的形状和位宽.
///
/// DType 之间可以互相引用, 甚至指向自身 (`common.dtype` 自环).
/// 基础类型由 [`TypeTable`] 统一驻留, 带 `generic` 标记, 永不删除.
#[derive(Debug, Clone)]
pub struct DTypeObj {
    /// Built-in primitive type, never deletable.
    pub generic: bool,
    pub kind: DTypeKind,
    pub common: NodeCommon,
}

impl DTypeObj {
    pub fn new(kind: DTypeKind) -> Self {
        Self { generic: false, kind, common: NodeCommon::new() }
    }

    pub fn is_member(&self) -> bool {
        matches!(self.kind, DTypeKind::Member(_))
    }
    pub fn is_class(&self) -> bool {
        matches!(self.kind, DTypeKind::Class(_))
    }

    /// Ref 精化所包装的目标类型; 其它精化返回空句柄.
    pub fn virt_ref_dtype(&self) -> DTypeID {
        match &self.kind {
            DTypeKind::Ref(r) => r.ref_dtype.get(),
            _ => DTypeID::new_null(),
        }
    }

    pub fn display_name(&self) -> SymbolStr {
        match &self.kind {
            DTypeKind::Basic(b) => SymbolStr::new(format!("{:?}[{}]", b.keyword, b.width)),
            DTypeKind::Ref(r) => r.name.clone(),
            DTypeKind::Member(m) => m.name.clone(),
            DTypeKind::Class(c) => c.name.clone(),
            DTypeKind::Enum(e) => e.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DTypeKind {
    Basic(BasicDType),
    Ref(RefDType),
    Member(MemberDType),
    Class(ClassDType),
    Enum(EnumDType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicDType {
    pub keyword: BasicTypeKind,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicTypeKind {
    Logic,
    Bit,
    Int,
    Real,
    Str,
}

/// typedef 解析后的引用包装. `package` 是 scoping 残留的包回指,
/// cell 消除模式下会被遍历直接清空.
#[derive(Debug, Clone)]
pub struct RefDType {
    pub name: SymbolStr,
    pub ref_dtype: Cell<DTypeID>,
    pub package: Cell<ModuleID>,
}

/// struct/union 成员. 成员的生命期由所属的 Class DType 决定,
/// 所以成员自己从不进入删除候选.
#[derive(Debug, Clone)]
pub struct MemberDType {
    pub name: SymbolStr,
}

/// struct/union 本体, 成员作为树上的 DType 孩子挂在它下面.
#[derive(Debug, Clone)]
pub struct ClassDType {
    pub name: SymbolStr,
    pub packed: bool,
}

#[derive(Debug, Clone)]
pub struct EnumDType {
    pub name: SymbolStr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DTypeID(pub u32);

impl ISlabID for DTypeID {
    type RefObject = DTypeObj;

    fn from_handle(handle: u32) -> Self {
        DTypeID(handle)
    }
    fn into_handle(self) -> u32 {
        self.0
    }
}

/// 网表根下的类型表. 持有所有根级 DType 的所有权列表, 以及基础类型的
/// 驻留缓存.
///
/// DCE 在删除 DType 之前会先 [`clear_cache`], 删完之后再
/// [`repair_cache`]; 缓存失效期间不允许任何查询走缓存.
///
/// [`clear_cache`]: TypeTable::clear_cache
/// [`repair_cache`]: TypeTable::repair_cache
pub struct TypeTable {
    /// Root-level dtypes owned by the netlist (tree parent is `None`).
    pub owned: Vec<DTypeID>,
    cache: HashMap<BasicDType, DTypeID>,
    cache_ok: bool,
}

impl TypeTable {
    pub fn new() -> Self {
        Self { owned: Vec::new(), cache: HashMap::new(), cache_ok: true }
    }

    pub fn cache_ok(&self) -> bool {
        self.cache_ok
    }

    /// 查找或创建一个驻留的基础类型.
    pub fn find_basic(
        &mut self,
        allocs: &mut AstAllocs,
        keyword: BasicTypeKind,
        width: u32,
    ) -> DTypeID {
        assert!(self.cache_ok, "TypeTable: lookup through a cleared cache");
        let key = BasicDType { keyword, width };
        if let Some(&found) = self.cache.get(&key) {
            return found;
        }
        let mut obj = DTypeObj::new(DTypeKind::Basic(key));
        obj.generic = true;
        let id = DTypeID::from_handle(allocs.dtypes.insert(obj) as u32);
        // 基础类型的 dtype 指向自身
        id.deref(&allocs.dtypes).common.dtype.set(id);
        self.owned.push(id);
        self.cache.insert(key, id);
        id
    }

    pub fn adopt(&mut self, dt: DTypeID) {
        self.owned.push(dt);
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.cache_ok = false;
    }

    /// 从幸存的根级 DType 重建驻留缓存.
    pub fn repair_cache(&mut self, allocs: &AstAllocs) {
        self.cache.clear();
        for &dt in &self.owned {
            let Some(obj) = dt.try_deref(&allocs.dtypes) else { continue };
            if let DTypeKind::Basic(key) = obj.kind {
                self.cache.insert(key, dt);
            }
        }
        self.cache_ok = true;
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
