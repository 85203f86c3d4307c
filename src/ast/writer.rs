//! Indented text dump of a netlist, for debug dumps and structural
//! snapshots in tests.

use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{self, BufWriter, Write},
};

use log::warn;

use crate::{
    ast::{DTypeKind, Netlist, NodeID, StmtKind},
    base::{INullableValue, ISlabID},
};

pub struct TreeWriter<'nl> {
    pub output: RefCell<&'nl mut dyn Write>,
    pub netlist: &'nl Netlist,
    indent: Cell<usize>,
}

impl<'nl> TreeWriter<'nl> {
    pub fn from_netlist(output: &'nl mut dyn Write, netlist: &'nl Netlist) -> Self {
        Self { output: RefCell::new(output), netlist, indent: Cell::new(0) }
    }

    pub fn write_all(&self) -> io::Result<()> {
        writeln!(self.output.borrow_mut(), "NETLIST {}", self.netlist.name)?;
        self.indent.set(1);
        for &m in &self.netlist.modules {
            self.write_node(NodeID::Module(m))?;
        }
        writeln!(self.output.borrow_mut(), " TYPETABLE")?;
        self.indent.set(2);
        for &dt in &self.netlist.types.owned {
            self.write_node(NodeID::DType(dt))?;
        }
        Ok(())
    }

    fn write_node(&self, node: NodeID) -> io::Result<()> {
        {
            let mut out = self.output.borrow_mut();
            for _ in 0..self.indent.get() {
                write!(out, " ")?;
            }
            writeln!(out, "{}", self.describe(node))?;
        }
        self.indent.set(self.indent.get() + 1);
        for &kid in &node.common(&self.netlist.allocs).children {
            self.write_node(kid)?;
        }
        self.indent.set(self.indent.get() - 1);
        Ok(())
    }

    fn describe(&self, node: NodeID) -> String {
        let allocs = &self.netlist.allocs;
        let mut line = match node {
            NodeID::None => "NONE".to_string(),
            NodeID::Module(m) => {
                let obj = m.deref(&allocs.modules);
                format!("{:?} %{} \"{}\" lv{}", obj.kind, m.0, obj.name, obj.level)
            }
            NodeID::Scope(s) => {
                let obj = s.deref(&allocs.scopes);
                let mut line = format!("SCOPE %{} \"{}\"", s.0, obj.name);
                if obj.is_top {
                    line.push_str(" top");
                }
                if obj.above.is_nonnull() {
                    line.push_str(&format!(" above=%{}", obj.above.0));
                }
                line
            }
            NodeID::Cell(c) => {
                let obj = c.deref(&allocs.cells);
                format!("CELL %{} \"{}\" mod=%{}", c.0, obj.name, obj.modp.0)
            }
            NodeID::Var(v) => {
                let obj = v.deref(&allocs.vars);
                format!("VAR %{} \"{}\" {:?}", v.0, obj.name, obj.flags)
            }
            NodeID::VarScope(vs) => {
                let obj = vs.deref(&allocs.varscopes);
                format!("VARSCOPE %{} var=%{} scope=%{}", vs.0, obj.varp.0, obj.scope.0)
            }
            NodeID::DType(dt) => {
                let obj = dt.deref(&allocs.dtypes);
                let mut line = format!("DTYPE %{} {}", dt.0, obj.display_name());
                if obj.generic {
                    line.push_str(" generic");
                }
                if let DTypeKind::Ref(r) = &obj.kind {
                    if r.ref_dtype.get().is_nonnull() {
                        line.push_str(&format!(" ref=%{}", r.ref_dtype.get().0));
                    }
                    if r.package.get().is_nonnull() {
                        line.push_str(&format!(" pkg=%{}", r.package.get().0));
                    }
                }
                line
            }
            NodeID::Stmt(st) => {
                let obj = st.deref(&allocs.stmts);
                match &obj.kind {
                    StmtKind::VarUse(vu) => {
                        let mut line = format!("VARUSE %{} var=%{}", st.0, vu.varp.0);
                        if vu.vscp.is_nonnull() {
                            line.push_str(&format!(" vsc=%{}", vu.vscp.0));
                        }
                        if vu.package.get().is_nonnull() {
                            line.push_str(&format!(" pkg=%{}", vu.package.get().0));
                        }
                        line
                    }
                    StmtKind::FTaskCall(c) => {
                        let mut line = format!("FTASKCALL %{} func=%{}", st.0, c.funcp.0);
                        if c.package.get().is_nonnull() {
                            line.push_str(&format!(" pkg=%{}", c.package.get().0));
                        }
                        line
                    }
                    StmtKind::EnumItemUse(e) => {
                        let mut line = format!("ENUMITEMUSE %{}", st.0);
                        if e.package.get().is_nonnull() {
                            line.push_str(&format!(" pkg=%{}", e.package.get().0));
                        }
                        line
                    }
                    StmtKind::Assign(asn) => {
                        format!("ASSIGN %{} lhs=%{} rhs=%{}", st.0, asn.lhs.0, asn.rhs.0)
                    }
                    StmtKind::Typedef(td) => {
                        let vis = if td.attr_public { " public" } else { "" };
                        format!("TYPEDEF %{} \"{}\"{}", st.0, td.name, vis)
                    }
                    StmtKind::Modport(mp) => format!("MODPORT %{} \"{}\"", st.0, mp.name),
                    StmtKind::CFunc(f) => {
                        let mut line = format!("CFUNC %{} \"{}\"", st.0, f.name);
                        if f.scope.is_nonnull() {
                            line.push_str(&format!(" scope=%{}", f.scope.0));
                        }
                        line
                    }
                    StmtKind::FinalClk => format!("FINALCLK %{}", st.0),
                    StmtKind::Exec(e) => {
                        let fx = if e.outputter { " outputter" } else { "" };
                        format!("EXEC %{} \"{}\"{}", st.0, e.op, fx)
                    }
                }
            }
        };
        let dt = node.dtype_of(&self.netlist.allocs);
        if dt.is_nonnull() && NodeID::DType(dt) != node {
            line.push_str(&format!(" dt=%{}", dt.0));
        }
        line
    }
}

pub fn write_netlist(netlist: &Netlist, output: &mut dyn Write) -> io::Result<()> {
    TreeWriter::from_netlist(output, netlist).write_all()
}

/// 以文本形式渲染整个网表, 用作测试里的结构快照.
pub fn netlist_to_string(netlist: &Netlist) -> String {
    let mut buf = Vec::new();
    write_netlist(netlist, &mut buf).expect("writing a netlist to memory cannot fail");
    String::from_utf8(buf).expect("tree dump is valid utf-8")
}

/// Dump the netlist under the given filename; failures are logged and
/// swallowed, a missing dump must never fail the compile.
pub fn write_tree_to_file_quiet(netlist: &Netlist, filename: &str) {
    let file = match File::create(filename) {
        Ok(f) => f,
        Err(e) => {
            warn!("cannot create tree dump {filename}: {e}");
            return;
        }
    };
    let mut out = BufWriter::new(file);
    if let Err(e) = write_netlist(netlist, &mut out) {
        warn!("cannot write tree dump {filename}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NetlistBuilder, ScopeID, VarFlags};

    #[test]
    fn dump_shows_structure() {
        let mut b = NetlistBuilder::new("demo");
        let logic = b.basic_logic(8);
        let top = b.add_module("top", 2);
        let scope = b.add_scope(top, "top", ScopeID::new_null(), true);
        let v = b.add_var(top, "sig", logic, VarFlags::IO);
        b.add_var_scope(scope, v);
        let netlist = b.finish();
        let dump = netlist_to_string(&netlist);
        assert!(dump.contains("NETLIST demo"));
        assert!(dump.contains("\"top\""));
        assert!(dump.contains("\"sig\""));
        assert!(dump.contains("VARSCOPE"));
        assert!(dump.contains("TYPETABLE"));
    }
}
