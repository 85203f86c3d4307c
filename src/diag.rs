//! Diagnostic-suppression registry.
//!
//! 编译器驱动把配置文件里的 `(诊断码, 文件, 行区间)` 三元组登记到这里,
//! 词法层为每个源位置调用 [`DiagConfig::apply_ignores`] 把命中的诊断码
//! 关掉. 与优化 pass 正交, 只是共享同一个编译器外壳.

use bitflags::bitflags;

use crate::SymbolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagCode {
    Width,
    Unused,
    UnoptFlat,
    CaseIncomplete,
    Implicit,
}

impl DiagCode {
    pub fn mask(self) -> DiagMask {
        match self {
            DiagCode::Width => DiagMask::WIDTH,
            DiagCode::Unused => DiagMask::UNUSED,
            DiagCode::UnoptFlat => DiagMask::UNOPTFLAT,
            DiagCode::CaseIncomplete => DiagMask::CASE_INCOMPLETE,
            DiagCode::Implicit => DiagMask::IMPLICIT,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DiagMask: u32 {
        const WIDTH           = 1 << 0;
        const UNUSED          = 1 << 1;
        const UNOPTFLAT       = 1 << 2;
        const CASE_INCOMPLETE = 1 << 3;
        const IMPLICIT        = 1 << 4;
    }
}

/// Source position a diagnostic is reported against, with the set of codes
/// suppressed at that position.
#[derive(Debug, Clone)]
pub struct FileLine {
    pub filename: SymbolStr,
    pub lineno: u32,
    suppressed: DiagMask,
}

impl FileLine {
    pub fn new(filename: impl Into<SymbolStr>, lineno: u32) -> Self {
        Self { filename: filename.into(), lineno, suppressed: DiagMask::empty() }
    }

    pub fn suppress(&mut self, code: DiagCode) {
        self.suppressed |= code.mask();
    }
    pub fn is_suppressed(&self, code: DiagCode) -> bool {
        self.suppressed.contains(code.mask())
    }
}

#[derive(Debug, Clone)]
struct IgnoreRule {
    code: DiagCode,
    filename: SymbolStr,
    /// 起始行 (含).
    min: u32,
    /// 结束行 (含); 0 表示直到文件末尾.
    max: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DiagConfig {
    ignores: Vec<IgnoreRule>,
}

impl DiagConfig {
    pub fn new() -> Self {
        Self { ignores: Vec::new() }
    }

    pub fn add_ignore(
        &mut self,
        code: DiagCode,
        filename: impl Into<SymbolStr>,
        min: u32,
        max: u32,
    ) {
        self.ignores.push(IgnoreRule { code, filename: filename.into(), min, max });
    }

    /// 把所有命中 `fl` 位置的规则应用上去.
    pub fn apply_ignores(&self, fl: &mut FileLine) {
        for rule in &self.ignores {
            if rule.filename != fl.filename {
                continue;
            }
            if fl.lineno < rule.min {
                continue;
            }
            if rule.max != 0 && fl.lineno > rule.max {
                continue;
            }
            fl.suppress(rule.code);
        }
    }
}
