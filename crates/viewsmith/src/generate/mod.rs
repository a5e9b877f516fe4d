//! Python code generation: the init module and the view module.
//!
//! Consumes the refined table read-only. All iteration runs over vectors in
//! first-seen order, so a given input produces byte-identical output on
//! every run.

pub mod cursor;
pub mod init;
pub mod view;
pub mod views;

use crate::Params;
use crate::error::Result;
use crate::refine::RefinedTable;
use crate::table::ClassInfo;

/// The two generated artifacts, each a complete Python module.
#[derive(Debug, Clone)]
pub struct Generated {
    pub init_module: String,
    pub view_module: String,
}

pub fn generate(
    refined: &RefinedTable,
    classes: &[ClassInfo],
    source_files: &[String],
    params: &Params,
) -> Result<Generated> {
    let plan = views::partition(classes, params);
    let plan = views::prune_unresolved(plan, classes)?;

    let init_module = init::render(&plan, classes, source_files, params)?;
    let view_module = view::render(refined, &plan, params);

    Ok(Generated {
        init_module,
        view_module,
    })
}

// ---------------------------------------------------------------------------
// Emission helpers shared by init.rs and view.rs
// ---------------------------------------------------------------------------

/// Line-oriented Python writer with block indentation.
pub(crate) struct PyWriter {
    buf: String,
    depth: usize,
}

impl PyWriter {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            depth: 0,
        }
    }

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str("    ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Quote a string as a single-quoted Python literal.
pub(crate) fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
