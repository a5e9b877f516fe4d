//! viewsmith: synthesize a tkinter GUI from plain Python MVC source.
//!
//! Three stages, each running exactly once per corpus:
//! 1. [`scan`]: parse the source with tree-sitter and flatten classes,
//!    methods, arguments and returns into a feature table.
//! 2. [`classify`]: predict one control kind per argument/return row,
//!    through a substitutable [`classify::WidgetClassifier`].
//! 3. [`refine`] + [`generate`]: annotate and narrow the table, then emit
//!    the init module and the view module as Python source.

pub mod classify;
pub mod error;
pub mod generate;
pub mod locale;
pub mod refine;
pub mod scan;
pub mod table;

pub use classify::{ExternalClassifier, HeuristicClassifier, WidgetClassifier, WidgetKind};
pub use error::{Error, LayoutError, Result, StructuralError, SyntaxError};
pub use generate::Generated;
pub use refine::RefinedTable;
pub use table::{FeatureTable, ScanOutcome};

/// Everything the pipeline is parameterized on. One instance per run.
#[derive(Debug, Clone)]
pub struct Params {
    /// Class name of the controller owning the root window. Required.
    pub main_controller: String,
    /// Window title of the generated root view.
    pub title: String,
    /// Body of the Help/About dialog.
    pub about: String,
    /// Controller count above which the view layer splits into satellites.
    pub view_threshold: usize,
    /// Control count above which a method pops out into its own window.
    pub window_threshold: usize,
    /// Display Model attribute passthroughs as read-only controls.
    pub show_model_attrs: bool,
    /// Drop methods whose only effect is returning one Model attribute.
    pub hide_model_attr_methods: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            main_controller: String::new(),
            title: String::new(),
            about: String::new(),
            view_threshold: 3,
            window_threshold: 5,
            show_model_attrs: false,
            hide_model_attr_methods: false,
        }
    }
}

/// Collect a source corpus from a directory: every `*.py` except previously
/// generated artifacts, concatenated in sorted filename order so a given
/// directory always yields the same corpus. Returns the concatenated source
/// and the module names for the generated imports.
pub fn load_sources(dir: &std::path::Path) -> Result<(String, Vec<String>)> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::Other(format!("failed to read {}: {e}", dir.display())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::Other(format!("failed to read {}: {e}", dir.display())))?
            .path();
        let is_py = path.extension().is_some_and(|e| e == "py");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if is_py && name != "main.py" && name != "view.py" {
            paths.push(path);
        }
    }
    paths.sort();

    let mut source = String::new();
    let mut files = Vec::new();
    for path in &paths {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Other(format!("failed to read {}: {e}", path.display())))?;
        source.push_str(&text);
        if !text.ends_with('\n') {
            source.push('\n');
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push(stem.to_string());
        }
    }

    Ok((source, files))
}

/// Run the whole pipeline over one source corpus.
///
/// `source` is the concatenated Python source; `source_files` the module
/// names (without extension) the generated init module must import from.
pub fn run_pipeline(
    source: &str,
    source_files: &[String],
    params: &Params,
    classifier: &dyn WidgetClassifier,
) -> Result<Generated> {
    let outcome = scan::scan(source)?;
    tracing::debug!(
        classes = outcome.classes.len(),
        rows = outcome.table.rows.len(),
        "scan complete"
    );

    let vectors = classify::feature_vectors(&outcome.table);
    let kinds = classifier.predict(&vectors)?;
    tracing::debug!(predictions = kinds.len(), "classification complete");

    let refined = refine::refine(outcome.table, &outcome.classes, &kinds, params)?;
    tracing::debug!(locale = refined.locale.code(), "refinement complete");

    generate::generate(&refined, &outcome.classes, source_files, params)
}
