//! The generated view module (`view.py`).
//!
//! One Python class per planned view. The root view owns the `Tk()` root and
//! the menu bar; satellites are lazily created `Toplevel`s shown from the
//! root's menu. Every method of a fronted controller becomes either an
//! inline `LabelFrame`, a popup window, or a menu action, as decided by the
//! refiner. Handlers read the widgets back, validate, and call the
//! controller.

use crate::Params;
use crate::classify::WidgetKind;
use crate::generate::cursor::Cursor;
use crate::generate::views::{ViewPlan, ViewSpec, view_var};
use crate::generate::{PyWriter, py_str};
use crate::locale::Locale;
use crate::refine::RefinedTable;
use crate::table::*;

pub fn render(refined: &RefinedTable, plan: &ViewPlan, params: &Params) -> String {
    let locale = refined.locale;
    let mut w = PyWriter::new();

    w.line("from tkinter import *");
    w.line("from tkinter import ttk, messagebox");
    w.blank();

    if has_password_rows(refined) {
        emit_password_helper(&mut w);
        w.blank();
    }

    for view in &plan.views {
        render_view(&mut w, refined, plan, view, params, locale);
    }

    w.finish()
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// A `LabelFrame` in the view body.
    Inline,
    /// Launched from a body button into its own `Toplevel`.
    Window,
    /// A direct menu command (zero arguments, zero returns).
    MenuAction,
    /// A menu command opening a popup window.
    MenuPopup,
}

fn placement(m: &MethodRow) -> Placement {
    match (m.menu, m.window) {
        (true, true) => Placement::MenuPopup,
        (true, false) => Placement::MenuAction,
        (false, true) => Placement::Window,
        (false, false) => Placement::Inline,
    }
}

/// Which menu a popup action or satellite launcher lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Args,
    Returns,
    Mixed,
}

fn method_shape(m: &MethodRow) -> Shape {
    match (m.arguments.is_empty(), m.return_values.is_empty()) {
        (false, true) => Shape::Args,
        (true, false) => Shape::Returns,
        _ => Shape::Mixed,
    }
}

fn view_methods<'a>(refined: &'a RefinedTable, view: &ViewSpec) -> Vec<&'a MethodRow> {
    refined
        .rows
        .iter()
        .filter_map(FeatureRow::as_method)
        .filter(|m| m.exposed && view.controllers.contains(&m.class_name))
        .collect()
}

// ---------------------------------------------------------------------------
// Row lookup and naming
// ---------------------------------------------------------------------------

fn first_owner(belongs_to: &str) -> &str {
    belongs_to.split(',').next().unwrap_or(belongs_to)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn arg_suffix(a: &ArgumentRow) -> String {
    format!("{}_{}", first_owner(&a.belongs_to), sanitize(&a.name))
}

fn ret_suffix(r: &ReturnValueRow) -> String {
    format!("{}_{}", first_owner(&r.belongs_to), sanitize(&r.name))
}

/// Argument rows rendered inside this method's own frame (the method is the
/// row's first owner; shared rows render once, at their first owner).
fn owned_arg_rows<'a>(refined: &'a RefinedTable, m: &MethodRow) -> Vec<&'a ArgumentRow> {
    refined
        .rows
        .iter()
        .filter_map(|r| match r {
            FeatureRow::Argument(a)
                if a.class_name == m.class_name && first_owner(&a.belongs_to) == m.name =>
            {
                Some(a)
            }
            _ => None,
        })
        .collect()
}

fn owned_return_rows<'a>(refined: &'a RefinedTable, m: &MethodRow) -> Vec<&'a ReturnValueRow> {
    refined
        .rows
        .iter()
        .filter_map(|r| match r {
            FeatureRow::Return(rv)
                if rv.class_name == m.class_name && first_owner(&rv.belongs_to) == m.name =>
            {
                Some(rv)
            }
            _ => None,
        })
        .collect()
}

/// The row backing one declared argument, wherever it is rendered.
fn arg_row<'a>(refined: &'a RefinedTable, class: &str, method: &str, arg: &str) -> Option<&'a ArgumentRow> {
    refined.rows.iter().find_map(|r| match r {
        FeatureRow::Argument(a)
            if a.class_name == class
                && a.name == arg
                && a.belongs_to.split(',').any(|b| b == method) =>
        {
            Some(a)
        }
        _ => None,
    })
}

fn return_row<'a>(
    refined: &'a RefinedTable,
    class: &str,
    method: &str,
    name: &str,
) -> Option<&'a ReturnValueRow> {
    refined.rows.iter().find_map(|r| match r {
        FeatureRow::Return(rv)
            if rv.class_name == class
                && rv.name == name
                && rv.belongs_to.split(',').any(|b| b == method) =>
        {
            Some(rv)
        }
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Password entries
// ---------------------------------------------------------------------------

const PASSWORD_MARKERS: &[&str] = &["password", "passwd", "contrasenya", "contrasena", "contraseña"];

fn is_password(a: &ArgumentRow) -> bool {
    if !matches!(a.widget, None | Some(WidgetKind::Entry)) {
        return false;
    }
    let lowered = a.name.to_lowercase();
    PASSWORD_MARKERS.iter().any(|m| lowered.contains(m))
}

fn has_password_rows(refined: &RefinedTable) -> bool {
    refined.rows.iter().any(|r| match r {
        FeatureRow::Argument(a) => is_password(a),
        _ => false,
    })
}

fn emit_password_helper(w: &mut PyWriter) {
    w.line("def _password_ok(value):");
    w.indent();
    w.line("if len(value) < 14:");
    w.indent();
    w.line("return False");
    w.dedent();
    w.line("has_upper = any(c.isupper() for c in value)");
    w.line("has_lower = any(c.islower() for c in value)");
    w.line("has_digit = any(c.isdigit() for c in value)");
    w.line("has_symbol = any(not c.isalnum() for c in value)");
    w.line("return has_upper and has_lower and has_digit and has_symbol");
    w.dedent();
}

// ---------------------------------------------------------------------------
// Per-view rendering
// ---------------------------------------------------------------------------

/// Companion methods a widget needs besides its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Helper {
    ToggleMask(String),
    TreeTools(String),
}

fn push_helper(helpers: &mut Vec<Helper>, helper: Helper) {
    if !helpers.contains(&helper) {
        helpers.push(helper);
    }
}

fn render_view(
    w: &mut PyWriter,
    refined: &RefinedTable,
    plan: &ViewPlan,
    view: &ViewSpec,
    params: &Params,
    locale: Locale,
) {
    let methods = view_methods(refined, view);
    let parent = if view.main { "self.root" } else { "self.top" };
    let deps = view.dependency_vars();
    let title = if view.main {
        if params.title.is_empty() {
            humanize(&snake_case(&params.main_controller))
        } else {
            params.title.clone()
        }
    } else {
        humanize(&snake_case(&view.controllers[0]))
    };

    w.line(&format!("class {}:", view.name));
    w.indent();

    // Constructor.
    let ctor_params: String = deps.iter().map(|d| format!(", {d}")).collect();
    w.line(&format!("def __init__(self{ctor_params}):"));
    w.indent();
    for dep in &deps {
        w.line(&format!("self.{dep} = {dep}"));
    }
    if view.main {
        w.line("self.root = Tk()");
        w.line(&format!("self.root.title({})", py_str(&title)));
        w.line("self._build_menu()");
        w.line("self._build_body()");
    } else {
        // Created lazily: the Tk root does not exist yet when the init
        // module constructs satellites.
        w.line("self.top = None");
    }
    w.dedent();
    w.blank();

    if view.main {
        w.line("def run(self):");
        w.indent();
        w.line("self.root.mainloop()");
        w.dedent();
        w.blank();
        render_menu(w, plan, view, &methods, locale, refined);
        w.blank();
    } else {
        w.line("def show(self):");
        w.indent();
        w.line("if self.top is None:");
        w.indent();
        w.line("self.top = Toplevel()");
        w.line(&format!("self.top.title({})", py_str(&title)));
        w.line("self._build_body()");
        w.dedent();
        w.line("self.top.deiconify()");
        w.dedent();
        w.blank();
    }

    let mut helpers: Vec<Helper> = Vec::new();
    render_body(w, refined, view, &methods, parent, locale, &mut helpers);

    for m in &methods {
        if matches!(placement(m), Placement::Window | Placement::MenuPopup) {
            w.blank();
            render_popup(w, refined, m, locale, &mut helpers);
        }
    }

    let helpers = helpers; // fixed from here on
    for helper in &helpers {
        w.blank();
        render_helper(w, helper);
    }

    for m in &methods {
        w.blank();
        render_handler(w, refined, m, locale);
    }

    if view.main {
        w.blank();
        w.line("def show_about(self):");
        w.indent();
        let about = if params.about.is_empty() {
            title.clone()
        } else {
            params.about.clone()
        };
        w.line(&format!(
            "messagebox.showinfo({}, {})",
            py_str(&title),
            py_str(&about)
        ));
        w.dedent();
    }

    w.dedent();
    w.blank();
}

// ---------------------------------------------------------------------------
// Menu bar
// ---------------------------------------------------------------------------

fn render_menu(
    w: &mut PyWriter,
    plan: &ViewPlan,
    view: &ViewSpec,
    methods: &[&MethodRow],
    locale: Locale,
    refined: &RefinedTable,
) {
    w.line("def _build_menu(self):");
    w.indent();
    w.line("menubar = Menu(self.root)");

    // File: direct actions, then Exit.
    w.line("file_menu = Menu(menubar, tearoff=0)");
    let mut had_action = false;
    for m in methods {
        if placement(m) == Placement::MenuAction {
            had_action = true;
            w.line(&format!(
                "file_menu.add_command(label={}, command=self.on_{})",
                py_str(&m.label),
                m.name
            ));
        }
    }
    if had_action {
        w.line("file_menu.add_separator()");
    }
    w.line(&format!(
        "file_menu.add_command(label={}, command=self.root.destroy)",
        py_str(locale.menu_exit())
    ));
    w.line(&format!(
        "menubar.add_cascade(label={}, menu=file_menu)",
        py_str(locale.menu_file())
    ));

    // Edit / View / Others: popup actions and satellite launchers, sorted
    // into the menu matching their argument/return shape.
    let mut edit: Vec<(String, String)> = Vec::new();
    let mut view_items: Vec<(String, String)> = Vec::new();
    let mut others: Vec<(String, String)> = Vec::new();

    for m in methods {
        if placement(m) == Placement::MenuPopup {
            let item = (m.label.clone(), format!("self.open_{}", m.name));
            match method_shape(m) {
                Shape::Args => edit.push(item),
                Shape::Returns => view_items.push(item),
                Shape::Mixed => others.push(item),
            }
        }
    }

    for satellite in &view.satellites {
        let Some(spec) = plan.views.iter().find(|v| &v.name == satellite) else {
            continue;
        };
        let label = humanize(&snake_case(&spec.controllers[0]));
        let item = (label, format!("self.{}.show", view_var(satellite)));
        match satellite_shape(refined, spec) {
            Shape::Args => edit.push(item),
            Shape::Returns => view_items.push(item),
            Shape::Mixed => others.push(item),
        }
    }

    let cascades = [
        ("edit_menu", locale.menu_edit(), edit),
        ("view_menu", locale.menu_view(), view_items),
        ("others_menu", locale.menu_others(), others),
    ];
    for (var, label, items) in &cascades {
        if items.is_empty() {
            continue;
        }
        w.line(&format!("{var} = Menu(menubar, tearoff=0)"));
        for (item_label, command) in items {
            w.line(&format!(
                "{var}.add_command(label={}, command={command})",
                py_str(item_label)
            ));
        }
        w.line(&format!(
            "menubar.add_cascade(label={}, menu={var})",
            py_str(label)
        ));
    }

    // Help.
    w.line("help_menu = Menu(menubar, tearoff=0)");
    w.line(&format!(
        "help_menu.add_command(label={}, command=self.show_about)",
        py_str(locale.menu_about())
    ));
    w.line(&format!(
        "menubar.add_cascade(label={}, menu=help_menu)",
        py_str(locale.menu_help())
    ));
    w.line("self.root.config(menu=menubar)");
    w.dedent();
}

/// Uniform shape of a satellite's body methods; mixed shapes (or none) go
/// to the Others menu.
fn satellite_shape(refined: &RefinedTable, spec: &ViewSpec) -> Shape {
    let shapes: Vec<Shape> = view_methods(refined, spec)
        .iter()
        .filter(|m| matches!(placement(m), Placement::Inline | Placement::Window))
        .map(|m| method_shape(m))
        .collect();
    match shapes.split_first() {
        Some((first, rest)) if rest.iter().all(|s| s == first) && *first != Shape::Mixed => *first,
        _ => Shape::Mixed,
    }
}

// ---------------------------------------------------------------------------
// Body and frames
// ---------------------------------------------------------------------------

fn render_body(
    w: &mut PyWriter,
    refined: &RefinedTable,
    view: &ViewSpec,
    methods: &[&MethodRow],
    parent: &str,
    locale: Locale,
    helpers: &mut Vec<Helper>,
) {
    w.line("def _build_body(self):");
    w.indent();

    let mut cur = Cursor::new();
    let mut emitted = false;
    for m in methods {
        match placement(m) {
            Placement::Inline => {
                emitted = true;
                render_frame(w, &mut cur, refined, m, parent, locale, helpers);
            }
            Placement::Window => {
                emitted = true;
                let slot = cur.next_frame();
                w.line(&format!(
                    "Button({parent}, text={}, command=self.open_{}).grid(row={slot}, column=0, padx=8, pady=4, sticky='w')",
                    py_str(&m.label),
                    m.name
                ));
            }
            // Satellites have no menu bar; their menu actions become plain
            // buttons.
            Placement::MenuAction if !view.main => {
                emitted = true;
                let slot = cur.next_frame();
                w.line(&format!(
                    "Button({parent}, text={}, command=self.on_{}).grid(row={slot}, column=0, padx=8, pady=4, sticky='w')",
                    py_str(&m.label),
                    m.name
                ));
            }
            _ => {}
        }
    }
    if !emitted {
        w.line("pass");
    }
    w.dedent();
}

fn render_frame(
    w: &mut PyWriter,
    cur: &mut Cursor,
    refined: &RefinedTable,
    m: &MethodRow,
    parent: &str,
    locale: Locale,
    helpers: &mut Vec<Helper>,
) {
    let slot = cur.next_frame();
    let frame = format!("frame_{slot}");
    w.line(&format!(
        "{frame} = LabelFrame({parent}, text={})",
        py_str(&m.label)
    ));
    w.line(&format!(
        "{frame}.grid(row={slot}, column=0, padx=8, pady=4, sticky='nsew')"
    ));
    let rows = emit_method_controls(w, cur, refined, m, &frame, locale, helpers);
    w.line(&format!(
        "Button({frame}, text={}, command=self.on_{}).grid(row=0, column=2, rowspan={}, padx=6, sticky='ns')",
        py_str(&m.label),
        m.name,
        rows.max(1)
    ));
}

fn render_popup(
    w: &mut PyWriter,
    refined: &RefinedTable,
    m: &MethodRow,
    locale: Locale,
    helpers: &mut Vec<Helper>,
) {
    w.line(&format!("def open_{}(self):", m.name));
    w.indent();
    w.line("top = Toplevel()");
    w.line(&format!("top.title({})", py_str(&m.label)));
    w.line(&format!("frame = LabelFrame(top, text={})", py_str(&m.label)));
    w.line("frame.grid(row=0, column=0, padx=8, pady=4, sticky='nsew')");

    let mut cur = Cursor::new();
    cur.next_frame();
    let rows = emit_method_controls(w, &mut cur, refined, m, "frame", locale, helpers);
    w.line(&format!(
        "Button(frame, text={}, command=self.on_{}).grid(row=0, column=2, rowspan={}, padx=6, sticky='ns')",
        py_str(&m.label),
        m.name,
        rows.max(1)
    ));
    w.dedent();
}

/// Emit this method's argument and return controls into the open frame.
/// Returns the number of grid rows claimed.
fn emit_method_controls(
    w: &mut PyWriter,
    cur: &mut Cursor,
    refined: &RefinedTable,
    m: &MethodRow,
    frame: &str,
    locale: Locale,
    helpers: &mut Vec<Helper>,
) -> usize {
    for a in owned_arg_rows(refined, m) {
        emit_arg(w, cur, frame, a, locale, helpers);
    }
    for r in owned_return_rows(refined, m) {
        emit_return(w, cur, frame, r);
    }
    cur.rows_used()
}

// ---------------------------------------------------------------------------
// Widget emission
// ---------------------------------------------------------------------------

fn label_cell(w: &mut PyWriter, frame: &str, text: &str, row: usize) {
    w.line(&format!(
        "Label({frame}, text={}).grid(row={row}, column=0, sticky='w', padx=4, pady=2)",
        py_str(text)
    ));
}

fn choices(a: &ArgumentRow) -> Vec<&str> {
    a.possible_values.split(',').filter(|c| !c.is_empty()).collect()
}

/// A choice as a Python literal of the argument's type.
fn choice_literal(ty: PyType, raw: &str) -> String {
    if ty.is_numeric() || ty == PyType::Bool {
        raw.to_string()
    } else {
        py_str(raw)
    }
}

/// A scanned default rendered as the text a free-typed widget starts with.
fn default_text(default: &Option<DefaultValue>) -> Option<String> {
    match default {
        Some(DefaultValue::Str(s)) => Some(py_str(s)),
        Some(DefaultValue::None) | None => None,
        Some(other) => Some(py_str(&other.to_python())),
    }
}

fn bound_literal(ty: PyType, v: f64) -> String {
    if ty == PyType::Int {
        format!("{}", v as i64)
    } else if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn emit_arg(
    w: &mut PyWriter,
    cur: &mut Cursor,
    frame: &str,
    a: &ArgumentRow,
    locale: Locale,
    helpers: &mut Vec<Helper>,
) {
    let suffix = arg_suffix(a);
    let kind = a.widget.unwrap_or(WidgetKind::Entry);
    match kind {
        WidgetKind::Entry | WidgetKind::Label => {
            let row = cur.place();
            label_cell(w, frame, &a.description, row);
            if is_password(a) {
                w.line(&format!("self.{suffix} = Entry({frame}, show='*')"));
                w.line(&format!("self.{suffix}.grid(row={row}, column=1, padx=4, pady=2)"));
                let mask_row = cur.place();
                w.line(&format!("self.{suffix}_mask = BooleanVar(value=True)"));
                w.line(&format!(
                    "Checkbutton({frame}, text={}, variable=self.{suffix}_mask, command=self.toggle_{suffix}).grid(row={mask_row}, column=1, sticky='w', padx=4)",
                    py_str(locale.mask_password())
                ));
                push_helper(helpers, Helper::ToggleMask(suffix));
            } else {
                w.line(&format!("self.{suffix} = Entry({frame})"));
                w.line(&format!("self.{suffix}.grid(row={row}, column=1, padx=4, pady=2)"));
                if let Some(text) = default_text(&a.default) {
                    w.line(&format!("self.{suffix}.insert(0, {text})"));
                }
            }
        }
        WidgetKind::Checkbutton => {
            let row = cur.place();
            label_cell(w, frame, &a.description, row);
            if matches!(a.default, Some(DefaultValue::Bool(true))) {
                w.line(&format!("self.{suffix}_var = BooleanVar(value=True)"));
            } else {
                w.line(&format!("self.{suffix}_var = BooleanVar()"));
            }
            w.line(&format!(
                "Checkbutton({frame}, variable=self.{suffix}_var).grid(row={row}, column=1, sticky='w', padx=4, pady=2)"
            ));
        }
        WidgetKind::Radiobutton => {
            let all = choices(a);
            // A defaulted choice starts selected; otherwise the first one.
            let initial = match &a.default {
                Some(DefaultValue::Str(s)) if all.contains(&s.as_str()) => s.as_str(),
                _ => all.first().copied().unwrap_or(""),
            };
            let mut first = true;
            w.line(&format!(
                "self.{suffix}_var = StringVar(value={})",
                py_str(initial)
            ));
            for choice in all {
                let row = cur.place();
                if first {
                    label_cell(w, frame, &a.description, row);
                    first = false;
                }
                w.line(&format!(
                    "Radiobutton({frame}, text={text}, value={text}, variable=self.{suffix}_var).grid(row={row}, column=1, sticky='w', padx=4)",
                    text = py_str(choice)
                ));
            }
        }
        WidgetKind::Listbox => {
            let row = cur.place();
            label_cell(w, frame, &a.description, row);
            w.line(&format!(
                "self.{suffix} = Listbox({frame}, height=4, exportselection=False)"
            ));
            w.line(&format!(
                "self.{suffix}.grid(row={row}, column=1, rowspan=2, padx=4, pady=2)"
            ));
            for choice in choices(a) {
                w.line(&format!("self.{suffix}.insert(END, {})", py_str(choice)));
            }
            cur.skip(1);
        }
        WidgetKind::Scale => {
            let row = cur.place();
            label_cell(w, frame, &a.description, row);
            let (lo, hi) = if has_lower_bound(a.lower) && has_upper_bound(a.upper) {
                (bound_literal(a.ty, a.lower), bound_literal(a.ty, a.upper))
            } else {
                ("0".to_string(), "100".to_string())
            };
            let resolution = if a.ty == PyType::Float {
                ", resolution=0.01"
            } else {
                ""
            };
            w.line(&format!(
                "self.{suffix} = Scale({frame}, from_={lo}, to={hi}, orient='horizontal'{resolution})"
            ));
            w.line(&format!("self.{suffix}.grid(row={row}, column=1, padx=4, pady=2)"));
            match &a.default {
                Some(d @ (DefaultValue::Int(_) | DefaultValue::Float(_))) => {
                    w.line(&format!("self.{suffix}.set({})", d.to_python()));
                }
                _ => {}
            }
        }
        WidgetKind::Spinbox => {
            let row = cur.place();
            label_cell(w, frame, &a.description, row);
            let lo = if has_lower_bound(a.lower) {
                bound_literal(a.ty, a.lower)
            } else {
                "-1000000".to_string()
            };
            let hi = if has_upper_bound(a.upper) {
                bound_literal(a.ty, a.upper)
            } else {
                "1000000".to_string()
            };
            w.line(&format!("self.{suffix} = Spinbox({frame}, from_={lo}, to={hi})"));
            w.line(&format!("self.{suffix}.grid(row={row}, column=1, padx=4, pady=2)"));
            if let Some(text) = default_text(&a.default) {
                w.line(&format!("self.{suffix}.delete(0, END)"));
                w.line(&format!("self.{suffix}.insert(0, {text})"));
            }
        }
        WidgetKind::Treeview => {
            let row = cur.place();
            label_cell(w, frame, &a.description, row);
            w.line(&format!(
                "self.{suffix} = ttk.Treeview({frame}, height=3, show='tree')"
            ));
            w.line(&format!(
                "self.{suffix}.grid(row={row}, column=1, rowspan=2, padx=4, pady=2)"
            ));
            cur.skip(1);
            let tools_row = cur.place();
            w.line(&format!("{suffix}_tools = Frame({frame})"));
            w.line(&format!(
                "{suffix}_tools.grid(row={tools_row}, column=0, columnspan=2, sticky='w', padx=4)"
            ));
            w.line(&format!("self.{suffix}_entry = Entry({suffix}_tools)"));
            w.line(&format!("self.{suffix}_entry.pack(side='left')"));
            w.line(&format!(
                "Button({suffix}_tools, text='+', command=self.add_{suffix}).pack(side='left', padx=2)"
            ));
            w.line(&format!(
                "Button({suffix}_tools, text='-', command=self.remove_{suffix}).pack(side='left')"
            ));
            push_helper(helpers, Helper::TreeTools(suffix));
        }
    }
}

fn emit_return(w: &mut PyWriter, cur: &mut Cursor, frame: &str, r: &ReturnValueRow) {
    let suffix = ret_suffix(r);
    match r.widget {
        Some(WidgetKind::Treeview) => {
            let row = cur.place();
            label_cell(w, frame, &r.description, row);
            w.line(&format!(
                "self.{suffix} = ttk.Treeview({frame}, height=3, show='tree')"
            ));
            w.line(&format!(
                "self.{suffix}.grid(row={row}, column=1, rowspan=3, padx=4, pady=2)"
            ));
            cur.skip(2);
        }
        _ => {
            let row = cur.place();
            label_cell(w, frame, &r.description, row);
            w.line(&format!("self.{suffix} = Label({frame}, text='')"));
            w.line(&format!(
                "self.{suffix}.grid(row={row}, column=1, sticky='w', padx=4, pady=2)"
            ));
        }
    }
}

fn render_helper(w: &mut PyWriter, helper: &Helper) {
    match helper {
        Helper::ToggleMask(suffix) => {
            w.line(&format!("def toggle_{suffix}(self):"));
            w.indent();
            w.line(&format!(
                "self.{suffix}.config(show='*' if self.{suffix}_mask.get() else '')"
            ));
            w.dedent();
        }
        Helper::TreeTools(suffix) => {
            w.line(&format!("def add_{suffix}(self):"));
            w.indent();
            w.line(&format!("value = self.{suffix}_entry.get()"));
            w.line("if value:");
            w.indent();
            w.line(&format!("self.{suffix}.insert('', END, text=value)"));
            w.line(&format!("self.{suffix}_entry.delete(0, END)"));
            w.dedent();
            w.dedent();
            w.blank();
            w.line(&format!("def remove_{suffix}(self):"));
            w.indent();
            w.line(&format!("for item in self.{suffix}.selection():"));
            w.indent();
            w.line(&format!("self.{suffix}.delete(item)"));
            w.dedent();
            w.dedent();
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn cast_fn(ty: PyType) -> Option<&'static str> {
    match ty {
        PyType::Int => Some("int"),
        PyType::Float => Some("float"),
        PyType::Complex => Some("complex"),
        _ => None,
    }
}

fn render_handler(w: &mut PyWriter, refined: &RefinedTable, m: &MethodRow, locale: Locale) {
    w.line(&format!("def on_{}(self):", m.name));
    w.indent();

    let controller = snake_case(&m.class_name);
    let mut call_args: Vec<String> = Vec::new();
    let mut validated: Vec<(&ArgumentRow, String)> = Vec::new();

    for (arg_name, ty) in &m.arguments {
        match arg_row(refined, &m.class_name, &m.name, arg_name) {
            Some(a) => {
                let local = sanitize(arg_name);
                emit_read(w, a, &local);
                validated.push((a, local.clone()));
                call_args.push(local);
            }
            // Truncated past the arity cap: pass the type's zero value.
            None => call_args.push(ty.zero_literal().to_string()),
        }
    }

    for (a, local) in &validated {
        emit_validation(w, a, local, locale);
    }

    let call = format!("self.{controller}.{}({})", m.name, call_args.join(", "));

    let assignments: Vec<(usize, &ReturnValueRow)> = m
        .return_values
        .iter()
        .enumerate()
        .filter_map(|(i, (name, _))| {
            return_row(refined, &m.class_name, &m.name, name).map(|r| (i, r))
        })
        .collect();

    if assignments.is_empty() {
        w.line(&call);
    } else {
        w.line(&format!("result = {call}"));
        let tuple = matches!(m.returns, ReturnSignature::Tuple(_));
        for (i, r) in assignments {
            let expr = if tuple {
                format!("result[{i}]")
            } else {
                "result".to_string()
            };
            emit_assign(w, r, &expr);
        }
    }

    w.dedent();
}

fn emit_read(w: &mut PyWriter, a: &ArgumentRow, local: &str) {
    let suffix = arg_suffix(a);
    let kind = a.widget.unwrap_or(WidgetKind::Entry);
    let cast = cast_fn(a.ty);
    let wrap = |expr: String| match cast {
        Some(f) => format!("{f}({expr})"),
        None => expr,
    };

    match kind {
        WidgetKind::Entry | WidgetKind::Label => {
            w.line(&format!("{local} = {}", wrap(format!("self.{suffix}.get()"))));
        }
        WidgetKind::Checkbutton => {
            w.line(&format!("{local} = self.{suffix}_var.get()"));
        }
        WidgetKind::Radiobutton => {
            w.line(&format!(
                "{local} = {}",
                wrap(format!("self.{suffix}_var.get()"))
            ));
        }
        WidgetKind::Listbox => {
            w.line(&format!("{local}_sel = self.{suffix}.curselection()"));
            w.line(&format!(
                "{local} = {} if {local}_sel else {}",
                wrap(format!("self.{suffix}.get({local}_sel[0])")),
                a.ty.zero_literal()
            ));
        }
        WidgetKind::Scale => {
            w.line(&format!("{local} = self.{suffix}.get()"));
        }
        WidgetKind::Spinbox => {
            w.line(&format!("{local} = {}", wrap(format!("self.{suffix}.get()"))));
        }
        WidgetKind::Treeview => {
            w.line(&format!(
                "{local} = [self.{suffix}.item(i, 'text') for i in self.{suffix}.get_children()]"
            ));
        }
    }
}

fn emit_validation(w: &mut PyWriter, a: &ArgumentRow, local: &str, locale: Locale) {
    let title = py_str(locale.invalid_input_title());
    let kind = a.widget.unwrap_or(WidgetKind::Entry);

    // Spinbox entries are free-typed; re-check the asserted range.
    if kind == WidgetKind::Spinbox && has_lower_bound(a.lower) && has_upper_bound(a.upper) {
        let lo = bound_literal(a.ty, a.lower);
        let hi = bound_literal(a.ty, a.upper);
        w.line(&format!("if {local} < {lo} or {local} > {hi}:"));
        w.indent();
        w.line(&format!(
            "messagebox.showerror({title}, {})",
            py_str(&locale.msg_range(&a.label, a.lower, a.upper))
        ));
        w.line("return");
        w.dedent();
    }

    if !a.possible_values.is_empty() && kind != WidgetKind::Scale {
        let literals: Vec<String> = choices(a)
            .iter()
            .map(|c| choice_literal(a.ty, c))
            .collect();
        w.line(&format!("if {local} not in [{}]:", literals.join(", ")));
        w.indent();
        w.line(&format!(
            "messagebox.showerror({title}, {})",
            py_str(&locale.msg_choices(&a.label, &a.possible_values))
        ));
        w.line("return");
        w.dedent();
    }

    if is_password(a) {
        w.line(&format!("if not _password_ok({local}):"));
        w.indent();
        w.line(&format!(
            "messagebox.showerror({title}, {})",
            py_str(locale.msg_password())
        ));
        w.line("return");
        w.dedent();
    }
}

fn emit_assign(w: &mut PyWriter, r: &ReturnValueRow, expr: &str) {
    let suffix = ret_suffix(r);
    if r.widget == Some(WidgetKind::Treeview) {
        w.line(&format!("self.{suffix}.delete(*self.{suffix}.get_children())"));
        w.line(&format!("for item in {expr}:"));
        w.indent();
        w.line(&format!("self.{suffix}.insert('', END, text=str(item))"));
        w.dedent();
    } else {
        w.line(&format!("self.{suffix}.config(text=str({expr}))"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{HeuristicClassifier, WidgetClassifier, feature_vectors};
    use crate::generate::views::{partition, prune_unresolved};
    use crate::refine::refine;
    use crate::scan::scan;

    fn rendered(source: &str, params: &Params) -> String {
        let outcome = scan(source).unwrap();
        let kinds = HeuristicClassifier
            .predict(&feature_vectors(&outcome.table))
            .unwrap();
        let refined = refine(outcome.table, &outcome.classes, &kinds, params).unwrap();
        let plan = prune_unresolved(partition(&outcome.classes, params), &outcome.classes).unwrap();
        render(&refined, &plan, params)
    }

    fn params(main: &str) -> Params {
        Params {
            main_controller: main.to_string(),
            ..Params::default()
        }
    }

    const BASE: &str = r#"
class Student:
    def __init__(self, sid: str, name: str):
        self.sid = sid
        self.name = name

    def get_name(self) -> str:
        return self.name

class StudentController:
    def __init__(self, model: Student):
        self.model = model

    def refresh(self):
        pass

    def set_name(self, name: str):
        self.model.name = name

    def get_name(self) -> str:
        return self.model.get_name()
"#;

    #[test]
    fn root_view_owns_tk_and_the_menu_bar() {
        let out = rendered(BASE, &params("StudentController"));
        assert!(out.contains("class View:"));
        assert!(out.contains("self.root = Tk()"));
        assert!(out.contains("def _build_menu(self):"));
        assert!(out.contains("label='Exit', command=self.root.destroy"));
        assert!(out.contains("label='About...', command=self.show_about"));
        assert!(out.contains("label='Refresh', command=self.on_refresh"));
    }

    #[test]
    fn handlers_read_widgets_and_call_the_controller() {
        let out = rendered(BASE, &params("StudentController"));
        assert!(out.contains("def on_set_name(self):"));
        assert!(out.contains("name = self.set_name_name.get()"));
        assert!(out.contains("self.student_controller.set_name(name)"));
    }

    #[test]
    fn visible_model_attrs_render_as_result_labels() {
        let mut p = params("StudentController");
        p.show_model_attrs = true;
        let out = rendered(BASE, &p);
        assert!(out.contains("self.get_name_self_model_get_name = Label("));
        assert!(out.contains("result = self.student_controller.get_name()"));
        assert!(out.contains(".config(text=str(result))"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let p = params("StudentController");
        assert_eq!(rendered(BASE, &p), rendered(BASE, &p));
    }

    #[test]
    fn spinbox_range_checks_are_emitted() {
        let source = r#"
class M:
    def __init__(self, n: int):
        self.n = n

class C:
    def __init__(self, m: M):
        self.m = m

    def resize(self, x: int):
        assert 0 <= x <= 5000
        self.m.n = x
"#;
        let out = rendered(source, &params("C"));
        assert!(out.contains("self.resize_x = Spinbox(frame_0, from_=0, to=5000)"));
        assert!(out.contains("if x < 0 or x > 5000:"));
        assert!(out.contains("messagebox.showerror('Invalid input'"));
    }

    #[test]
    fn password_entries_are_masked_and_checked() {
        let source = r#"
class M:
    def __init__(self, n: int):
        self.n = n

class C:
    def __init__(self, m: M):
        self.m = m

    def login(self, password: str):
        self.m.n = 1
"#;
        let out = rendered(source, &params("C"));
        assert!(out.contains("def _password_ok(value):"));
        assert!(out.contains("self.login_password = Entry(frame_0, show='*')"));
        assert!(out.contains("def toggle_login_password(self):"));
        assert!(out.contains("if not _password_ok(password):"));
    }

    #[test]
    fn choice_arguments_get_membership_checks() {
        let source = r#"
class M:
    def __init__(self, mode: str):
        self.mode = mode

class C:
    def __init__(self, m: M):
        self.m = m

    def set_mode(self, mode: str):
        assert mode in ['fast', 'slow', 'off']
        self.m.mode = mode
"#;
        let out = rendered(source, &params("C"));
        assert!(out.contains("self.set_mode_mode_var = StringVar(value='fast')"));
        assert!(out.contains("if mode not in ['fast', 'slow', 'off']:"));
    }

    #[test]
    fn default_values_prefill_their_widgets() {
        let source = r#"
class M:
    def __init__(self, n: int):
        self.n = n

class C:
    def __init__(self, m: M):
        self.m = m

    def configure(self, name: str = 'anna', level: int = 3, fast: bool = True):
        assert 0 <= level <= 10
        self.m.n = level

    def resize(self, x: int = 7):
        self.m.n = x
"#;
        let out = rendered(source, &params("C"));
        assert!(out.contains("self.configure_name.insert(0, 'anna')"));
        assert!(out.contains("self.configure_level.set(3)"));
        assert!(out.contains("self.configure_fast_var = BooleanVar(value=True)"));
        // Free-typed steppers replace their lower-bound seed text.
        assert!(out.contains("self.resize_x.delete(0, END)"));
        assert!(out.contains("self.resize_x.insert(0, '7')"));
    }

    #[test]
    fn satellites_are_lazy_toplevels_launched_from_the_menu() {
        let source = r#"
class M:
    def __init__(self, n: int):
        self.n = n

class Alpha:
    def __init__(self, m: M):
        self.m = m

    def set_alpha(self, v: int):
        self.m.n = v

class Beta:
    def __init__(self, m: M):
        self.m = m

    def set_beta(self, v: int):
        self.m.n = v

class Gamma:
    def __init__(self, m: M):
        self.m = m

    def set_gamma(self, v: int):
        self.m.n = v

class Delta:
    def __init__(self, m: M):
        self.m = m

    def set_delta(self, v: int):
        self.m.n = v
"#;
        let out = rendered(source, &params("Alpha"));
        assert!(out.contains("class View_B:"));
        assert!(out.contains("def show(self):"));
        assert!(out.contains("self.top = Toplevel()"));
        assert!(out.contains("command=self.view_b.show"));
        // All satellite methods take arguments only, so launchers go to Edit.
        assert!(out.contains("menubar.add_cascade(label='Edit', menu=edit_menu)"));
    }

    #[test]
    fn tuple_returns_index_into_the_result() {
        let source = r#"
class M:
    def __init__(self, n: int):
        self.n = n

class C:
    def __init__(self, m: M):
        self.m = m

    def describe(self) -> tuple[str, int]:
        label = 'count'
        count = 3
        return label, count
"#;
        let out = rendered(source, &params("C"));
        assert!(out.contains("result = self.c.describe()"));
        assert!(out.contains("self.describe_label.config(text=str(result[0]))"));
        assert!(out.contains("self.describe_count.config(text=str(result[1]))"));
    }
}
