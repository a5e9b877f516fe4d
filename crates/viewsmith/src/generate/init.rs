//! The generated init module (`main.py`).
//!
//! Emits the whole object graph in dependency order: Model instances from
//! zero-value literals, then controllers over the model variables, then
//! satellite views, then the root view, then the deferred view back-patches.
//! Satellites must exist before the root view line that references them.

use crate::Params;
use crate::error::{LayoutError, Result};
use crate::generate::views::{CtorArg, ViewPlan, resolve_ctor_args, view_var};
use crate::generate::PyWriter;
use crate::table::{ClassInfo, ParamType, snake_case};

pub fn render(
    plan: &ViewPlan,
    classes: &[ClassInfo],
    source_files: &[String],
    _params: &Params,
) -> Result<String> {
    let mut w = PyWriter::new();

    let mut files: Vec<&String> = source_files.iter().collect();
    files.sort();
    for file in files {
        w.line(&format!("from {file} import *"));
    }
    w.line("from view import *");
    w.blank();

    // Models, declaration order, default-constructed.
    for class in classes.iter().filter(|c| !c.exposed) {
        let args = model_ctor_args(class, classes)?;
        w.line(&format!(
            "{} = {}({})",
            snake_case(&class.name),
            class.name,
            args.join(", ")
        ));
    }

    // Controllers actually fronted by a surviving view.
    let mut deferred: Vec<(String, String, String)> = Vec::new();
    for class in classes.iter().filter(|c| c.exposed) {
        let Some(view) = plan.views.iter().find(|v| v.controllers.contains(&class.name)) else {
            continue;
        };
        let mut rendered = Vec::new();
        for (param, arg) in resolve_ctor_args(class, classes)? {
            match arg {
                CtorArg::Var(v) => rendered.push(v),
                CtorArg::DeferredView => {
                    rendered.push("None".to_string());
                    deferred.push((snake_case(&class.name), param, view_var(&view.name)));
                }
            }
        }
        w.line(&format!(
            "{} = {}({})",
            snake_case(&class.name),
            class.name,
            rendered.join(", ")
        ));
    }

    // Views: the plan already orders satellites ahead of the root.
    for view in &plan.views {
        w.line(&format!(
            "{} = {}({})",
            view_var(&view.name),
            view.name,
            view.dependency_vars().join(", ")
        ));
    }

    // Back-patch view-typed controller dependencies now that views exist.
    for (controller_var, param, view) in &deferred {
        w.line(&format!("{controller_var}.{param} = {view}"));
    }

    if let Some(main) = plan.main_view() {
        w.blank();
        w.line(&format!("{}.run()", view_var(&main.name)));
    }

    Ok(w.finish())
}

fn model_ctor_args(class: &ClassInfo, classes: &[ClassInfo]) -> Result<Vec<String>> {
    let mut args = Vec::new();
    for (param, ty) in &class.ctor_params {
        match ty {
            ParamType::Intrinsic(py) => args.push(py.zero_literal().to_string()),
            ParamType::Class(c) if classes.iter().any(|k| &k.name == c) => {
                args.push(snake_case(c));
            }
            ParamType::Class(c) => {
                return Err(LayoutError::UnresolvedModel {
                    class: class.name.clone(),
                    param: param.clone(),
                    ty: c.clone(),
                }
                .into());
            }
        }
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::views::partition;
    use crate::table::PyType;

    fn classes() -> Vec<ClassInfo> {
        vec![
            ClassInfo {
                name: "Student".to_string(),
                exposed: false,
                ctor_params: vec![
                    ("sid".to_string(), ParamType::Intrinsic(PyType::Str)),
                    ("credits".to_string(), ParamType::Intrinsic(PyType::Int)),
                ],
            },
            ClassInfo {
                name: "StudentController".to_string(),
                exposed: true,
                ctor_params: vec![
                    ("model".to_string(), ParamType::Class("Student".to_string())),
                    ("vista".to_string(), ParamType::Class("SmartView".to_string())),
                ],
            },
        ]
    }

    fn params() -> Params {
        Params {
            main_controller: "StudentController".to_string(),
            ..Params::default()
        }
    }

    #[test]
    fn models_default_construct_from_zero_literals() {
        let classes = classes();
        let plan = partition(&classes, &params());
        let out = render(&plan, &classes, &["student".to_string()], &params()).unwrap();
        assert!(out.contains("student = Student('', 0)"));
    }

    #[test]
    fn controllers_take_model_vars_and_defer_views() {
        let classes = classes();
        let plan = partition(&classes, &params());
        let out = render(&plan, &classes, &["student".to_string()], &params()).unwrap();
        assert!(out.contains("student_controller = StudentController(student, None)"));
        assert!(out.contains("student_controller.vista = view"));
        assert!(out.ends_with("view.run()\n"));
    }

    #[test]
    fn imports_are_sorted_and_include_the_view_module() {
        let classes = classes();
        let plan = partition(&classes, &params());
        let files = vec!["zeta".to_string(), "alpha".to_string()];
        let out = render(&plan, &classes, &files, &params()).unwrap();
        let alpha = out.find("from alpha import *").unwrap();
        let zeta = out.find("from zeta import *").unwrap();
        let view = out.find("from view import *").unwrap();
        assert!(alpha < zeta && zeta < view);
    }

    #[test]
    fn satellites_are_constructed_before_the_root_view() {
        let mut classes = classes();
        for name in ["B", "C", "D"] {
            classes.push(ClassInfo {
                name: format!("Controller{name}"),
                exposed: true,
                ctor_params: vec![("model".to_string(), ParamType::Class("Student".to_string()))],
            });
        }
        let plan = partition(&classes, &params());
        let out = render(&plan, &classes, &["student".to_string()], &params()).unwrap();
        let satellite = out.find("view_b = View_B(").unwrap();
        let root = out.find("view = View(").unwrap();
        assert!(satellite < root, "the root view references satellites by name");
    }
}
