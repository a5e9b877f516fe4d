//! View partitioning and construction-graph resolution.
//!
//! Few controllers share one root view; many controllers get one satellite
//! window each, launched from the root view's menu bar. The partition is
//! decided before any code is emitted so the init module can construct
//! satellites ahead of the root view that references them.

use crate::Params;
use crate::error::{LayoutError, Result};
use crate::table::{ClassInfo, ParamType, snake_case};

/// One generated view class: which controllers it fronts and which other
/// objects its constructor receives.
#[derive(Debug, Clone)]
pub struct ViewSpec {
    pub name: String,
    pub main: bool,
    /// Controller classes rendered inside this view, declaration order.
    pub controllers: Vec<String>,
    /// Satellite view names handed to the root view's constructor.
    pub satellites: Vec<String>,
    /// Model classes handed over for attribute display, when enabled.
    pub models: Vec<String>,
}

impl ViewSpec {
    /// Constructor parameter names, in emission order: satellites, then
    /// controllers, then models.
    pub fn dependency_vars(&self) -> Vec<String> {
        let mut vars: Vec<String> = self.satellites.iter().map(|s| view_var(s)).collect();
        vars.extend(self.controllers.iter().map(|c| snake_case(c)));
        vars.extend(self.models.iter().map(|m| snake_case(m)));
        vars
    }
}

/// The full partition, satellites first and the root view last, which is
/// also the construction order of the init module.
#[derive(Debug, Clone)]
pub struct ViewPlan {
    pub views: Vec<ViewSpec>,
}

impl ViewPlan {
    pub fn main_view(&self) -> Option<&ViewSpec> {
        self.views.iter().find(|v| v.main)
    }
}

/// Variable name for a generated view instance.
pub fn view_var(view_name: &str) -> String {
    view_name.to_lowercase()
}

/// Letter suffix of the nth satellite: B..Z, then AA, AB, ... (bijective
/// base 26, starting after the root view's implicit A).
fn satellite_suffix(index: usize) -> String {
    let mut n = index + 2;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

pub fn partition(classes: &[ClassInfo], params: &Params) -> ViewPlan {
    let controllers: Vec<&ClassInfo> = classes.iter().filter(|c| c.exposed).collect();

    if controllers.len() <= params.view_threshold {
        let models = if params.show_model_attrs {
            classes
                .iter()
                .filter(|c| !c.exposed)
                .map(|c| c.name.clone())
                .collect()
        } else {
            Vec::new()
        };
        return ViewPlan {
            views: vec![ViewSpec {
                name: "View".to_string(),
                main: true,
                controllers: controllers.iter().map(|c| c.name.clone()).collect(),
                satellites: Vec::new(),
                models,
            }],
        };
    }

    // One satellite per non-main controller: View_B, View_C, ...
    let mut views = Vec::new();
    let mut satellites = Vec::new();
    let mut index = 0;
    for controller in &controllers {
        if controller.name == params.main_controller {
            continue;
        }
        let name = format!("View_{}", satellite_suffix(index));
        index += 1;
        satellites.push(name.clone());
        views.push(ViewSpec {
            name,
            main: false,
            controllers: vec![controller.name.clone()],
            satellites: Vec::new(),
            models: referenced_models(controller, classes, params),
        });
    }

    let main = classes.iter().find(|c| c.name == params.main_controller);
    views.push(ViewSpec {
        name: "View".to_string(),
        main: true,
        controllers: vec![params.main_controller.clone()],
        satellites,
        models: main
            .map(|c| referenced_models(c, classes, params))
            .unwrap_or_default(),
    });

    ViewPlan { views }
}

/// Model classes a controller's constructor names, when attribute display
/// is on.
fn referenced_models(controller: &ClassInfo, classes: &[ClassInfo], params: &Params) -> Vec<String> {
    if !params.show_model_attrs {
        return Vec::new();
    }
    controller
        .ctor_params
        .iter()
        .filter_map(|(_, ty)| match ty {
            ParamType::Class(c) if classes.iter().any(|k| &k.name == c && !k.exposed) => {
                Some(c.clone())
            }
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Constructor resolution
// ---------------------------------------------------------------------------

/// One resolved constructor argument of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtorArg {
    /// A previously constructed variable.
    Var(String),
    /// A view-typed dependency: passed as `None` at construction, then
    /// back-patched once the views exist.
    DeferredView,
}

/// Resolve a controller's constructor against the scanned classes.
/// Unscanned view-typed parameters defer; any other unknown class is a
/// [`LayoutError::UnresolvedModel`].
pub fn resolve_ctor_args(
    controller: &ClassInfo,
    classes: &[ClassInfo],
) -> Result<Vec<(String, CtorArg)>> {
    let mut args = Vec::new();
    for (param, ty) in &controller.ctor_params {
        let arg = match ty {
            ParamType::Class(c) if classes.iter().any(|k| &k.name == c) => {
                CtorArg::Var(snake_case(c))
            }
            ParamType::Class(c) if looks_like_view(param, c) => CtorArg::DeferredView,
            ParamType::Class(c) => {
                return Err(LayoutError::UnresolvedModel {
                    class: controller.name.clone(),
                    param: param.clone(),
                    ty: c.clone(),
                }
                .into());
            }
            // Controllers carry no intrinsic ctor params by construction;
            // tolerate one with its zero value.
            ParamType::Intrinsic(py) => CtorArg::Var(py.zero_literal().to_string()),
        };
        args.push((param.clone(), arg));
    }
    Ok(args)
}

fn looks_like_view(param: &str, class: &str) -> bool {
    class.to_lowercase().contains("view")
        || matches!(param, "view" | "vista" | "vue" | "ansicht")
}

/// Drop satellite views whose controller cannot be constructed; an
/// unconstructible root view is fatal.
pub fn prune_unresolved(mut plan: ViewPlan, classes: &[ClassInfo]) -> Result<ViewPlan> {
    let mut dropped: Vec<String> = Vec::new();

    for view in &plan.views {
        for controller in &view.controllers {
            let Some(info) = classes.iter().find(|c| &c.name == controller) else {
                continue;
            };
            if let Err(e) = resolve_ctor_args(info, classes) {
                if view.main {
                    return Err(e);
                }
                tracing::warn!(view = %view.name, controller = %controller, error = %e,
                    "skipping satellite view with unresolvable controller");
                dropped.push(view.name.clone());
                break;
            }
        }
    }

    plan.views.retain(|v| !dropped.contains(&v.name));
    for view in &mut plan.views {
        view.satellites.retain(|s| !dropped.contains(s));
    }
    Ok(plan)
}
