//! Table refinement: the pass between classification and generation.
//!
//! Runs a fixed sequence over the scanned table: attach predicted control
//! kinds, detect the locale, take a sharing census, promote menu actions,
//! route oversized methods to popup windows, merge identical rows, then
//! synthesize labels and apply Model-attribute visibility. Order matters;
//! the census in particular must precede any promotion so that shared
//! arguments are judged on their final, merged shape.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::Params;
use crate::classify::WidgetKind;
use crate::error::{Error, Result, StructuralError};
use crate::locale::{self, Locale, category_of};
use crate::table::*;

/// The refined table handed to the generator, read-only from here on.
#[derive(Debug, Clone)]
pub struct RefinedTable {
    pub rows: Vec<FeatureRow>,
    pub locale: Locale,
}

pub fn refine(
    table: FeatureTable,
    classes: &[ClassInfo],
    kinds: &[WidgetKind],
    params: &Params,
) -> Result<RefinedTable> {
    let mut rows = table.rows;

    attach_kinds(&mut rows, kinds)?;
    validate_main_controller(&rows, classes, &params.main_controller)?;

    let locale = detect_locale(&rows);
    let census = sharing_census(&rows);

    promote_menus(&mut rows, &census, params);
    propagate_windows(&mut rows, &census, params);

    let windowed = windowed_methods(&rows);
    merge_arguments(&mut rows, &windowed);
    merge_returns(&mut rows, &windowed);

    synthesize_labels(&mut rows, classes, locale);
    apply_visibility(&mut rows, classes, params);

    Ok(RefinedTable { rows, locale })
}

// ---------------------------------------------------------------------------
// Step 1: predicted kinds
// ---------------------------------------------------------------------------

fn attach_kinds(rows: &mut [FeatureRow], kinds: &[WidgetKind]) -> Result<()> {
    let want = rows
        .iter()
        .filter(|r| !matches!(r, FeatureRow::Method(_)))
        .count();
    if kinds.len() != want {
        return Err(Error::ClassifierMisaligned {
            want,
            got: kinds.len(),
        });
    }

    let mut next = kinds.iter().copied();
    for row in rows.iter_mut() {
        match row {
            FeatureRow::Argument(a) => a.widget = next.next(),
            FeatureRow::Return(r) => r.widget = next.next(),
            FeatureRow::Method(_) => {}
        }
    }
    Ok(())
}

fn validate_main_controller(
    rows: &[FeatureRow],
    classes: &[ClassInfo],
    main: &str,
) -> Result<()> {
    let known = classes.iter().any(|c| c.name == main && c.exposed)
        && rows
            .iter()
            .filter_map(FeatureRow::as_method)
            .any(|m| m.class_name == main);
    if known {
        Ok(())
    } else {
        Err(StructuralError::MainControllerNotFound(main.to_string()).into())
    }
}

// ---------------------------------------------------------------------------
// Step 2: locale
// ---------------------------------------------------------------------------

fn detect_locale(rows: &[FeatureRow]) -> Locale {
    let ids: Vec<&str> = rows
        .iter()
        .filter_map(FeatureRow::as_method)
        .map(|m| m.name.as_str())
        .collect();
    match locale::detect(&ids) {
        Some(locale) => locale,
        None => {
            tracing::warn!("no supported locale majority; falling back to en");
            Locale::En
        }
    }
}

// ---------------------------------------------------------------------------
// Step 3: sharing census
// ---------------------------------------------------------------------------

/// Occurrence count per row identity, taken before any promotion or merge.
/// A count of two or more means the row will coalesce with a sibling.
fn sharing_census(rows: &[FeatureRow]) -> IndexMap<RowKey, usize> {
    let mut census = IndexMap::new();
    for row in rows {
        let key = match row {
            FeatureRow::Argument(a) => a.merge_key(),
            FeatureRow::Return(r) => r.merge_key(),
            FeatureRow::Method(_) => continue,
        };
        *census.entry(key).or_insert(0) += 1;
    }
    census
}

/// Does any argument or return row of this method coalesce with another
/// method's row?
fn method_shares_rows(
    rows: &[FeatureRow],
    census: &IndexMap<RowKey, usize>,
    class: &str,
    method: &str,
) -> bool {
    rows.iter().any(|row| match row {
        FeatureRow::Argument(a) => {
            a.class_name == class
                && a.belongs_to == method
                && census.get(&a.merge_key()).copied().unwrap_or(0) > 1
        }
        FeatureRow::Return(r) => {
            r.class_name == class
                && r.belongs_to == method
                && census.get(&r.merge_key()).copied().unwrap_or(0) > 1
        }
        FeatureRow::Method(_) => false,
    })
}

/// Promotion fires when either count exceeds the threshold on its own;
/// the counts are never summed.
fn over_window_threshold(m: &MethodRow, threshold: usize) -> bool {
    m.arguments.len() > threshold || m.return_values.len() > threshold
}

// ---------------------------------------------------------------------------
// Steps 4 and 5: menu promotion and window propagation
// ---------------------------------------------------------------------------

fn promote_menus(rows: &mut Vec<FeatureRow>, census: &IndexMap<RowKey, usize>, params: &Params) {
    let snapshot = rows.clone();
    for row in rows.iter_mut() {
        let FeatureRow::Method(m) = row else { continue };
        if !m.exposed {
            continue;
        }
        if m.arguments.is_empty()
            && m.return_values.is_empty()
            && m.returns == ReturnSignature::None
        {
            m.menu = true;
            continue;
        }
        // Oversized main-controller methods become menu-launched popups
        // unless a shared control pins them to the inline frame.
        if m.class_name == params.main_controller
            && over_window_threshold(m, params.window_threshold)
            && !method_shares_rows(&snapshot, census, &m.class_name, &m.name)
        {
            m.menu = true;
            m.window = true;
        }
    }
}

fn propagate_windows(rows: &mut Vec<FeatureRow>, census: &IndexMap<RowKey, usize>, params: &Params) {
    let snapshot = rows.clone();
    for row in rows.iter_mut() {
        let FeatureRow::Method(m) = row else { continue };
        if !m.exposed || m.class_name == params.main_controller || m.window {
            continue;
        }
        if over_window_threshold(m, params.window_threshold)
            && !method_shares_rows(&snapshot, census, &m.class_name, &m.name)
        {
            m.window = true;
        }
    }
}

fn windowed_methods(rows: &[FeatureRow]) -> HashSet<(String, String)> {
    rows.iter()
        .filter_map(FeatureRow::as_method)
        .filter(|m| m.window)
        .map(|m| (m.class_name.clone(), m.name.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Step 6: merge
// ---------------------------------------------------------------------------

/// Coalesce identical argument rows. The surviving row is the first seen;
/// its `belongs_to` becomes the comma-joined union in first-seen order.
/// Rows owned by windowed methods keep their own copy.
fn merge_arguments(rows: &mut Vec<FeatureRow>, windowed: &HashSet<(String, String)>) {
    let mut first_seen: IndexMap<RowKey, usize> = IndexMap::new();
    let mut out: Vec<FeatureRow> = Vec::with_capacity(rows.len());

    for row in rows.drain(..) {
        match row {
            FeatureRow::Argument(a)
                if !windowed.contains(&(a.class_name.clone(), a.belongs_to.clone())) =>
            {
                let key = a.merge_key();
                match first_seen.get(&key) {
                    Some(&idx) => {
                        if let FeatureRow::Argument(kept) = &mut out[idx] {
                            kept.belongs_to.push(',');
                            kept.belongs_to.push_str(&a.belongs_to);
                        }
                    }
                    None => {
                        first_seen.insert(key, out.len());
                        out.push(FeatureRow::Argument(a));
                    }
                }
            }
            other => out.push(other),
        }
    }

    *rows = out;
}

fn merge_returns(rows: &mut Vec<FeatureRow>, windowed: &HashSet<(String, String)>) {
    let mut first_seen: IndexMap<RowKey, usize> = IndexMap::new();
    let mut out: Vec<FeatureRow> = Vec::with_capacity(rows.len());

    for row in rows.drain(..) {
        match row {
            FeatureRow::Return(r)
                if !windowed.contains(&(r.class_name.clone(), r.belongs_to.clone())) =>
            {
                let key = r.merge_key();
                match first_seen.get(&key) {
                    Some(&idx) => {
                        if let FeatureRow::Return(kept) = &mut out[idx] {
                            kept.belongs_to.push(',');
                            kept.belongs_to.push_str(&r.belongs_to);
                        }
                    }
                    None => {
                        first_seen.insert(key, out.len());
                        out.push(FeatureRow::Return(r));
                    }
                }
            }
            other => out.push(other),
        }
    }

    *rows = out;
}

// ---------------------------------------------------------------------------
// Step 7: labels and descriptions
// ---------------------------------------------------------------------------

/// Resolved target of an `object.attribute.method()` return: which Model
/// accessor the call lands on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AttributeTarget {
    model_class: String,
    accessor: String,
}

/// `self.model.get_name` on a controller whose ctor binds `model: Student`
/// resolves to Student's `get_name`.
fn resolve_attribute_call(
    name: &str,
    controller: &str,
    classes: &[ClassInfo],
) -> Option<AttributeTarget> {
    let mut parts = name.rsplit('.');
    let accessor = parts.next()?.to_string();
    let attr = parts.next()?;

    let info = classes.iter().find(|c| c.name == controller)?;
    let model_class = info.ctor_params.iter().find_map(|(p, ty)| match ty {
        ParamType::Class(c) if p == attr => Some(c.clone()),
        _ => None,
    })?;

    Some(AttributeTarget {
        model_class,
        accessor,
    })
}

fn synthesize_labels(rows: &mut Vec<FeatureRow>, classes: &[ClassInfo], locale: Locale) {
    // Declared return-value names per (class, method), for resolving
    // attribute passthroughs to the Model's own value name.
    let mut method_returns: HashMap<(String, String), Vec<(String, PyType)>> = HashMap::new();
    for row in rows.iter() {
        if let FeatureRow::Method(m) = row {
            method_returns.insert(
                (m.class_name.clone(), m.name.clone()),
                m.return_values.clone(),
            );
        }
    }

    for row in rows.iter_mut() {
        match row {
            FeatureRow::Method(m) => {
                m.label = humanize(&m.name);
            }
            FeatureRow::Argument(a) => {
                a.label = humanize(&a.name);
                a.description = format!("{}:", a.label);
            }
            FeatureRow::Return(r) => {
                r.label = match r.origin {
                    ReturnOrigin::AttributeCall => {
                        attribute_call_label(r, classes, &method_returns)
                    }
                    ReturnOrigin::Constant => {
                        let method = r.belongs_to.split(',').next().unwrap_or("");
                        format!(
                            "{} {}",
                            category_of(r.ty).prefix(locale),
                            method.replace('_', " ")
                        )
                    }
                    _ => humanize(&r.name),
                };
                r.description = format!("{}:", r.label);
            }
        }
    }
}

fn attribute_call_label(
    row: &ReturnValueRow,
    classes: &[ClassInfo],
    method_returns: &HashMap<(String, String), Vec<(String, PyType)>>,
) -> String {
    if let Some(target) = resolve_attribute_call(&row.name, &row.class_name, classes)
        && let Some(values) = method_returns.get(&(target.model_class, target.accessor.clone()))
        && let Some((value_name, _)) = values.first()
    {
        return humanize(value_name);
    }
    // Unresolvable chain: fall back to the accessor's own name.
    let accessor = row.name.rsplit('.').next().unwrap_or(&row.name);
    humanize(accessor)
}

// ---------------------------------------------------------------------------
// Step 8: Model-attribute visibility
// ---------------------------------------------------------------------------

fn apply_visibility(rows: &mut Vec<FeatureRow>, classes: &[ClassInfo], params: &Params) {
    // Accessor-only methods to drop entirely when requested: zero arguments,
    // exactly one return row, and that row is an attribute passthrough.
    let mut dropped_methods: HashSet<(String, String)> = HashSet::new();
    if params.hide_model_attr_methods {
        for m in rows.iter().filter_map(FeatureRow::as_method) {
            if !m.exposed || !m.arguments.is_empty() {
                continue;
            }
            let returns: Vec<&ReturnValueRow> = rows
                .iter()
                .filter_map(|r| match r {
                    FeatureRow::Return(r)
                        if r.class_name == m.class_name
                            && r.belongs_to.split(',').any(|b| b == m.name) =>
                    {
                        Some(r)
                    }
                    _ => None,
                })
                .collect();
            if returns.len() == 1 && returns[0].origin == ReturnOrigin::AttributeCall {
                dropped_methods.insert((m.class_name.clone(), m.name.clone()));
            }
        }
    }

    let mut seen_targets: HashSet<(String, AttributeTarget)> = HashSet::new();

    rows.retain(|row| match row {
        FeatureRow::Method(m) => !dropped_methods.contains(&(m.class_name.clone(), m.name.clone())),
        FeatureRow::Argument(a) => !a
            .belongs_to
            .split(',')
            .all(|b| dropped_methods.contains(&(a.class_name.clone(), b.to_string()))),
        FeatureRow::Return(r) => {
            if r.belongs_to
                .split(',')
                .all(|b| dropped_methods.contains(&(r.class_name.clone(), b.to_string())))
            {
                return false;
            }
            if r.origin != ReturnOrigin::AttributeCall {
                return true;
            }
            if !params.show_model_attrs {
                return false;
            }
            // Visible attributes are deduplicated per controller by their
            // resolved Model target. The declared method shape stays intact;
            // only the display row disappears.
            match resolve_attribute_call(&r.name, &r.class_name, classes) {
                Some(target) => seen_targets.insert((r.class_name.clone(), target)),
                None => true,
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
