//! Tree-sitter based Python front end.
//!
//! Walks the concrete syntax tree in pre-order and emits one feature row per
//! method, argument and return value:
//! - Class definitions (to split Models from Controllers via their
//!   constructor signatures)
//! - Method parameters with type annotations and default values
//! - `assert` statements that tighten numeric bounds or enumerate values
//! - Trailing `return` expressions (variable, attribute chain, constant)

use tree_sitter::{Node, Parser, Tree};

use crate::error::{Result, StructuralError, SyntaxError};
use crate::table::*;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a Python source corpus and extract the feature table plus the
/// per-class construction info. Runs exactly once per corpus.
pub fn scan(source: &str) -> Result<ScanOutcome> {
    let tree = parse_python(source)?;
    let root = tree.root_node();
    let src = source.as_bytes();

    if let Some((line, column, context)) = first_syntax_error(root, src) {
        return Err(SyntaxError::Invalid {
            line,
            column,
            context,
        }
        .into());
    }

    let mut walker = Walker::default();
    walker.walk(root, src)?;

    Ok(ScanOutcome {
        table: FeatureTable { rows: walker.rows },
        classes: walker.classes,
    })
}

// ---------------------------------------------------------------------------
// Python parsing
// ---------------------------------------------------------------------------

fn parse_python(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SyntaxError::Parse(format!("failed to set language: {e}")))?;
    parser
        .parse(source, None)
        .ok_or_else(|| SyntaxError::Parse("tree-sitter parse returned None".into()).into())
}

fn node_text<'a>(node: &Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// Locate the first ERROR or MISSING node, if any.
fn first_syntax_error(node: Node, src: &[u8]) -> Option<(usize, usize, String)> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        let context = node_text(&node, src).chars().take(40).collect();
        return Some((pos.row + 1, pos.column + 1, context));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_syntax_error(child, src) {
            return Some(found);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// Explicit row accumulator threaded through the traversal; keeps the
/// scanner re-entrant.
#[derive(Default)]
struct Walker {
    rows: Vec<FeatureRow>,
    classes: Vec<ClassInfo>,
}

impl Walker {
    fn walk(&mut self, node: Node, src: &[u8]) -> Result<()> {
        let class_node = match node.kind() {
            "class_definition" => Some(node),
            "decorated_definition" => node
                .children(&mut node.walk())
                .find(|c| c.kind() == "class_definition"),
            _ => None,
        };

        if let Some(class_node) = class_node {
            self.scan_class(class_node, src)?;
            return Ok(());
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, src)?;
        }
        Ok(())
    }

    fn scan_class(&mut self, class_node: Node, src: &[u8]) -> Result<()> {
        let name = match class_node.child_by_field_name("name") {
            Some(n) => node_text(&n, src).to_string(),
            None => return Ok(()),
        };
        let body = match class_node.child_by_field_name("body") {
            Some(b) => b,
            None => return Ok(()),
        };

        let ctor = find_method(&body, src, "__init__").ok_or_else(|| {
            StructuralError::MissingConstructor {
                class: name.clone(),
            }
        })?;

        let ctor_params = extract_ctor_params(&ctor, src);
        // Controller-like iff every constructor dependency is a class
        // reference; one intrinsic-typed parameter makes it a Model.
        let exposed = !ctor_params
            .iter()
            .any(|(_, ty)| matches!(ty, ParamType::Intrinsic(_)));

        self.classes.push(ClassInfo {
            name: name.clone(),
            exposed,
            ctor_params,
        });

        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            let func = match child.kind() {
                "function_definition" => Some(child),
                "decorated_definition" => child
                    .children(&mut child.walk())
                    .find(|c| c.kind() == "function_definition"),
                _ => None,
            };
            if let Some(func) = func {
                let method_name = func
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, src).to_string())
                    .unwrap_or_default();
                if method_name != "__init__" {
                    self.scan_method(&func, src, &name, &method_name, exposed)?;
                }
            }
        }

        Ok(())
    }

    fn scan_method(
        &mut self,
        func: &Node,
        src: &[u8],
        class_name: &str,
        method_name: &str,
        exposed: bool,
    ) -> Result<()> {
        let asserts = func
            .child_by_field_name("body")
            .map(|body| collect_asserts(&body, src))
            .unwrap_or_default();

        let mut arguments: Vec<(String, PyType)> = Vec::new();
        let mut arg_rows: Vec<ArgumentRow> = Vec::new();

        if let Some(params) = func.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.children(&mut cursor) {
                let extracted = extract_parameter(&param, src);
                let Some((arg_name, ty, default)) = extracted else {
                    continue;
                };
                if arguments.len() >= ARITY_CAP {
                    tracing::warn!(
                        class = class_name,
                        method = method_name,
                        "more than {ARITY_CAP} arguments; extras ignored"
                    );
                    break;
                }
                let (lower, upper) = bounds_from_asserts(&arg_name, &asserts);
                let possible_values = values_from_asserts(&arg_name, &asserts);
                arguments.push((arg_name.clone(), ty));
                arg_rows.push(ArgumentRow {
                    name: arg_name,
                    ty,
                    lower,
                    upper,
                    default,
                    possible_values,
                    belongs_to: method_name.to_string(),
                    class_name: class_name.to_string(),
                    widget: None,
                    label: String::new(),
                    description: String::new(),
                });
            }
        }

        let returns = func
            .child_by_field_name("return_type")
            .map(|ann| parse_return_signature(&ann, src))
            .unwrap_or(ReturnSignature::None);

        let (return_values, ret_rows) = extract_returns(
            func,
            src,
            class_name,
            method_name,
            &returns,
        )?;

        self.rows.push(FeatureRow::Method(MethodRow::new(
            method_name.to_string(),
            class_name.to_string(),
            returns,
            exposed,
            arguments,
            return_values,
        )));
        self.rows.extend(arg_rows.into_iter().map(FeatureRow::Argument));
        self.rows.extend(ret_rows.into_iter().map(FeatureRow::Return));

        Ok(())
    }
}

fn find_method<'a>(body: &Node<'a>, src: &[u8], name: &str) -> Option<Node<'a>> {
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        let func = match child.kind() {
            "function_definition" => Some(child),
            "decorated_definition" => child
                .children(&mut child.walk())
                .find(|c| c.kind() == "function_definition"),
            _ => None,
        };
        if let Some(func) = func
            && let Some(name_node) = func.child_by_field_name("name")
            && node_text(&name_node, src) == name
        {
            return Some(func);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Parameter extraction
// ---------------------------------------------------------------------------

/// Constructor parameters keep class references; they drive the
/// Model/Controller split and the generated construction graph.
fn extract_ctor_params(ctor: &Node, src: &[u8]) -> Vec<(String, ParamType)> {
    let mut out = Vec::new();
    let Some(params) = ctor.child_by_field_name("parameters") else {
        return out;
    };

    let mut cursor = params.walk();
    for param in params.children(&mut cursor) {
        match param.kind() {
            "typed_parameter" | "typed_default_parameter" => {
                let name = parameter_name(&param, src);
                let ann = param
                    .child_by_field_name("type")
                    .map(|t| annotation_name(&t, src))
                    .unwrap_or_default();
                if let Some(name) = name {
                    let ty = match PyType::from_name(&ann) {
                        Some(p) => ParamType::Intrinsic(p),
                        None => ParamType::Class(ann),
                    };
                    out.push((name, ty));
                }
            }
            "default_parameter" => {
                let name = parameter_name(&param, src);
                let default = param
                    .child_by_field_name("value")
                    .and_then(|v| parse_literal(&v, src));
                if let (Some(name), Some(ty)) =
                    (name, default.as_ref().and_then(DefaultValue::py_type))
                {
                    out.push((name, ParamType::Intrinsic(ty)));
                }
            }
            _ => {}
        }
    }
    out
}

/// One method parameter → `(name, type, default)`. `None` for `self`,
/// unannotated class-typed values, or anything else that can't surface as a
/// control.
fn extract_parameter(
    param: &Node,
    src: &[u8],
) -> Option<(String, PyType, Option<DefaultValue>)> {
    match param.kind() {
        "typed_parameter" => {
            let name = parameter_name(param, src)?;
            let ann = annotation_name(&param.child_by_field_name("type")?, src);
            let ty = PyType::from_name(&ann)?;
            Some((name, ty, None))
        }
        "typed_default_parameter" => {
            let name = parameter_name(param, src)?;
            let ann = annotation_name(&param.child_by_field_name("type")?, src);
            let ty = PyType::from_name(&ann)?;
            let default = param
                .child_by_field_name("value")
                .and_then(|v| parse_literal(&v, src));
            Some((name, ty, default))
        }
        // No declared type: infer it from the default literal's kind.
        "default_parameter" => {
            let name = parameter_name(param, src)?;
            let default = param
                .child_by_field_name("value")
                .and_then(|v| parse_literal(&v, src))?;
            let ty = default.py_type()?;
            Some((name, ty, Some(default)))
        }
        _ => None,
    }
}

fn parameter_name(param: &Node, src: &[u8]) -> Option<String> {
    if let Some(n) = param.child_by_field_name("name") {
        let name = node_text(&n, src);
        return (name != "self" && name != "cls").then(|| name.to_string());
    }
    // typed_parameter has no "name" field; the identifier is the first child.
    let mut cursor = param.walk();
    param
        .children(&mut cursor)
        .find(|c| c.kind() == "identifier")
        .map(|n| node_text(&n, src).to_string())
        .filter(|n| n != "self" && n != "cls")
}

/// The simple name inside a `type` annotation node.
fn annotation_name(node: &Node, src: &[u8]) -> String {
    let inner = if node.kind() == "type" {
        node.named_child(0).unwrap_or(*node)
    } else {
        *node
    };
    node_text(&inner, src).to_string()
}

// ---------------------------------------------------------------------------
// Return signature and trailing return expression
// ---------------------------------------------------------------------------

fn parse_return_signature(ann: &Node, src: &[u8]) -> ReturnSignature {
    let inner = if ann.kind() == "type" {
        match ann.named_child(0) {
            Some(n) => n,
            None => return ReturnSignature::None,
        }
    } else {
        *ann
    };

    match inner.kind() {
        "none" => ReturnSignature::None,
        "identifier" => {
            let name = node_text(&inner, src);
            match PyType::from_name(name) {
                Some(ty) => ReturnSignature::Scalar(ty),
                None => ReturnSignature::None,
            }
        }
        // `tuple[str, int]` in type position: the grammar wraps the base
        // identifier and a type_parameter list in a generic_type node.
        "generic_type" => {
            let mut base = String::new();
            let mut elements = Vec::new();
            let mut cursor = inner.walk();
            for child in inner.children(&mut cursor) {
                match child.kind() {
                    "identifier" => base = node_text(&child, src).to_string(),
                    "type_parameter" => {
                        let mut params = child.walk();
                        for element in child.children(&mut params) {
                            if !element.is_named() {
                                continue;
                            }
                            let name = annotation_name(&element, src);
                            if let Some(ty) = PyType::from_name(&name) {
                                elements.push(ty);
                            }
                        }
                    }
                    _ => {}
                }
            }
            tuple_signature(&base, elements)
        }
        // The same annotation in value position parses as a subscript.
        "subscript" => {
            let base = inner
                .child_by_field_name("value")
                .map(|v| node_text(&v, src).to_string())
                .unwrap_or_default();
            let mut elements = Vec::new();
            let mut cursor = inner.walk();
            for child in inner.children_by_field_name("subscript", &mut cursor) {
                let name = annotation_name(&child, src);
                if let Some(ty) = PyType::from_name(&name) {
                    elements.push(ty);
                }
            }
            tuple_signature(&base, elements)
        }
        _ => ReturnSignature::None,
    }
}

fn tuple_signature(base: &str, elements: Vec<PyType>) -> ReturnSignature {
    if (base == "tuple" || base == "Tuple") && !elements.is_empty() {
        ReturnSignature::Tuple(elements)
    } else {
        ReturnSignature::None
    }
}

/// Classify the trailing `return` and emit one return-value row per declared
/// element (tuple types yield several, in declaration order).
fn extract_returns(
    func: &Node,
    src: &[u8],
    class_name: &str,
    method_name: &str,
    returns: &ReturnSignature,
) -> Result<(Vec<(String, PyType)>, Vec<ReturnValueRow>)> {
    let mut pairs = Vec::new();
    let mut rows = Vec::new();

    let expr = trailing_return_expr(func);
    match returns {
        ReturnSignature::None => {}
        ReturnSignature::Scalar(ty) => {
            if let Some(expr) = expr
                && let Some((name, origin)) = classify_return_expr(&expr, src)
            {
                pairs.push((name.clone(), *ty));
                rows.push(make_return_row(name, *ty, origin, class_name, method_name));
            }
        }
        ReturnSignature::Tuple(types) => {
            let Some(expr) = expr else {
                return Ok((pairs, rows));
            };
            let elements = tuple_elements(&expr);
            if elements.is_empty() {
                return Ok((pairs, rows));
            }
            if elements.len() != types.len() {
                return Err(StructuralError::ReturnArityMismatch {
                    class: class_name.to_string(),
                    method: method_name.to_string(),
                    declared: types.len(),
                    actual: elements.len(),
                }
                .into());
            }
            for (element, ty) in elements.iter().zip(types) {
                if let Some((name, origin)) = classify_return_expr(element, src) {
                    pairs.push((name.clone(), *ty));
                    rows.push(make_return_row(name, *ty, origin, class_name, method_name));
                }
            }
        }
    }

    Ok((pairs, rows))
}

fn make_return_row(
    name: String,
    ty: PyType,
    origin: ReturnOrigin,
    class_name: &str,
    method_name: &str,
) -> ReturnValueRow {
    ReturnValueRow {
        name,
        ty,
        origin,
        belongs_to: method_name.to_string(),
        class_name: class_name.to_string(),
        widget: None,
        label: String::new(),
        description: String::new(),
    }
}

fn trailing_return_expr<'a>(func: &Node<'a>) -> Option<Node<'a>> {
    let body = func.child_by_field_name("body")?;
    let last = body.named_child(body.named_child_count().checked_sub(1)?)?;
    if last.kind() != "return_statement" {
        return None;
    }
    last.named_child(0)
}

/// `return a, b` and `return (a, b)` both yield the elements.
fn tuple_elements<'a>(expr: &Node<'a>) -> Vec<Node<'a>> {
    match expr.kind() {
        "expression_list" | "tuple" => {
            let mut out = Vec::new();
            let mut cursor = expr.walk();
            for child in expr.children(&mut cursor) {
                if child.is_named() {
                    out.push(child);
                }
            }
            out
        }
        _ => vec![*expr],
    }
}

fn classify_return_expr(expr: &Node, src: &[u8]) -> Option<(String, ReturnOrigin)> {
    match expr.kind() {
        "identifier" => Some((node_text(expr, src).to_string(), ReturnOrigin::Variable)),
        "call" => {
            // `object.attribute.method()`: the Model attribute passthrough
            // shape. Shorter call chains are not displayable.
            let func = expr.child_by_field_name("function")?;
            if func.kind() != "attribute" {
                return None;
            }
            let object = func.child_by_field_name("object")?;
            if object.kind() != "attribute" {
                return None;
            }
            Some((
                node_text(&func, src).to_string(),
                ReturnOrigin::AttributeCall,
            ))
        }
        "attribute" => {
            let attr = expr.child_by_field_name("attribute")?;
            Some((node_text(&attr, src).to_string(), ReturnOrigin::Attribute))
        }
        "integer" | "float" | "string" | "true" | "false" | "none" => {
            let value = parse_literal(expr, src)?;
            let rendered = match &value {
                DefaultValue::Str(s) => s.clone(),
                other => other.to_python(),
            };
            Some((format!("unnamed_{rendered}"), ReturnOrigin::Constant))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Assertion constraints
// ---------------------------------------------------------------------------

/// Transient shape of one `assert` comparison chain. Never persisted beyond
/// the scanner.
#[derive(Debug, Clone)]
struct AssertChain {
    terms: Vec<Term>,
    ops: Vec<CmpOp>,
}

#[derive(Debug, Clone)]
enum Term {
    Name(String),
    Num(f64, PyType),
    Lit(String),
    LitList(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    In,
    Other,
}

fn collect_asserts(body: &Node, src: &[u8]) -> Vec<AssertChain> {
    let mut asserts = Vec::new();
    let mut cursor = body.walk();
    for stmt in body.children(&mut cursor) {
        if stmt.kind() != "assert_statement" {
            continue;
        }
        let Some(test) = stmt.named_child(0) else {
            continue;
        };
        if test.kind() != "comparison_operator" {
            continue;
        }
        if let Some(chain) = parse_comparison(&test, src) {
            asserts.push(chain);
        }
    }
    asserts
}

/// Malformed or unresolvable comparisons return None and are tolerated.
fn parse_comparison(test: &Node, src: &[u8]) -> Option<AssertChain> {
    let mut terms = Vec::new();
    let mut ops = Vec::new();

    let mut cursor = test.walk();
    for child in test.children(&mut cursor) {
        if child.is_named() {
            terms.push(parse_term(&child, src)?);
        } else {
            ops.push(match child.kind() {
                "<" => CmpOp::Lt,
                "<=" => CmpOp::Le,
                ">" => CmpOp::Gt,
                ">=" => CmpOp::Ge,
                "==" => CmpOp::Eq,
                "in" => CmpOp::In,
                _ => CmpOp::Other,
            });
        }
    }

    if terms.len() < 2 || ops.len() != terms.len() - 1 {
        return None;
    }
    Some(AssertChain { terms, ops })
}

fn parse_term(node: &Node, src: &[u8]) -> Option<Term> {
    match node.kind() {
        "identifier" => Some(Term::Name(node_text(node, src).to_string())),
        "integer" => {
            let text = node_text(node, src);
            text.parse::<f64>().ok().map(|n| Term::Num(n, PyType::Int))
        }
        "float" => {
            let text = node_text(node, src);
            text.parse::<f64>().ok().map(|n| Term::Num(n, PyType::Float))
        }
        "unary_operator" => {
            let text = node_text(node, src).trim().to_string();
            if let Ok(n) = text.parse::<f64>() {
                let ty = if text.contains('.') {
                    PyType::Float
                } else {
                    PyType::Int
                };
                Some(Term::Num(n, ty))
            } else {
                None
            }
        }
        "string" => parse_string_inner(node, src).map(Term::Lit),
        "true" => Some(Term::Lit("True".into())),
        "false" => Some(Term::Lit("False".into())),
        "list" | "tuple" | "set" => {
            let mut items = Vec::new();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if !child.is_named() {
                    continue;
                }
                match child.kind() {
                    "string" => items.push(parse_string_inner(&child, src)?),
                    "integer" | "float" => items.push(node_text(&child, src).to_string()),
                    "true" => items.push("True".into()),
                    "false" => items.push("False".into()),
                    _ => return None,
                }
            }
            Some(Term::LitList(items))
        }
        _ => None,
    }
}

/// Epsilon used to close an open bound: integers step by one, floats by
/// machine epsilon.
fn step_of(ty: PyType) -> f64 {
    match ty {
        PyType::Int => 1.0,
        _ => f64::EPSILON,
    }
}

/// Tighten `(lower, upper)` from the first ordering assert naming the
/// argument. Chains of any length are applied pairwise, so
/// `assert 0 < x <= 10` closes both ends in one pass.
fn bounds_from_asserts(arg: &str, asserts: &[AssertChain]) -> (f64, f64) {
    let mut lower = UNBOUNDED_LOW;
    let mut upper = UNBOUNDED_HIGH;

    for chain in asserts {
        let mut touched = false;
        for i in 0..chain.ops.len() {
            let op = chain.ops[i];
            if !matches!(op, CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge) {
                continue;
            }
            match (&chain.terms[i], &chain.terms[i + 1]) {
                (Term::Name(n), Term::Num(c, cty)) if n == arg => {
                    touched = true;
                    match op {
                        CmpOp::Gt => lower = c + step_of(*cty),
                        CmpOp::Ge => lower = *c,
                        CmpOp::Lt => upper = c - step_of(*cty),
                        CmpOp::Le => upper = *c,
                        _ => {}
                    }
                }
                (Term::Num(c, cty), Term::Name(n)) if n == arg => {
                    touched = true;
                    match op {
                        CmpOp::Gt => upper = c - step_of(*cty),
                        CmpOp::Ge => upper = *c,
                        CmpOp::Lt => lower = c + step_of(*cty),
                        CmpOp::Le => lower = *c,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        if touched {
            break; // first matching assert wins
        }
    }

    (lower, upper)
}

/// Comma-joined enumeration from the first equality/membership assert naming
/// the argument. Leaves bounds untouched at their sentinels.
fn values_from_asserts(arg: &str, asserts: &[AssertChain]) -> String {
    for chain in asserts {
        for i in 0..chain.ops.len() {
            let (left, right) = (&chain.terms[i], &chain.terms[i + 1]);
            match chain.ops[i] {
                CmpOp::Eq => {
                    let lit = match (left, right) {
                        (Term::Name(n), Term::Lit(v)) if n == arg => Some(v.clone()),
                        (Term::Lit(v), Term::Name(n)) if n == arg => Some(v.clone()),
                        (Term::Name(n), Term::Num(v, _)) if n == arg => Some(format_num(*v)),
                        (Term::Num(v, _), Term::Name(n)) if n == arg => Some(format_num(*v)),
                        _ => None,
                    };
                    if let Some(lit) = lit {
                        return lit;
                    }
                }
                CmpOp::In => {
                    if let (Term::Name(n), Term::LitList(items)) = (left, right)
                        && n == arg
                        && !items.is_empty()
                    {
                        return items.join(",");
                    }
                }
                _ => {}
            }
        }
    }
    String::new()
}

fn format_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

// ---------------------------------------------------------------------------
// Literal parsing
// ---------------------------------------------------------------------------

fn parse_literal(node: &Node, src: &[u8]) -> Option<DefaultValue> {
    match node.kind() {
        "none" => Some(DefaultValue::None),
        "true" => Some(DefaultValue::Bool(true)),
        "false" => Some(DefaultValue::Bool(false)),
        "integer" => node_text(node, src).parse::<i64>().ok().map(DefaultValue::Int),
        "float" => node_text(node, src).parse::<f64>().ok().map(DefaultValue::Float),
        "string" | "concatenated_string" => parse_string_inner(node, src).map(DefaultValue::Str),
        "unary_operator" => {
            let text = node_text(node, src).trim().to_string();
            if let Ok(n) = text.parse::<i64>() {
                Some(DefaultValue::Int(n))
            } else if let Ok(f) = text.parse::<f64>() {
                Some(DefaultValue::Float(f))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn parse_string_inner(node: &Node, src: &[u8]) -> Option<String> {
    let text = node_text(node, src);
    let inner = if text.starts_with("\"\"\"") || text.starts_with("'''") {
        &text[3..text.len().checked_sub(3)?]
    } else if text.starts_with('"') || text.starts_with('\'') {
        &text[1..text.len().checked_sub(1)?]
    } else {
        return None;
    };
    Some(inner.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const MVC_SOURCE: &str = r#"
class Student:
    def __init__(self, sid: str, name: str):
        self.sid = sid
        self.name = name

    def get_sid(self) -> str:
        return self.sid

    def get_name(self) -> str:
        return self.name

class StudentController:
    def __init__(self, model: Student):
        self.model = model

    def set_name(self, name: str):
        self.model.name = name

    def get_name(self) -> str:
        return self.model.get_name()
"#;

    fn scan_ok(source: &str) -> ScanOutcome {
        scan(source).unwrap()
    }

    #[test]
    fn splits_models_from_controllers() {
        let outcome = scan_ok(MVC_SOURCE);
        let student = outcome.class("Student").unwrap();
        assert!(!student.exposed, "intrinsic ctor params denote a Model");
        let controller = outcome.class("StudentController").unwrap();
        assert!(controller.exposed, "class-ref ctor params denote a Controller");
        assert_eq!(
            controller.ctor_params,
            vec![("model".to_string(), ParamType::Class("Student".into()))]
        );
    }

    #[test]
    fn emits_rows_in_pre_order() {
        let outcome = scan_ok(MVC_SOURCE);
        let names: Vec<&str> = outcome
            .table
            .methods()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["get_sid", "get_name", "set_name", "get_name"]);
        // No row for any __init__.
        assert!(outcome.table.methods().all(|m| m.name != "__init__"));
    }

    #[test]
    fn attribute_call_return_is_flagged() {
        let outcome = scan_ok(MVC_SOURCE);
        let row = outcome
            .table
            .rows
            .iter()
            .filter_map(|r| match r {
                FeatureRow::Return(r) if r.class_name == "StudentController" => Some(r),
                _ => None,
            })
            .next()
            .unwrap();
        assert_eq!(row.origin, ReturnOrigin::AttributeCall);
        assert_eq!(row.name, "self.model.get_name");
    }

    #[test]
    fn missing_constructor_is_structural() {
        let source = "class Broken:\n    def run(self):\n        pass\n";
        let err = scan(source).unwrap_err();
        assert!(matches!(
            err,
            Error::Structural(StructuralError::MissingConstructor { .. })
        ));
    }

    #[test]
    fn syntax_error_is_fatal() {
        let err = scan("class :::\n").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn strict_lower_bound_is_epsilon_adjusted() {
        let source = r#"
class Model:
    def __init__(self, seed: int):
        self.seed = seed

class Controller:
    def __init__(self, model: Model):
        self.model = model

    def resize(self, x: int):
        assert x > 5
        self.model.seed = x
"#;
        let outcome = scan_ok(source);
        let arg = outcome
            .table
            .rows
            .iter()
            .find_map(|r| match r {
                FeatureRow::Argument(a) if a.name == "x" => Some(a),
                _ => None,
            })
            .unwrap();
        assert!(arg.lower > 5.0, "strict bound must exceed the literal");
        assert_eq!(arg.lower, 6.0);
        assert_eq!(arg.upper, UNBOUNDED_HIGH, "upper stays at the sentinel");
    }

    #[test]
    fn chained_assert_closes_both_ends() {
        let source = r#"
class M:
    def __init__(self, v: float):
        self.v = v

class C:
    def __init__(self, m: M):
        self.m = m

    def blend(self, ratio: float):
        assert 0.0 <= ratio <= 1.0
        self.m.v = ratio
"#;
        let outcome = scan_ok(source);
        let arg = outcome
            .table
            .rows
            .iter()
            .find_map(|r| match r {
                FeatureRow::Argument(a) if a.name == "ratio" => Some(a),
                _ => None,
            })
            .unwrap();
        assert_eq!(arg.lower, 0.0);
        assert_eq!(arg.upper, 1.0);
    }

    #[test]
    fn membership_assert_enumerates_values() {
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
        let outcome = scan_ok(source);
        let arg = outcome
            .table
            .rows
            .iter()
            .find_map(|r| match r {
                FeatureRow::Argument(a) if a.name == "mode" => Some(a),
                _ => None,
            })
            .unwrap();
        assert_eq!(arg.possible_values, "fast,slow,off");
        assert_eq!(arg.lower, UNBOUNDED_LOW, "enumerations leave bounds alone");
        assert_eq!(arg.upper, UNBOUNDED_HIGH);
    }

    #[test]
    fn untyped_default_infers_type() {
        let source = r#"
class M:
    def __init__(self, n: int):
        self.n = n

class C:
    def __init__(self, m: M):
        self.m = m

    def scale(self, factor=2.5):
        self.m.n = factor
"#;
        let outcome = scan_ok(source);
        let arg = outcome
            .table
            .rows
            .iter()
            .find_map(|r| match r {
                FeatureRow::Argument(a) if a.name == "factor" => Some(a),
                _ => None,
            })
            .unwrap();
        assert_eq!(arg.ty, PyType::Float);
        assert_eq!(arg.default, Some(DefaultValue::Float(2.5)));
    }

    #[test]
    fn tuple_return_yields_one_row_per_element() {
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
        let outcome = scan_ok(source);
        let describe = outcome
            .table
            .methods()
            .find(|m| m.name == "describe")
            .unwrap();
        assert_eq!(
            describe.returns,
            ReturnSignature::Tuple(vec![PyType::Str, PyType::Int]),
            "the annotation itself must parse as a tuple signature"
        );
        let rets: Vec<_> = outcome
            .table
            .rows
            .iter()
            .filter_map(|r| match r {
                FeatureRow::Return(r) if r.class_name == "C" => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(rets.len(), 2);
        assert_eq!(rets[0].name, "label");
        assert_eq!(rets[0].ty, PyType::Str);
        assert_eq!(rets[1].name, "count");
        assert_eq!(rets[1].ty, PyType::Int);
    }

    #[test]
    fn tuple_arity_mismatch_is_rejected() {
        let source = r#"
class M:
    def __init__(self, n: int):
        self.n = n

class C:
    def __init__(self, m: M):
        self.m = m

    def describe(self) -> tuple[str, int]:
        return 'only one'
"#;
        let err = scan(source).unwrap_err();
        assert!(matches!(
            err,
            Error::Structural(StructuralError::ReturnArityMismatch {
                declared: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn constant_return_gets_a_synthetic_name() {
        let source = r#"
class M:
    def __init__(self, n: int):
        self.n = n

class C:
    def __init__(self, m: M):
        self.m = m

    def version(self) -> str:
        return 'v2'
"#;
        let outcome = scan_ok(source);
        let ret = outcome
            .table
            .rows
            .iter()
            .find_map(|r| match r {
                FeatureRow::Return(r) if r.class_name == "C" => Some(r),
                _ => None,
            })
            .unwrap();
        assert_eq!(ret.name, "unnamed_v2");
        assert_eq!(ret.origin, ReturnOrigin::Constant);
    }
}
