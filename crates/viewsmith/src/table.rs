//! The flat feature model produced by the scanner.
//!
//! One `FeatureRow` per method, argument and return value, in AST pre-order.
//! The refiner narrows and annotates the table in place; the generator
//! consumes it read-only. Row order is load-bearing: widgets are laid out
//! in table order.

use crate::classify::WidgetKind;

/// Maximum number of arguments / return values captured per method.
pub const ARITY_CAP: usize = 10;

/// Sentinel for "no lower bound". Bounds are always populated, never absent.
pub const UNBOUNDED_LOW: f64 = f64::MIN;
/// Sentinel for "no upper bound".
pub const UNBOUNDED_HIGH: f64 = f64::MAX;

/// Is a lower bound tighter than the unbounded sentinel?
pub fn has_lower_bound(lower: f64) -> bool {
    lower > UNBOUNDED_LOW
}

pub fn has_upper_bound(upper: f64) -> bool {
    upper < UNBOUNDED_HIGH
}

// ---------------------------------------------------------------------------
// Intrinsic Python types
// ---------------------------------------------------------------------------

/// The intrinsic primitive/container kinds the scanner understands.
/// A constructor parameter annotated with one of these denotes a value
/// dependency; anything else is a class reference (a Model dependency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PyType {
    Int,
    Float,
    Complex,
    Bool,
    Str,
    List,
    Tuple,
    Set,
    Dict,
}

impl PyType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "complex" => Some(Self::Complex),
            "bool" => Some(Self::Bool),
            "str" => Some(Self::Str),
            "list" => Some(Self::List),
            "tuple" => Some(Self::Tuple),
            "set" => Some(Self::Set),
            "dict" => Some(Self::Dict),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::Bool => "bool",
            Self::Str => "str",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::Dict => "dict",
        }
    }

    /// Default-construction literal used by the generated init module.
    pub fn zero_literal(self) -> &'static str {
        match self {
            Self::Int => "0",
            Self::Float => "0.0",
            Self::Complex => "complex()",
            Self::Bool => "False",
            Self::Str => "''",
            Self::List => "[]",
            Self::Tuple => "tuple()",
            Self::Set => "set()",
            Self::Dict => "{}",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

// ---------------------------------------------------------------------------
// Default values (parsed from AST literals)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl DefaultValue {
    /// The intrinsic type of this literal, used to infer an argument's type
    /// when it carries no annotation.
    pub fn py_type(&self) -> Option<PyType> {
        match self {
            Self::None => None,
            Self::Bool(_) => Some(PyType::Bool),
            Self::Int(_) => Some(PyType::Int),
            Self::Float(_) => Some(PyType::Float),
            Self::Str(_) => Some(PyType::Str),
        }
    }

    /// Render as a Python source literal.
    pub fn to_python(&self) -> String {
        match self {
            Self::None => "None".into(),
            Self::Bool(true) => "True".into(),
            Self::Bool(false) => "False".into(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    format!("{f}")
                }
            }
            Self::Str(s) => format!("'{s}'"),
        }
    }
}

// ---------------------------------------------------------------------------
// Return signatures and return-expression classification
// ---------------------------------------------------------------------------

/// A method's declared return type: a scalar type, nothing, or an ordered
/// tuple of types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnSignature {
    None,
    Scalar(PyType),
    Tuple(Vec<PyType>),
}

/// How a trailing return expression names its value. `AttributeCall` marks
/// the `object.attribute.method()` shape the refiner treats as a Model
/// attribute passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOrigin {
    Variable,
    AttributeCall,
    Constant,
    Attribute,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MethodRow {
    pub name: String,
    pub class_name: String,
    pub returns: ReturnSignature,
    /// Whether the declaring class is reachable from the view layer
    /// (Controller-like).
    pub exposed: bool,
    /// Ordered (name, type) pairs, at most [`ARITY_CAP`].
    pub arguments: Vec<(String, PyType)>,
    pub return_values: Vec<(String, PyType)>,

    // Refiner annotations.
    /// Menu-triggered action rather than an inline trigger control.
    pub menu: bool,
    /// Routed to a separate popup window instead of the controller's frame.
    pub window: bool,
    pub label: String,
}

impl MethodRow {
    pub fn new(
        name: String,
        class_name: String,
        returns: ReturnSignature,
        exposed: bool,
        arguments: Vec<(String, PyType)>,
        return_values: Vec<(String, PyType)>,
    ) -> Self {
        Self {
            name,
            class_name,
            returns,
            exposed,
            arguments,
            return_values,
            menu: false,
            window: false,
            label: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArgumentRow {
    pub name: String,
    pub ty: PyType,
    /// Closed-interval bounds; [`UNBOUNDED_LOW`]/[`UNBOUNDED_HIGH`] sentinels
    /// when no assertion tightened them.
    pub lower: f64,
    pub upper: f64,
    pub default: Option<DefaultValue>,
    /// Comma-joined enumeration from equality/membership assertions;
    /// empty when unconstrained.
    pub possible_values: String,
    /// Comma-joined names of the methods sharing this exact argument.
    /// Never empty after merging.
    pub belongs_to: String,
    pub class_name: String,

    // Refiner annotations.
    pub widget: Option<WidgetKind>,
    pub label: String,
    pub description: String,
}

impl ArgumentRow {
    pub fn is_shared(&self) -> bool {
        self.belongs_to.contains(',')
    }

    /// Identity used by the merge pass. Two rows with equal keys describe
    /// the same widget.
    pub fn merge_key(&self) -> RowKey {
        RowKey {
            name: self.name.clone(),
            ty: self.ty,
            lower_bits: self.lower.to_bits(),
            upper_bits: self.upper.to_bits(),
            default: self.default.as_ref().map(|d| d.to_python()),
            possible_values: self.possible_values.clone(),
            widget: self.widget,
            class_name: self.class_name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReturnValueRow {
    pub name: String,
    pub ty: PyType,
    pub origin: ReturnOrigin,
    pub belongs_to: String,
    pub class_name: String,

    // Refiner annotations.
    pub widget: Option<WidgetKind>,
    pub label: String,
    pub description: String,
}

impl ReturnValueRow {
    pub fn is_shared(&self) -> bool {
        self.belongs_to.contains(',')
    }

    pub fn merge_key(&self) -> RowKey {
        RowKey {
            name: self.name.clone(),
            ty: self.ty,
            lower_bits: 0,
            upper_bits: 0,
            default: None,
            possible_values: String::new(),
            widget: self.widget,
            class_name: self.class_name.clone(),
        }
    }
}

/// Merge identity for argument/return rows. Bounds are compared bitwise so
/// the sentinel values hash consistently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub name: String,
    pub ty: PyType,
    pub lower_bits: u64,
    pub upper_bits: u64,
    pub default: Option<String>,
    pub possible_values: String,
    pub widget: Option<WidgetKind>,
    pub class_name: String,
}

#[derive(Debug, Clone)]
pub enum FeatureRow {
    Method(MethodRow),
    Argument(ArgumentRow),
    Return(ReturnValueRow),
}

impl FeatureRow {
    pub fn as_method(&self) -> Option<&MethodRow> {
        match self {
            Self::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            Self::Method(m) => &m.class_name,
            Self::Argument(a) => &a.class_name,
            Self::Return(r) => &r.class_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// The flat table, in AST pre-order. Single-owner: each pipeline stage takes
/// it by value and hands it on.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn methods(&self) -> impl Iterator<Item = &MethodRow> {
        self.rows.iter().filter_map(FeatureRow::as_method)
    }

    /// Method rows declared by view-reachable (Controller-like) classes.
    pub fn exposed_methods(&self) -> impl Iterator<Item = &MethodRow> {
        self.methods().filter(|m| m.exposed)
    }
}

// ---------------------------------------------------------------------------
// Class registry (constructor graph, held off-table)
// ---------------------------------------------------------------------------

/// A constructor parameter is either an intrinsic value or a reference to
/// another scanned class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Intrinsic(PyType),
    Class(String),
}

/// Per-class construction info. Constructors emit no feature row; the
/// generator still needs the object construction graph, so the scanner
/// records it here.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    /// Controller-like: every constructor dependency is a class reference.
    pub exposed: bool,
    pub ctor_params: Vec<(String, ParamType)>,
}

impl ClassInfo {
    /// For a controller, the ctor parameter name bound to a given class.
    pub fn param_of_class(&self, class: &str) -> Option<&str> {
        self.ctor_params.iter().find_map(|(name, ty)| match ty {
            ParamType::Class(c) if c == class => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Everything the scanner produces for one source corpus.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub table: FeatureTable,
    /// Declaration order; order matters downstream.
    pub classes: Vec<ClassInfo>,
}

impl ScanOutcome {
    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.iter().find(|c| c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `ControladorEstudiant` → `controlador_estudiant`. Generated variable
/// names use this form consistently across both artifacts.
pub fn snake_case(class_name: &str) -> String {
    let mut out = String::with_capacity(class_name.len() + 4);
    for (i, c) in class_name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// `modificar_nom_estudiant` → `Modificar nom estudiant`.
pub fn humanize(identifier: &str) -> String {
    let spaced = identifier.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    }
}
