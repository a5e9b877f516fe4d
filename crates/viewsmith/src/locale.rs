//! Locale detection and the localized string tables.
//!
//! Method identifiers vote for a locale; the majority governs every
//! user-facing string the generator emits. Only a small set of locales is
//! supported; an undetectable majority falls back to English, which is a
//! soft condition, never an error.

use crate::table::PyType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Es,
    Ca,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Ca => "ca",
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

// Discriminative vocabulary per locale. Words common to Spanish and Catalan
// appear in both sets; the per-identifier score settles the vote.
const EN_WORDS: &[&str] = &[
    "get", "set", "return", "update", "delete", "add", "remove", "create", "list", "count",
    "find", "save", "show", "print", "name", "student", "new", "change", "fetch", "load",
    "store", "clear", "reset", "toggle", "open", "close", "value", "check",
];

const ES_WORDS: &[&str] = &[
    "obtener", "establecer", "devolver", "retornar", "modificar", "nombre", "estudiante",
    "lista", "contar", "buscar", "guardar", "borrar", "crear", "eliminar", "actualizar",
    "mostrar", "imprimir", "nuevo", "nueva", "agregar", "cambiar", "valor", "contrasena",
];

const CA_WORDS: &[&str] = &[
    "obtenir", "establir", "retornar", "modificar", "nom", "estudiant", "llista", "comptar",
    "cercar", "desar", "esborrar", "crear", "eliminar", "actualitzar", "mostrar", "imprimir",
    "nou", "nova", "afegir", "canviar", "valor", "contrasenya", "vista", "niu",
];

/// Score one identifier (underscore-delimited tokens) against a word set.
fn score(tokens: &[&str], words: &[&str]) -> usize {
    tokens.iter().filter(|t| words.contains(t)).count()
}

/// Which supported locale one identifier most resembles, if any.
fn classify_identifier(identifier: &str) -> Option<Locale> {
    let lowered = identifier.to_lowercase();
    let tokens: Vec<&str> = lowered.split('_').filter(|t| !t.is_empty()).collect();

    let scored = [
        (Locale::En, score(&tokens, EN_WORDS)),
        (Locale::Es, score(&tokens, ES_WORDS)),
        (Locale::Ca, score(&tokens, CA_WORDS)),
    ];

    let best = scored.iter().map(|(_, s)| *s).max().unwrap_or(0);
    if best == 0 {
        return None;
    }
    // First locale reaching the best score wins; keeps ties deterministic.
    scored.iter().find(|(_, s)| *s == best).map(|(l, _)| *l)
}

/// Majority vote over method identifiers. `None` when no supported locale
/// wins; the caller falls back to the base locale.
pub fn detect(identifiers: &[&str]) -> Option<Locale> {
    let mut counts = [0usize; 3]; // en, es, ca
    let mut unknown = 0usize;

    for id in identifiers {
        match classify_identifier(id) {
            Some(Locale::En) => counts[0] += 1,
            Some(Locale::Es) => counts[1] += 1,
            Some(Locale::Ca) => counts[2] += 1,
            None => unknown += 1,
        }
    }

    let best = *counts.iter().max().unwrap_or(&0);
    if best == 0 || unknown > best {
        return None;
    }
    if counts[0] == best {
        Some(Locale::En)
    } else if counts[1] == best {
        Some(Locale::Es)
    } else {
        Some(Locale::Ca)
    }
}

// ---------------------------------------------------------------------------
// String tables
// ---------------------------------------------------------------------------

impl Locale {
    pub fn menu_file(self) -> &'static str {
        match self {
            Self::En => "File",
            Self::Es => "Archivo",
            Self::Ca => "Fitxer",
        }
    }

    pub fn menu_edit(self) -> &'static str {
        match self {
            Self::En => "Edit",
            Self::Es | Self::Ca => "Editar",
        }
    }

    pub fn menu_view(self) -> &'static str {
        match self {
            Self::En => "View",
            Self::Es => "Ver",
            Self::Ca => "Veure",
        }
    }

    pub fn menu_others(self) -> &'static str {
        match self {
            Self::En => "Others",
            Self::Es => "Otros",
            Self::Ca => "Altres",
        }
    }

    pub fn menu_help(self) -> &'static str {
        match self {
            Self::En => "Help",
            Self::Es => "Ayuda",
            Self::Ca => "Ajuda",
        }
    }

    pub fn menu_exit(self) -> &'static str {
        match self {
            Self::En => "Exit",
            Self::Es => "Salir",
            Self::Ca => "Sortir",
        }
    }

    pub fn menu_about(self) -> &'static str {
        match self {
            Self::En => "About...",
            Self::Es => "Acerca de...",
            Self::Ca => "Sobre...",
        }
    }

    pub fn invalid_input_title(self) -> &'static str {
        match self {
            Self::En => "Invalid input",
            Self::Es => "Entrada no válida",
            Self::Ca => "Entrada no vàlida",
        }
    }

    pub fn msg_range(self, label: &str, lower: f64, upper: f64) -> String {
        match self {
            Self::En => format!("{label} must be between {lower} and {upper}"),
            Self::Es => format!("{label} debe estar entre {lower} y {upper}"),
            Self::Ca => format!("{label} ha d'estar entre {lower} i {upper}"),
        }
    }

    pub fn msg_choices(self, label: &str, choices: &str) -> String {
        match self {
            Self::En => format!("{label} must be one of: {choices}"),
            Self::Es => format!("{label} debe ser uno de: {choices}"),
            Self::Ca => format!("{label} ha de ser un de: {choices}"),
        }
    }

    /// Caption of the checkbutton masking a password entry.
    pub fn mask_password(self) -> &'static str {
        match self {
            Self::En => "Hide",
            Self::Es => "Ocultar",
            Self::Ca => "Amagar",
        }
    }

    pub fn msg_password(self) -> &'static str {
        match self {
            Self::En => {
                "Password must be at least 14 characters and mix upper case, lower case, digits and symbols"
            }
            Self::Es => {
                "La contraseña debe tener al menos 14 caracteres y combinar mayúsculas, minúsculas, dígitos y símbolos"
            }
            Self::Ca => {
                "La contrasenya ha de tenir com a mínim 14 caràcters i combinar majúscules, minúscules, dígits i símbols"
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Label prefixes for unnamed constants
// ---------------------------------------------------------------------------

/// Label category for a synthetic "unnamed" constant, chosen from the
/// value's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCategory {
    Result,
    State,
    Message,
    List,
    Dictionary,
}

pub fn category_of(ty: PyType) -> LabelCategory {
    match ty {
        PyType::Int | PyType::Float | PyType::Complex => LabelCategory::Result,
        PyType::Bool => LabelCategory::State,
        PyType::Str => LabelCategory::Message,
        PyType::List | PyType::Tuple | PyType::Set => LabelCategory::List,
        PyType::Dict => LabelCategory::Dictionary,
    }
}

impl LabelCategory {
    pub fn prefix(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Result, Locale::En) => "Result of",
            (Self::Result, Locale::Es) => "Resultado de",
            (Self::Result, Locale::Ca) => "Resultat de",
            (Self::State, Locale::En) => "State of",
            (Self::State, Locale::Es) => "Estado de",
            (Self::State, Locale::Ca) => "Estat de",
            (Self::Message, Locale::En) => "Message of",
            (Self::Message, Locale::Es) => "Mensaje de",
            (Self::Message, Locale::Ca) => "Missatge de",
            (Self::List, Locale::En) => "List of",
            (Self::List, Locale::Es) => "Lista de",
            (Self::List, Locale::Ca) => "Llista de",
            (Self::Dictionary, Locale::En) => "Dictionary of",
            (Self::Dictionary, Locale::Es) => "Diccionario de",
            (Self::Dictionary, Locale::Ca) => "Diccionari de",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalan_identifiers_vote_catalan() {
        let ids = [
            "modificar_nom_estudiant",
            "retornar_nom_estudiant",
            "modificar_niu_estudiant",
            "retornar_niu_estudiant",
            "actualitzar_vista",
        ];
        assert_eq!(detect(&ids), Some(Locale::Ca));
    }

    #[test]
    fn english_identifiers_vote_english() {
        let ids = ["get_name", "set_name", "update_student", "delete_student"];
        assert_eq!(detect(&ids), Some(Locale::En));
    }

    #[test]
    fn gibberish_yields_no_majority() {
        let ids = ["zzz_qqq", "xxqx_bbb", "foo1_bar2"];
        assert_eq!(detect(&ids), None);
    }

    #[test]
    fn category_prefixes_localize() {
        assert_eq!(category_of(PyType::Str), LabelCategory::Message);
        assert_eq!(LabelCategory::Message.prefix(Locale::Ca), "Missatge de");
        assert_eq!(LabelCategory::Result.prefix(Locale::En), "Result of");
    }
}
