//! End-to-end pipeline tests over realistic MVC corpora.

use viewsmith::classify::{FeatureVector, WidgetKind};
use viewsmith::{HeuristicClassifier, Params, Result, WidgetClassifier, load_sources, run_pipeline};

fn params(main: &str) -> Params {
    Params {
        main_controller: main.to_string(),
        ..Params::default()
    }
}

const CATALAN: &str = r#"
class Estudiant:
    def __init__(self, niu: str, nom: str):
        self.niu = niu
        self.nom = nom

    def obtenir_nom(self) -> str:
        return self.nom

    def obtenir_niu(self) -> str:
        return self.niu

class ControladorEstudiant:
    def __init__(self, model: Estudiant, vista: SmartView):
        self.model = model
        self.vista = vista

    def modificar_nom_estudiant(self, nom: str):
        self.model.nom = nom

    def retornar_nom_estudiant(self) -> str:
        return self.model.obtenir_nom()

    def actualitzar_vista(self):
        pass
"#;

fn files(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn catalan_corpus_generates_localized_modules() {
    let p = params("ControladorEstudiant");
    let generated = run_pipeline(CATALAN, &files(&["estudiant"]), &p, &HeuristicClassifier).unwrap();

    // Init module: model from zero literals, controller over the model with
    // the deferred view slot, root view last.
    let init = &generated.init_module;
    assert!(init.contains("from estudiant import *"));
    assert!(init.contains("from view import *"));
    assert!(init.contains("estudiant = Estudiant('', '')"));
    assert!(init.contains("controlador_estudiant = ControladorEstudiant(estudiant, None)"));
    assert!(init.contains("view = View(controlador_estudiant)"));
    assert!(init.contains("controlador_estudiant.vista = view"));
    assert!(init.ends_with("view.run()\n"));

    // View module: Catalan menu strings, the zero-arity method in the File
    // menu, and a working handler for the argument method.
    let view = &generated.view_module;
    assert!(view.contains("menubar.add_cascade(label='Fitxer', menu=file_menu)"));
    assert!(view.contains("file_menu.add_command(label='Sortir', command=self.root.destroy)"));
    assert!(view.contains("label='Actualitzar vista', command=self.on_actualitzar_vista"));
    assert!(view.contains("menubar.add_cascade(label='Ajuda', menu=help_menu)"));
    assert!(view.contains("def on_modificar_nom_estudiant(self):"));
    assert!(view.contains("self.controlador_estudiant.modificar_nom_estudiant(nom)"));
}

#[test]
fn generation_is_byte_identical_across_runs() {
    let p = params("ControladorEstudiant");
    let first = run_pipeline(CATALAN, &files(&["estudiant"]), &p, &HeuristicClassifier).unwrap();
    let second = run_pipeline(CATALAN, &files(&["estudiant"]), &p, &HeuristicClassifier).unwrap();
    assert_eq!(first.init_module, second.init_module);
    assert_eq!(first.view_module, second.view_module);
}

#[test]
fn visible_model_attrs_survive_to_the_view() {
    let mut p = params("ControladorEstudiant");
    p.show_model_attrs = true;
    let generated = run_pipeline(CATALAN, &files(&["estudiant"]), &p, &HeuristicClassifier).unwrap();
    // The passthrough resolves to the Model's own value name.
    assert!(generated.view_module.contains("text='Nom:'"));
}

#[test]
fn corpus_loading_is_sorted_and_skips_generated_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("beta.py"), "class B:\n    pass\n").unwrap();
    std::fs::write(dir.path().join("alpha.py"), "class A:\n    pass\n").unwrap();
    std::fs::write(dir.path().join("main.py"), "print('generated')\n").unwrap();
    std::fs::write(dir.path().join("view.py"), "print('generated')\n").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not python\n").unwrap();

    let (source, names) = load_sources(dir.path()).unwrap();
    assert_eq!(names, vec!["alpha", "beta"]);
    let a = source.find("class A").unwrap();
    let b = source.find("class B").unwrap();
    assert!(a < b, "concatenation follows sorted filename order");
}

struct TruncatingClassifier;

impl WidgetClassifier for TruncatingClassifier {
    fn predict(&self, _rows: &[FeatureVector]) -> Result<Vec<WidgetKind>> {
        Ok(Vec::new())
    }
}

#[test]
fn misaligned_classifier_output_is_rejected() {
    let p = params("ControladorEstudiant");
    let err = run_pipeline(CATALAN, &files(&["estudiant"]), &p, &TruncatingClassifier).unwrap_err();
    assert!(matches!(err, viewsmith::Error::ClassifierMisaligned { .. }));
}

const FOUR_CONTROLLERS: &str = r#"
class Comptador:
    def __init__(self, valor: int):
        self.valor = valor

class ControladorPrincipal:
    def __init__(self, model: Comptador):
        self.model = model

    def reiniciar(self):
        pass

class ControladorSuma:
    def __init__(self, model: Comptador):
        self.model = model

    def sumar(self, quantitat: int):
        self.model.valor = quantitat

class ControladorResta:
    def __init__(self, model: Comptador):
        self.model = model

    def restar(self, quantitat: int):
        self.model.valor = quantitat

class ControladorConsulta:
    def __init__(self, model: Comptador):
        self.model = model

    def consultar(self) -> int:
        return 0
"#;

#[test]
fn over_threshold_corpora_split_into_satellite_views() {
    let p = params("ControladorPrincipal");
    let generated =
        run_pipeline(FOUR_CONTROLLERS, &files(&["comptador"]), &p, &HeuristicClassifier).unwrap();

    let view = &generated.view_module;
    assert!(view.contains("class View_B:"));
    assert!(view.contains("class View_C:"));
    assert!(view.contains("class View_D:"));
    assert!(view.contains("class View:"));
    assert!(view.contains("command=self.view_b.show"));

    // The init module constructs every satellite before the root view.
    let init = &generated.init_module;
    let root = init.find("view = View(").unwrap();
    for satellite in ["view_b = View_B(", "view_c = View_C(", "view_d = View_D("] {
        assert!(init.find(satellite).unwrap() < root);
    }
}

#[test]
fn under_threshold_corpora_share_one_view() {
    let mut p = params("ControladorPrincipal");
    p.view_threshold = 10;
    let generated =
        run_pipeline(FOUR_CONTROLLERS, &files(&["comptador"]), &p, &HeuristicClassifier).unwrap();
    assert!(!generated.view_module.contains("class View_B:"));
    // All four controllers feed the single root view.
    assert!(
        generated
            .init_module
            .contains("view = View(controlador_principal, controlador_suma, controlador_resta, controlador_consulta)")
    );
}

#[test]
fn unscannable_sources_fail_loudly() {
    let p = params("Whatever");
    let err = run_pipeline("class :::\n", &files(&["broken"]), &p, &HeuristicClassifier)
        .unwrap_err();
    assert!(matches!(err, viewsmith::Error::Syntax(_)));
}
