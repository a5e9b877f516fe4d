use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;

use viewsmith::{ExternalClassifier, HeuristicClassifier, Params, WidgetClassifier};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    let (params, src, out, classifier_cmd) = match parse_args(&args) {
        Ok(v) => v,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}");
                eprintln!();
            }
            eprintln!("Usage: viewsmith <MainController> [options]");
            eprintln!();
            eprintln!("Arguments:");
            eprintln!("  <MainController>           Controller class owning the root window");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  --src <dir>                Source directory [default: .]");
            eprintln!("  --out <dir>                Output directory [default: .]");
            eprintln!("  --title <text>             Root window title");
            eprintln!("  --about <text>             Help/About dialog body");
            eprintln!("  --view-threshold <n>       Controllers per view before splitting [default: 3]");
            eprintln!("  --window-threshold <n>     Controls per method before popping out [default: 5]");
            eprintln!("  --show-model-attrs         Display Model attribute passthroughs");
            eprintln!("  --hide-model-attr-methods  Drop pure Model-accessor methods");
            eprintln!("  --classifier <cmd>         External widget classifier command");
            process::exit(2);
        }
    };

    if let Err(e) = run(&params, &src, &out, classifier_cmd.as_deref()) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

type ParsedArgs = (Params, PathBuf, PathBuf, Option<String>);

fn parse_args(args: &[String]) -> Result<ParsedArgs, String> {
    let mut params = Params::default();
    let mut src = PathBuf::from(".");
    let mut out = PathBuf::from(".");
    let mut classifier: Option<String> = None;
    let mut main: Option<String> = None;

    fn value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
        *i += 1;
        args.get(*i)
            .cloned()
            .ok_or_else(|| format!("{flag} requires a value"))
    }

    let mut i = 1; // skip argv[0]
    while i < args.len() {
        match args[i].as_str() {
            "--src" => src = PathBuf::from(value(args, &mut i, "--src")?),
            "--out" => out = PathBuf::from(value(args, &mut i, "--out")?),
            "--title" => params.title = value(args, &mut i, "--title")?,
            "--about" => params.about = value(args, &mut i, "--about")?,
            "--view-threshold" => {
                params.view_threshold = value(args, &mut i, "--view-threshold")?
                    .parse()
                    .map_err(|_| "--view-threshold expects a number".to_string())?;
            }
            "--window-threshold" => {
                params.window_threshold = value(args, &mut i, "--window-threshold")?
                    .parse()
                    .map_err(|_| "--window-threshold expects a number".to_string())?;
            }
            "--show-model-attrs" => params.show_model_attrs = true,
            "--hide-model-attr-methods" => params.hide_model_attr_methods = true,
            "--classifier" => classifier = Some(value(args, &mut i, "--classifier")?),
            "--help" | "-h" => return Err("".to_string()),
            arg if arg.starts_with('-') => return Err(format!("unknown flag: {arg}")),
            arg => {
                if main.is_some() {
                    return Err(format!("unexpected argument: {arg}"));
                }
                main = Some(arg.to_string());
            }
        }
        i += 1;
    }

    params.main_controller = main.ok_or("missing required argument: <MainController>")?;
    Ok((params, src, out, classifier))
}

fn run(params: &Params, src: &Path, out: &Path, classifier_cmd: Option<&str>) -> anyhow::Result<()> {
    let (source, source_files) = viewsmith::load_sources(src)?;
    if source_files.is_empty() {
        anyhow::bail!("no Python sources found under {}", src.display());
    }
    tracing::info!(files = source_files.len(), "loaded source corpus");

    let classifier: Box<dyn WidgetClassifier> = match classifier_cmd {
        Some(cmd) => Box::new(ExternalClassifier::new(cmd)),
        None => Box::new(HeuristicClassifier),
    };

    let generated = viewsmith::run_pipeline(&source, &source_files, params, classifier.as_ref())?;

    std::fs::create_dir_all(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    let init_path = out.join("main.py");
    let view_path = out.join("view.py");
    std::fs::write(&init_path, &generated.init_module)
        .with_context(|| format!("failed to write {}", init_path.display()))?;
    std::fs::write(&view_path, &generated.view_module)
        .with_context(|| format!("failed to write {}", view_path.display()))?;

    tracing::info!(init = %init_path.display(), view = %view_path.display(), "wrote generated modules");
    Ok(())
}
