use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vssr_render::{App, Methods, RenderOptions, Template};

/// Name the entry template is registered under.
pub const ROOT: &str = "root";

const COMPONENT_EXTENSIONS: [&str; 2] = ["vue", "html"];

/// Logs go to stderr so rendered output on stdout stays clean. `RUST_LOG`
/// wins over the verbosity flag when set.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}

/// Reads a JSON object from `path`; no path means no data.
pub fn load_data(path: Option<&Path>) -> Result<Map<String, Value>> {
    let Some(path) = path else {
        return Ok(Map::new());
    };
    let src =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_str(&src).with_context(|| format!("invalid JSON in {}", path.display()))? {
        Value::Object(map) => Ok(map),
        other => bail!(
            "{} must hold a JSON object, found {}",
            path.display(),
            vssr_expr::value::type_name(&other)
        ),
    }
}

/// Every `*.vue` / `*.html` file in `dir`, keyed by file stem, sorted by name.
pub fn component_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| COMPONENT_EXTENSIONS.contains(&e));
        if !path.is_file() || !wanted {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            found.push((stem.to_string(), path.clone()));
        }
    }
    found.sort();
    Ok(found)
}

/// Builds an app whose root is `template`, with the components in
/// `components` loaded from disk the first time they are used.
pub fn build_app(
    template: &Path,
    components: Option<&Path>,
    options: RenderOptions,
) -> Result<App> {
    let src = fs::read_to_string(template)
        .with_context(|| format!("failed to read {}", template.display()))?;

    let mut app = App::new(Methods::new()).with_options(options);
    if let Some(dir) = components {
        for (name, path) in component_files(dir)? {
            tracing::debug!(component = %name, path = %path.display(), "found component");
            app.register_template(
                name,
                Template::try_lazy(move || {
                    fs::read_to_string(&path)
                        .map_err(|e| format!("failed to read {}: {e}", path.display()))
                }),
            );
        }
    }
    app.register_template(ROOT, src);
    Ok(app)
}

/// Renders `template` with the given data file and component directory.
pub fn render_cmd(
    template: &Path,
    data: Option<&Path>,
    components: Option<&Path>,
    options: RenderOptions,
) -> Result<String> {
    let app = build_app(template, components, options)?;
    let data = load_data(data)?;
    app.render_component(ROOT, data)
        .with_context(|| format!("failed to render {}", template.display()))
}

/// Evaluates one expression against a data file and returns its JSON form.
pub fn eval_cmd(expression: &str, data: Option<&Path>) -> Result<String> {
    let app = App::new(Methods::new());
    let value = app
        .evaluate_expression(expression, load_data(data)?)
        .with_context(|| format!("failed to evaluate `{}`", expression.trim()))?;
    Ok(serde_json::to_string(&value)?)
}

/// Writes `output` to `out`, or to stdout when no path is given.
pub fn write_output(output: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            println!("{output}");
            Ok(())
        }
    }
}
