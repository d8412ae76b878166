//! Shared pipeline helpers for CLI commands.
//!
//! Project discovery, configuration loading with command-line bindings,
//! operation selection, generalizer construction and diagnostic rendering.

use std::path::{Path, PathBuf};

use revcost_config::{load_config_file, resolve_op, CostingConfig, GeneralizerName, ProjectConfig, ResolvedOp, CONFIG_FILE};
use revcost_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use revcost_resource::{generalizer, CallGraphOptions, Composed};

use crate::GlobalArgs;

/// Installs a stderr `tracing` subscriber: `debug` with `--verbose`,
/// otherwise `warn`, unless `RUST_LOG` says otherwise.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Walks up from `start` looking for the nearest directory containing `revcost.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the configuration file from global CLI args.
///
/// `--config` may name the file or its directory; otherwise the nearest
/// `revcost.toml` above the current directory is used.
pub fn resolve_config_path(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            Ok(if p.is_dir() { p.join(CONFIG_FILE) } else { p })
        }
        None => Ok(find_project_root(&std::env::current_dir()?)?.join(CONFIG_FILE)),
    }
}

/// Loads the project configuration and applies `--bind` overrides.
pub fn load_project(global: &GlobalArgs) -> Result<ProjectConfig, Box<dyn std::error::Error>> {
    let path = resolve_config_path(global)?;
    tracing::debug!(path = %path.display(), "loading configuration");
    let mut config = load_config_file(&path)?;
    for binding in &global.bind {
        let (symbol, value) = parse_binding(binding)?;
        config.bindings.insert(symbol, value);
    }
    Ok(config)
}

/// Parses a `SYMBOL=VALUE` binding.
pub fn parse_binding(s: &str) -> Result<(String, i64), Box<dyn std::error::Error>> {
    let (symbol, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid binding '{s}' (expected SYMBOL=VALUE)"))?;
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(format!("invalid binding '{s}': empty symbol").into());
    }
    let value: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value in binding '{s}'"))?;
    if value < 0 {
        return Err(format!("binding '{s}' must not be negative").into());
    }
    Ok((symbol.to_string(), value))
}

/// Resolves the named operations, or all of them when `names` is empty.
pub fn select_ops(config: &ProjectConfig, names: &[String]) -> Result<Vec<ResolvedOp>, Box<dyn std::error::Error>> {
    let selected: Vec<&String> = if names.is_empty() {
        config.ops.keys().collect()
    } else {
        names.iter().collect()
    };
    Ok(selected
        .into_iter()
        .map(|name| resolve_op(config, name))
        .collect::<Result<_, _>>()?)
}

/// Chains the named generalizers in order.
pub fn build_generalizer(names: &[&str]) -> Result<Composed, Box<dyn std::error::Error>> {
    names.iter().try_fold(Composed::new(), |chain, name| {
        let g = generalizer::named(name).ok_or_else(|| {
            format!(
                "unknown generalizer '{name}' (expected one of: {})",
                generalizer::NAMES.join(", ")
            )
        })?;
        Ok(chain.then(g))
    })
}

/// Names of configured generalizers.
pub fn generalizer_names(names: &[GeneralizerName]) -> Vec<&'static str> {
    names.iter().map(|g| g.as_str()).collect()
}

/// Expansion options from resolved costing settings.
pub fn options(costing: &CostingConfig) -> CallGraphOptions {
    CallGraphOptions {
        max_depth: costing.max_depth,
        parallel: costing.parallel,
    }
}

/// Renders accumulated diagnostics to stderr.
pub fn render_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) {
    let renderer = TerminalRenderer::new(global.color);
    for diag in sink.take_all() {
        if global.quiet && !diag.severity.is_error() {
            continue;
        }
        eprint!("{}", renderer.render(&diag));
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) const PROJECT: &str = r#"
[project]
name = "demo"
version = "0.1.0"

[costing]
generalizers = ["ignore-bookkeeping"]

[ops.adder]
kind = "add"
a_bitwidth = "n"

[ops.mul]
kind = "gf2-multiplication"
bitsize = 4
"#;

    pub(crate) fn global_for(dir: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.to_string_lossy().into_owned()),
            bind: Vec::new(),
        }
    }

    pub(crate) fn project_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), PROJECT).unwrap();
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixtures::{global_for, project_dir};
    use revcost_common::SymInt;
    use revcost_ir::Bloq;
    use revcost_resource::Generalizer;

    #[test]
    fn finds_root_from_subdirectory() {
        let dir = project_dir();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), dir.path());
    }

    #[test]
    fn missing_root_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_project_root(dir.path()).is_err());
    }

    #[test]
    fn config_path_accepts_file_or_dir() {
        let dir = project_dir();
        let by_dir = resolve_config_path(&global_for(dir.path())).unwrap();
        assert_eq!(by_dir, dir.path().join(CONFIG_FILE));
        let by_file = resolve_config_path(&global_for(&dir.path().join(CONFIG_FILE))).unwrap();
        assert_eq!(by_file, by_dir);
    }

    #[test]
    fn bindings_override_config() {
        let dir = project_dir();
        let mut global = global_for(dir.path());
        global.bind = vec!["n=16".to_string()];
        let config = load_project(&global).unwrap();
        let ops = select_ops(&config, &["adder".to_string()]).unwrap();
        assert_eq!(ops[0].bloq.to_string(), "Add(a=16, b=16)");
    }

    #[test]
    fn binding_syntax() {
        assert_eq!(parse_binding("n=8").unwrap(), ("n".to_string(), 8));
        assert_eq!(parse_binding(" m = 4 ").unwrap(), ("m".to_string(), 4));
        assert!(parse_binding("n").is_err());
        assert!(parse_binding("=3").is_err());
        assert!(parse_binding("n=x").is_err());
        assert!(parse_binding("n=-1").is_err());
    }

    #[test]
    fn select_all_or_named() {
        let dir = project_dir();
        let config = load_project(&global_for(dir.path())).unwrap();
        let all = select_ops(&config, &[]).unwrap();
        assert_eq!(all.iter().map(|op| op.name.as_str()).collect::<Vec<_>>(), ["adder", "mul"]);
        assert!(select_ops(&config, &["missing".to_string()]).is_err());
    }

    #[test]
    fn generalizer_chain() {
        let chain = build_generalizer(&["ignore-split-join", "generalize-cvs"]).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.generalize(Bloq::Split { bitwidth: SymInt::lit(2) }), None);
        assert!(build_generalizer(&["nope"]).is_err());
        assert_eq!(generalizer_names(&[GeneralizerName::GeneralizeCvs]), ["generalize-cvs"]);
    }
}
