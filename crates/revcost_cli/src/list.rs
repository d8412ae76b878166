//! `revcost list`: the operations a project defines.

use revcost_config::{resolve_all, ResolvedOp};

use crate::pipeline::load_project;
use crate::GlobalArgs;

/// Runs the `revcost list` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    if !global.quiet {
        eprintln!("   Listing {} v{}", config.project.name, config.project.version);
    }
    let ops = resolve_all(&config)?;
    print!("{}", render(&ops));
    Ok(0)
}

/// One line per operation: name, node and register widths.
pub fn render(ops: &[ResolvedOp]) -> String {
    let mut out = String::new();
    for op in ops {
        let sig = op.bloq.signature();
        out.push_str(&format!(
            "{}: {} [in: {}, out: {}]\n",
            op.name,
            op.bloq,
            sig.n_input_bits(),
            sig.n_output_bits()
        ));
    }
    out
}
