//! Pair command handler.
//!
//! Implements the `pair` subcommand: the verdict for a single
//! `source --relation--> target` license pair, without any input graph.

use crate::config::AnalysisConfig;
use crate::graph::Relation;
use crate::infer::{PairVerdict, RunContext};
use crate::pipeline::exit_codes;
use anyhow::{Context, Result};

/// Run the pair command, returning the desired exit code.
///
/// Both expressions go through the strict parser unless the configuration
/// enables permissive unknown handling, so a typo in an id is an error
/// rather than a silent `needs-review`.
#[allow(clippy::needless_pass_by_value)]
pub fn run_pair(config: AnalysisConfig, source: &str, target: &str, relation: Relation) -> Result<i32> {
    let ctx = RunContext::new(config).context("failed to prepare analysis")?;
    let parser = ctx.expression_parser();

    let source_expr = parser
        .parse(source)
        .with_context(|| format!("invalid source expression '{source}'"))?;
    let target_expr = parser
        .parse(target)
        .with_context(|| format!("invalid target expression '{target}'"))?;

    let pair = ctx
        .engine()
        .infer_pair(source_expr.expr.as_ref(), target_expr.expr.as_ref(), relation);
    println!("{}", render_pair(source, target, relation, &pair));

    ctx.finish()?;
    Ok(exit_codes::for_verdict(pair.verdict))
}

fn render_pair(source: &str, target: &str, relation: Relation, pair: &PairVerdict) -> String {
    let mut lines = vec![format!("{source} --{relation}--> {target}: {}", pair.verdict)];
    for warning in &pair.warnings {
        lines.push(format!("  warning: {warning}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::{Resolution, Verdict};
    use crate::license::UnknownLicenseWarning;

    #[test]
    fn test_render_pair_with_warning() {
        let pair = PairVerdict {
            verdict: Verdict::NeedsReview,
            resolution: Resolution::Computed,
            warnings: vec![UnknownLicenseWarning::license("Foo-1.0")],
        };
        let text = render_pair("MIT", "Foo-1.0", Relation::LinksStatic, &pair);
        assert!(text.starts_with("MIT --links-static--> Foo-1.0: needs-review"));
        assert!(text.contains("warning:"));
    }

    #[test]
    fn test_pair_exit_code() {
        let code = run_pair(AnalysisConfig::default(), "MIT", "Apache-2.0", Relation::LinksDynamic).unwrap();
        assert_eq!(code, exit_codes::SUCCESS);
    }

    #[test]
    fn test_pair_rejects_unknown_in_strict_mode() {
        assert!(run_pair(AnalysisConfig::default(), "MIT", "Foo-1.0", Relation::Depends).is_err());
    }
}
