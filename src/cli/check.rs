//! Check command handler.
//!
//! Implements the `check` subcommand: analyze build graphs, SBOMs and scanner
//! output and report license compatibility per edge.

use crate::config::AnalysisConfig;
use crate::infer::RunContext;
use crate::pipeline::{run_analysis, should_use_color, write_output, AnalysisInput, OutputTarget};
use crate::reports::create_reporter_with_options;
use anyhow::{Context, Result};

/// Presentation flags that are not part of [`AnalysisConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    pub no_color: bool,
    pub quiet: bool,
}

/// Run the check command, returning the desired exit code.
///
/// The caller is responsible for calling `std::process::exit()` with the
/// returned code when it is non-zero.
#[allow(clippy::needless_pass_by_value)]
pub fn run_check(config: AnalysisConfig, inputs: Vec<AnalysisInput>, options: CheckOptions) -> Result<i32> {
    let target = OutputTarget::from_option(config.output.file.clone());
    let format = config.output.format;

    let ctx = RunContext::new(config).context("failed to prepare analysis")?;
    let result = run_analysis(&ctx, &inputs).context("analysis failed")?;

    let reporter = create_reporter_with_options(format, should_use_color(options.no_color, &target));
    let rendered = reporter.generate(&result.report)?;
    write_output(&rendered, &target, options.quiet)?;

    if !options.quiet {
        if let Some(path) = &result.saved_knowledge {
            tracing::info!("Knowledge graph saved to {}", path.display());
        }
    }

    Ok(result.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::exit_codes;
    use crate::reports::ReportFormat;

    #[test]
    fn test_check_writes_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("build.json");
        let report = dir.path().join("report.json");
        std::fs::write(
            &input,
            r#"{"targets": {
                "//app:app": {"type": "executable", "license": "MIT", "deps": ["//lib:lib"]},
                "//lib:lib": {"type": "shared_library", "license": "Apache-2.0"}
            }}"#,
        )
        .unwrap();

        let config = AnalysisConfig::builder()
            .output_format(ReportFormat::Json)
            .output_file(Some(report.clone()))
            .build();
        let code = run_check(config, vec![AnalysisInput::detect(&input)], CheckOptions::default()).unwrap();

        assert_eq!(code, exit_codes::SUCCESS);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
        assert_eq!(json["overall"], "compatible");
    }

    #[test]
    fn test_check_reports_missing_input() {
        let config = AnalysisConfig::default();
        let err = run_check(
            config,
            vec![AnalysisInput::detect("/no/such/file.json")],
            CheckOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("analysis failed"));
    }
}
