use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::InstallError;
use crate::model::config::{KwinScriptConfig, ToolsConfig};
use crate::output;
use crate::plugin::metadata::{PluginId, PluginMetadata};
use crate::plugin::step::{InstallPlan, InstallStep, StepKind};
use crate::process::CommandRunner;

/// A non-fatal step that failed; the run carried on.
#[derive(Debug, Clone)]
pub struct StepWarning {
    pub step: StepKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub plugin_id: PluginId,
    pub artifact: PathBuf,
    pub completed: Vec<StepKind>,
    pub warnings: Vec<StepWarning>,
}

/// Packages, installs, enables and reloads a KWin script.
///
/// Steps run one after another on the calling thread. A fatal step failure
/// returns immediately and leaves earlier effects in place.
pub struct PluginInstaller<'a, R> {
    runner: R,
    script: &'a KwinScriptConfig,
    tools: &'a ToolsConfig,
}

impl<'a, R: CommandRunner> PluginInstaller<'a, R> {
    pub fn new(runner: R, script: &'a KwinScriptConfig, tools: &'a ToolsConfig) -> Self {
        Self {
            runner,
            script,
            tools,
        }
    }

    pub fn install(
        &self,
        source_tree: &Path,
        build_target: &Path,
    ) -> Result<InstallReport, InstallError> {
        output::info("Installing kwin script");

        let metadata = PluginMetadata::load(source_tree)?;
        info!(
            plugin = %metadata.id,
            descriptor = %metadata.descriptor_path.display(),
            "loaded plugin metadata"
        );

        let plan = InstallPlan::for_plugin(
            &metadata,
            self.script,
            self.tools,
            source_tree,
            build_target,
        );
        let mut report = InstallReport {
            plugin_id: metadata.id.clone(),
            artifact: plan.artifact.clone(),
            completed: Vec::with_capacity(plan.steps.len()),
            warnings: Vec::new(),
        };

        for step in &plan.steps {
            if step.kind == StepKind::Package {
                fs::create_dir_all(build_target).map_err(|source| InstallError::Io {
                    operation: "mkdir",
                    path: build_target.to_path_buf(),
                    source,
                })?;
            }
            self.execute(step, &mut report)?;
        }

        output::success(format!("Successfully installed {}", report.plugin_id));
        Ok(report)
    }

    fn execute(&self, step: &InstallStep, report: &mut InstallReport) -> Result<(), InstallError> {
        output::info(step.kind.announcement());
        info!(step = %step.kind, command = %step.command, "running install step");

        match self.runner.run(&step.command) {
            Ok(_) => {
                output::success(step.kind.success_message());
                report.completed.push(step.kind);
                Ok(())
            }
            Err(err) if !step.fatal_on_error => {
                warn!(step = %step.kind, error = %err, "install step failed, continuing");
                output::warning(format!("Failed to {}: {err}", step.kind.failure_subject()));
                report.warnings.push(StepWarning {
                    step: step.kind,
                    message: err.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                error!(step = %step.kind, error = %err, "install step failed");
                output::error(format!("Failed to {}: {err}", step.kind.failure_subject()));
                Err(InstallError::Step {
                    step: step.kind,
                    source: err,
                })
            }
        }
    }
}
