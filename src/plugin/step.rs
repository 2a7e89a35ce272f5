use std::fmt;
use std::path::{Path, PathBuf};

use crate::model::config::{KwinScriptConfig, ToolsConfig};
use crate::plugin::metadata::PluginMetadata;
use crate::process::quote_arg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Uninstall,
    Package,
    Enable,
    Reload,
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Uninstall => "uninstall",
            StepKind::Package => "package",
            StepKind::Enable => "enable",
            StepKind::Reload => "reload",
        }
    }

    /// Status line printed before the step runs.
    pub fn announcement(&self) -> &'static str {
        match self {
            StepKind::Uninstall => "Uninstall old kwin script",
            StepKind::Package => "Package kwin script",
            StepKind::Enable => "Enable kwin script",
            StepKind::Reload => "Reload kwin",
        }
    }

    /// Status line printed after the step succeeds.
    pub fn success_message(&self) -> &'static str {
        match self {
            StepKind::Uninstall => "Successfully uninstalled old kwin script",
            StepKind::Package => "Successfully packaged kwin script",
            StepKind::Enable => "Successfully enabled kwin script",
            StepKind::Reload => "Successfully reloaded kwin",
        }
    }

    /// What the step attempted, phrased for a "Failed to ..." line.
    pub fn failure_subject(&self) -> &'static str {
        match self {
            StepKind::Uninstall => "uninstall old kwin script",
            StepKind::Package => "package kwin script",
            StepKind::Enable => "enable kwin script",
            StepKind::Reload => "reload kwin",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One external command of the install sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStep {
    pub kind: StepKind,
    pub command: String,
    pub fatal_on_error: bool,
}

/// Ordered steps for installing one plugin, plus the archive they produce.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub artifact: PathBuf,
    pub steps: Vec<InstallStep>,
}

impl InstallPlan {
    /// Uninstall (non-fatal), package, enable, reload, in that order.
    pub fn for_plugin(
        metadata: &PluginMetadata,
        script: &KwinScriptConfig,
        tools: &ToolsConfig,
        source_tree: &Path,
        build_target: &Path,
    ) -> Self {
        let id = metadata.id.as_str();
        let artifact = build_target.join(format!("{id}.{}", script.archive_extension));
        let source = source_tree.to_string_lossy();

        let steps = vec![
            InstallStep {
                kind: StepKind::Uninstall,
                command: format!(
                    "{} --type={} -r {}",
                    tools.package_tool,
                    quote_arg(&script.package_kind),
                    quote_arg(id)
                ),
                fatal_on_error: false,
            },
            InstallStep {
                kind: StepKind::Package,
                command: format!(
                    "{} -r {} {}",
                    tools.archiver,
                    quote_arg(&artifact.to_string_lossy()),
                    quote_arg(&source)
                ),
                fatal_on_error: true,
            },
            InstallStep {
                kind: StepKind::Enable,
                command: format!(
                    "{} --file {} --group Plugins --key {} true",
                    tools.config_writer,
                    quote_arg(&script.config_file),
                    quote_arg(&format!("{id}Enabled"))
                ),
                fatal_on_error: true,
            },
            InstallStep {
                kind: StepKind::Reload,
                command: format!(
                    "{} {} {} reconfigure",
                    tools.ipc_tool,
                    quote_arg(&tools.ipc_service),
                    quote_arg(&tools.ipc_object)
                ),
                fatal_on_error: true,
            },
        ];

        Self { artifact, steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::AppConfig;
    use crate::plugin::metadata::PluginMetadata;
    use std::fs;
    use tempfile::TempDir;

    fn sample_plan() -> InstallPlan {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("metadata.json"),
            r#"{"KPlugin":{"Id":"sample.plugin"}}"#,
        )
        .unwrap();
        let metadata = PluginMetadata::load(dir.path()).unwrap();
        let config = AppConfig::defaults();

        InstallPlan::for_plugin(
            &metadata,
            &config.kwin_script,
            &config.tools,
            Path::new("scripts/sample"),
            Path::new("scripts/dist"),
        )
    }

    #[test]
    fn steps_run_in_fixed_order_and_only_uninstall_is_forgiving() {
        let plan = sample_plan();

        let kinds: Vec<(StepKind, bool)> = plan
            .steps
            .iter()
            .map(|step| (step.kind, step.fatal_on_error))
            .collect();
        assert_eq!(
            kinds,
            [
                (StepKind::Uninstall, false),
                (StepKind::Package, true),
                (StepKind::Enable, true),
                (StepKind::Reload, true),
            ]
        );
    }

    #[test]
    fn commands_substitute_the_plugin_id() {
        let plan = sample_plan();
        let commands: Vec<&str> = plan.steps.iter().map(|step| step.command.as_str()).collect();

        assert_eq!(plan.artifact, PathBuf::from("scripts/dist/sample.plugin.kwinscript"));
        assert_eq!(
            commands,
            [
                "kpackagetool6 --type=KWin/Script -r sample.plugin",
                "zip -r scripts/dist/sample.plugin.kwinscript scripts/sample",
                "kwriteconfig6 --file kwinrc --group Plugins --key sample.pluginEnabled true",
                "qdbus6 org.kde.KWin /KWin reconfigure",
            ]
        );
    }
}
