use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::copy::{self, CopyJob};
use crate::model::config::AppConfig;
use crate::model::progress::CopyProgress;
use crate::output;
use crate::plugin::PluginInstaller;
use crate::process::CommandRunner;

/// Independent pipelines a single invocation can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Wallpaper,
    KwinScript,
    Restart,
    Journal,
}

/// Runs the requested pipelines against one resolved configuration.
pub struct App<R> {
    config: AppConfig,
    runner: R,
}

impl<R: CommandRunner> App<R> {
    pub fn new(config: AppConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Runs `pipelines` in order and stops at the first fatal error.
    pub fn run(&self, pipelines: &[Pipeline]) -> Result<()> {
        for pipeline in pipelines {
            info!(?pipeline, "starting pipeline");
            match pipeline {
                Pipeline::Wallpaper => self.install_wallpaper()?,
                Pipeline::KwinScript => self.install_kwin_script()?,
                Pipeline::Restart => self.restart_shell()?,
                Pipeline::Journal => {
                    warn!("journal follow requested but not available");
                    output::warning("Following the journal is not available; ignoring -j");
                }
            }
        }
        Ok(())
    }

    fn install_wallpaper(&self) -> Result<()> {
        let wallpaper = &self.config.wallpaper;
        output::info("Installing wallpaper plugin");

        let mut job = copy::copy_tree(&wallpaper.source, &wallpaper.target);
        let last = drain_progress(&mut job);
        let summary = job.finish().with_context(|| {
            format!(
                "Failed to copy wallpaper from {} to {}",
                wallpaper.source.display(),
                wallpaper.target.display()
            )
        })?;

        info!(
            files = summary.files,
            bytes = summary.bytes,
            complete = last.is_none_or(|progress| progress.is_complete()),
            "wallpaper copied"
        );
        output::success("Successfully installed wallpaper plugin");
        Ok(())
    }

    fn install_kwin_script(&self) -> Result<()> {
        let script = &self.config.kwin_script;
        let build_target = self.config.build_target();

        let report = PluginInstaller::new(&self.runner, script, &self.config.tools)
            .install(&script.source, &build_target)
            .context("Failed to install kwin script")?;

        for warning in &report.warnings {
            info!(step = %warning.step, message = %warning.message, "step skipped");
        }
        info!(
            plugin = %report.plugin_id,
            artifact = %report.artifact.display(),
            steps = report.completed.len(),
            "kwin script installed"
        );
        Ok(())
    }

    fn restart_shell(&self) -> Result<()> {
        output::info("Restarting plasma");
        self.runner
            .run(&self.config.tools.restart_command)
            .context("Failed to restart plasma")?;
        output::success("Successfully restarted plasma");
        Ok(())
    }
}

/// Prints every snapshot until the worker closes the stream; returns the last one.
fn drain_progress(job: &mut CopyJob) -> Option<CopyProgress> {
    let mut last = None;
    for progress in job {
        println!("{}", output::progress_line(&progress));
        last = Some(progress);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::ConfigOverrides;
    use crate::process::testing::RecordingRunner;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> AppConfig {
        AppConfig::defaults().with_overrides(&ConfigOverrides {
            wallpaper_source: Some(root.join("a2n.blur")),
            wallpaper_target: Some(root.join("plasma/wallpapers/a2n.blur")),
            kwin_script_source: Some(root.join("a2n.blur.ks/a2n.windowSignal")),
            dist_dir: None,
        })
    }

    fn seed_kwin_script(root: &Path) {
        let source = root.join("a2n.blur.ks/a2n.windowSignal");
        fs::create_dir_all(source.join("contents/code")).unwrap();
        fs::write(
            source.join("metadata.json"),
            r#"{"KPlugin":{"Id":"a2n.windowSignal"}}"#,
        )
        .unwrap();
        fs::write(source.join("contents/code/main.js"), "// script\n").unwrap();
    }

    #[test]
    fn wallpaper_pipeline_copies_the_tree() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a2n.blur");
        fs::create_dir_all(source.join("contents/ui")).unwrap();
        fs::write(source.join("metadata.json"), "{}").unwrap();
        fs::write(source.join("contents/ui/main.qml"), "Item {}").unwrap();
        let app = App::new(config_for(dir.path()), RecordingRunner::default());

        app.run(&[Pipeline::Wallpaper]).unwrap();

        let target = dir.path().join("plasma/wallpapers/a2n.blur");
        assert_eq!(
            fs::read_to_string(target.join("contents/ui/main.qml")).unwrap(),
            "Item {}"
        );
    }

    #[test]
    fn wallpaper_copy_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let app = App::new(config_for(dir.path()), RecordingRunner::default());

        let err = app.run(&[Pipeline::Wallpaper, Pipeline::Restart]).unwrap_err();

        assert!(format!("{err:#}").contains("Failed to copy wallpaper"));
        assert!(app.runner.commands().is_empty());
    }

    #[test]
    fn pipelines_run_in_the_given_order() {
        let dir = TempDir::new().unwrap();
        seed_kwin_script(dir.path());
        let app = App::new(config_for(dir.path()), RecordingRunner::default());

        app.run(&[Pipeline::KwinScript, Pipeline::Restart]).unwrap();

        let commands = app.runner.commands();
        assert_eq!(commands.len(), 5);
        assert_eq!(
            commands.last().unwrap(),
            "kquitapp6 plasmashell && kstart plasmashell"
        );
        assert!(dir.path().join("a2n.blur.ks/dist").is_dir());
    }

    #[test]
    fn fatal_install_failure_skips_restart() {
        let dir = TempDir::new().unwrap();
        seed_kwin_script(dir.path());
        let app = App::new(config_for(dir.path()), RecordingRunner::failing_on("qdbus6"));

        let err = app.run(&[Pipeline::KwinScript, Pipeline::Restart]).unwrap_err();

        assert!(format!("{err:#}").contains("reload step failed"));
        assert!(
            !app.runner
                .commands()
                .iter()
                .any(|command| command.starts_with("kquitapp6"))
        );
    }

    #[test]
    fn restart_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let app = App::new(config_for(dir.path()), RecordingRunner::failing_on("kquitapp6"));

        let err = app.run(&[Pipeline::Restart]).unwrap_err();

        assert!(err.to_string().contains("Failed to restart plasma"));
    }

    #[test]
    fn journal_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let app = App::new(config_for(dir.path()), RecordingRunner::default());

        app.run(&[Pipeline::Journal]).unwrap();

        assert!(app.runner.commands().is_empty());
    }
}
