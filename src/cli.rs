use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::app::Pipeline;
use crate::model::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(
    name = "plasma-deploy",
    version,
    about = "Install the a2n.blur wallpaper and KWin script into Plasma"
)]
pub struct Cli {
    /// Copy the wallpaper plugin into place.
    #[arg(short = 'w', long = "wallpaper")]
    pub wallpaper: bool,

    /// Wallpaper source folder.
    #[arg(long = "ws", value_name = "PATH")]
    pub wallpaper_source: Option<PathBuf>,

    /// Wallpaper target folder.
    #[arg(long = "wt", value_name = "PATH")]
    pub wallpaper_target: Option<PathBuf>,

    /// Package, install and enable the KWin script.
    #[arg(short = 'k', long = "kwin-script")]
    pub kwin_script: bool,

    /// KWin script source folder (contains metadata.json).
    #[arg(long = "ks", value_name = "PATH")]
    pub kwin_script_source: Option<PathBuf>,

    /// Directory the packaged script is written to.
    #[arg(long = "dist", value_name = "PATH")]
    pub dist_dir: Option<PathBuf>,

    /// Restart plasmashell after installing.
    #[arg(short = 'r', long = "restart")]
    pub restart: bool,

    /// Follow the user journal (not available yet).
    #[arg(short = 'j', long = "journal")]
    pub journal: bool,

    /// Config file to use instead of the per-user one.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Raise log file verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Requested pipelines in execution order.
    pub fn pipelines(&self) -> Vec<Pipeline> {
        [
            (self.wallpaper, Pipeline::Wallpaper),
            (self.kwin_script, Pipeline::KwinScript),
            (self.restart, Pipeline::Restart),
            (self.journal, Pipeline::Journal),
        ]
        .into_iter()
        .filter_map(|(requested, pipeline)| requested.then_some(pipeline))
        .collect()
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            wallpaper_source: self.wallpaper_source.clone(),
            wallpaper_target: self.wallpaper_target.clone(),
            kwin_script_source: self.kwin_script_source.clone(),
            dist_dir: self.dist_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pipelines_follow_fixed_order_regardless_of_flag_order() {
        let cli = Cli::try_parse_from(["plasma-deploy", "-r", "-k", "-w"]).unwrap();
        assert_eq!(
            cli.pipelines(),
            [Pipeline::Wallpaper, Pipeline::KwinScript, Pipeline::Restart]
        );
    }

    #[test]
    fn no_flags_selects_nothing() {
        let cli = Cli::try_parse_from(["plasma-deploy"]).unwrap();
        assert!(cli.pipelines().is_empty());
    }

    #[test]
    fn path_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "plasma-deploy",
            "-k",
            "--ks",
            "scripts/a2n.windowSignal",
            "--wt",
            "/tmp/wallpapers/a2n.blur",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(
            overrides.kwin_script_source,
            Some(PathBuf::from("scripts/a2n.windowSignal"))
        );
        assert_eq!(
            overrides.wallpaper_target,
            Some(PathBuf::from("/tmp/wallpapers/a2n.blur"))
        );
        assert!(overrides.wallpaper_source.is_none());
    }

    #[test]
    fn verbosity_counts_repeats() {
        let cli = Cli::try_parse_from(["plasma-deploy", "-vv", "-w"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
