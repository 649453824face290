//! Statistics over every source in a pipeline

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::config::{BuildConfig, PipelineConfig, RasterStatsConfig, ScratchDir};
use crate::errors::{RasterError, RasterResult};
use crate::utils::progress::ProgressTracker;

pub struct StatsCommand {
    pipeline: PathBuf,
    output: Option<String>,
    sample_prob: Option<f64>,
    show_progress: bool,
}

impl StatsCommand {
    pub fn new(args: &ArgMatches) -> RasterResult<Self> {
        let pipeline = args
            .get_one::<String>("pipeline")
            .ok_or_else(|| RasterError::InvalidConfig("missing pipeline file".to_string()))?;
        Ok(StatsCommand {
            pipeline: PathBuf::from(pipeline),
            output: args.get_one::<String>("output").cloned(),
            sample_prob: args.get_one::<f64>("sample-prob").copied(),
            show_progress: !args.get_flag("quiet"),
        })
    }

    /// The `[stats]` table with command line overrides applied
    fn stats_config(&self, pipeline: &PipelineConfig) -> RasterResult<RasterStatsConfig> {
        let mut config = match (&pipeline.stats, &self.output) {
            (Some(config), _) => config.clone(),
            (None, Some(output)) => RasterStatsConfig::new(output.clone()),
            (None, None) => {
                return Err(RasterError::InvalidConfig(
                    "no [stats] table in the pipeline and no --output given".to_string(),
                ))
            }
        };
        if let Some(output) = &self.output {
            config.output_uri = output.clone();
        }
        if let Some(p) = self.sample_prob {
            config.sample.sample_prob = Some(p);
        }
        Ok(config)
    }
}

impl Command for StatsCommand {
    fn execute(&self) -> RasterResult<()> {
        let pipeline = PipelineConfig::from_file(&self.pipeline)?;
        let scratch = ScratchDir::temporary()?;
        let analyzer = self.stats_config(&pipeline)?.build(&scratch)?;
        let mut sources = pipeline.build_sources(&scratch)?;

        let mut tracker = if self.show_progress {
            ProgressTracker::new("Computing statistics")
        } else {
            ProgressTracker::hidden()
        };
        let stats = analyzer.run_with(&mut sources, |p| tracker.update(p))?;
        tracker.finish();

        for (channel, (mean, std)) in stats.means.iter().zip(&stats.stds).enumerate() {
            info!("  Channel {}: mean {:.4}, std {:.4}", channel, mean, std);
        }
        info!("Saved statistics to {}", analyzer.output_uri());
        Ok(())
    }
}
