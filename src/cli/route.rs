//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cell::{CellState, MediaCell, MediaPipeline, SharingMode};
use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{
    format_config_show, format_generate_result_json, format_generate_result_text,
    format_strip_result_json, format_strip_result_text, format_validation_result,
    GenerateReport, StripReport,
};
use crate::config::{ConfigLoader, VitrineConfig};
use crate::error::MediaError;
use crate::marquee::{Direction, LoopCompositor, SpeedTier};
use crate::provider::ServiceFactory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Runtime context for CLI execution: workspace, merged config and the event loop.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: VitrineConfig,
    runtime: Runtime,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, MediaError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(workspace_root, config_path, config)
    }

    /// Create run context around an already loaded configuration.
    pub fn with_config(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        config: VitrineConfig,
    ) -> Result<Self, MediaError> {
        // Cells and compositors are driven from one cooperative event loop.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            workspace_root,
            config_path,
            config,
            runtime,
        })
    }

    pub fn config(&self) -> &VitrineConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, MediaError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        debug!(
            command = command.name(),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, MediaError> {
        match command {
            Commands::Generate {
                prompt,
                out,
                format,
            } => self.handle_generate(prompt, out.as_deref(), format),
            Commands::Strip {
                prompts,
                speed,
                reverse,
                shared,
                timeout,
                format,
            } => {
                let direction = if *reverse {
                    Direction::Reverse
                } else {
                    Direction::Forward
                };
                let mode = if *shared {
                    SharingMode::Coalesced
                } else {
                    self.config.sharing
                };
                self.handle_strip(
                    prompts,
                    direction,
                    *speed,
                    mode,
                    Duration::from_secs(*timeout),
                    format,
                )
            }
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    fn pipeline(&self, mode: SharingMode) -> Result<MediaPipeline, MediaError> {
        self.validated_config()?;
        let service = ServiceFactory::create_client(&self.config.service)?;
        info!(
            service = service.service_name(),
            model = service.model_name(),
            api_key = self.config.service.api_key_status(),
            sharing = ?mode,
            "Image service ready"
        );
        Ok(MediaPipeline::new(service, self.config.retry, mode))
    }

    fn validated_config(&self) -> Result<(), MediaError> {
        self.config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            MediaError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    fn handle_generate(
        &self,
        prompt: &str,
        out: Option<&Path>,
        format: &str,
    ) -> Result<String, MediaError> {
        let pipeline = self.pipeline(SharingMode::Independent)?;
        let mut report = self.runtime.block_on(async {
            let mut cell = MediaCell::mount(prompt, &pipeline);
            cell.settle().await;
            let report = GenerateReport::from_cell(&cell);
            if let (Some(path), CellState::Ready(asset)) = (out, cell.state()) {
                let bytes = asset.decode()?;
                std::fs::write(path, bytes)?;
            }
            cell.unmount();
            Ok::<_, MediaError>(report)
        })?;

        if report.state == "error" {
            return Err(MediaError::GenerationFailed {
                attempts: report.attempts,
            });
        }
        report.written_to = out.map(|p| p.display().to_string());

        Ok(if format == "json" {
            format_generate_result_json(&report)
        } else {
            format_generate_result_text(&report)
        })
    }

    fn handle_strip(
        &self,
        prompts: &[String],
        direction: Direction,
        speed: SpeedTier,
        mode: SharingMode,
        timeout: Duration,
        format: &str,
    ) -> Result<String, MediaError> {
        let pipeline = self.pipeline(mode)?;
        let prompts: Arc<[String]> = prompts.iter().cloned().collect();
        let timing = self.config.marquee;

        let report = self.runtime.block_on(async {
            let mut compositor =
                LoopCompositor::mount(&pipeline, prompts, direction, speed, timing);
            let timed_out = tokio::time::timeout(timeout, compositor.settle_all())
                .await
                .is_err();
            if timed_out {
                warn!(timeout_secs = timeout.as_secs(), "Strip did not settle in time");
                compositor.refresh_all();
            }
            let report = StripReport::from_compositor(&compositor, timed_out);
            compositor.unmount();
            report
        });

        Ok(if format == "json" {
            format_strip_result_json(&report)
        } else {
            format_strip_result_text(&report)
        })
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, MediaError> {
        match command {
            ConfigCommands::Show { format } => {
                let mut output = format_config_show(&self.config, format)?;
                if format == "toml" {
                    let source = match &self.config_path {
                        Some(path) => path.display().to_string(),
                        None => format!("layered ({})", self.workspace_root.display()),
                    };
                    output = format!("# source: {}\n{}", source, output);
                }
                Ok(output)
            }
            ConfigCommands::Validate => {
                let result = self.config.validate();
                let text = format_validation_result(&result);
                match result {
                    Ok(()) => Ok(text),
                    Err(_) => Err(MediaError::ConfigError(text)),
                }
            }
        }
    }
}
