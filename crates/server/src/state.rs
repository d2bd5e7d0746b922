use dynmap_core::{Config, MosaicPipeline, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: MosaicPipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: MosaicPipeline) -> Self {
        Self { config, pipeline }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pipeline(&self) -> &MosaicPipeline {
        &self.pipeline
    }
}
