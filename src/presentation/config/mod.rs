mod settings;

pub use settings::{
    GoogleSettings, LlmSettings, PipelineSettings, RoutingSettings, SamplingSettings,
    ServerSettings, Settings, parse_base_prompt_ids,
};
