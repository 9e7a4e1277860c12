//! Configuration module for Scout.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AssistantSettings, GeneralSettings, OpenAISettings, RunSettings, Settings, ToolSettings,
};
