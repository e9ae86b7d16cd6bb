use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use questline_game::{BundledContent, ContentError, ContentLoader, EngineConfig, EventCatalog};

/// Content and tuning read from disk, falling back to the bundled catalog
/// and default configuration for whatever was not supplied.
#[derive(Debug, Clone, Default)]
pub struct FileContent {
    events_json: Option<String>,
    config_json: Option<String>,
}

impl FileContent {
    pub fn from_paths(content: Option<&Path>, config: Option<&Path>) -> Result<Self> {
        Ok(Self {
            events_json: content.map(read_text).transpose()?,
            config_json: config.map(read_text).transpose()?,
        })
    }

    #[cfg(test)]
    fn from_strings(events_json: Option<&str>, config_json: Option<&str>) -> Self {
        Self {
            events_json: events_json.map(str::to_string),
            config_json: config_json.map(str::to_string),
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    log::debug!("reading content from {}", path.display());
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

impl ContentLoader for FileContent {
    type Error = ContentError;

    fn load_catalog(&self) -> Result<EventCatalog, Self::Error> {
        match &self.events_json {
            Some(json) => EventCatalog::from_json(json).inspect_err(|err| {
                log::warn!("event catalog rejected: {err}");
            }),
            None => BundledContent.load_catalog(),
        }
    }

    fn load_config(&self) -> Result<EngineConfig, Self::Error> {
        match &self.config_json {
            Some(json) => Ok(EngineConfig::from_json(json)?),
            None => Ok(EngineConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questline_game::GameEngine;

    #[test]
    fn missing_paths_use_bundled_content() {
        let loader = FileContent::from_paths(None, None).unwrap();
        assert_eq!(
            loader.load_catalog().unwrap(),
            BundledContent.load_catalog().unwrap()
        );
        assert_eq!(loader.load_config().unwrap(), EngineConfig::default());
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let missing = std::env::temp_dir().join("questline-missing-content.json");
        let err = FileContent::from_paths(Some(&missing), None).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let loader = FileContent::from_strings(None, Some(r#"{ "boss_trigger_choices": 3 }"#));
        let engine = GameEngine::new(loader);
        let cfg = engine.config();
        assert_eq!(cfg.boss_trigger_choices, 3);
        assert_eq!(cfg.boss, EngineConfig::default().boss);
    }

    #[test]
    fn broken_files_fall_back_through_the_engine() {
        let loader = FileContent::from_strings(
            Some("not json"),
            Some(r#"{ "boss_trigger_choices": "many" }"#),
        );
        assert!(loader.load_catalog().is_err());
        assert!(loader.load_config().is_err());
        let engine = GameEngine::new(loader);
        assert_eq!(engine.catalog(), EventCatalog::fallback());
        assert_eq!(engine.config(), EngineConfig::default());
    }

    #[test]
    fn custom_catalog_is_loaded_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "questline-content-{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{ "events": { "Lonely Road": { "choices": [ { "text": "Walk", "effects": { "luck": 1 } } ] } } }"#,
        )
        .unwrap();
        let loader = FileContent::from_paths(Some(&path), None).unwrap();
        let catalog = loader.load_catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("Lonely Road").is_some());
        let _ = fs::remove_file(path);
    }
}
