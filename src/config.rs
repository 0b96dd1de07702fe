//! Pipeline configuration
//!
//! Settings can come from a JSON file; command-line flags are layered on top
//! by the binary before the configuration is turned into pipeline options.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::PaperSize;
use crate::pdf::merge::MergeOptions;
use crate::pdf::normalize::{NormalizeMode, NormalizeSettings};
use crate::pdf::rotate::RotationMap;
use crate::pdf::split::SplitGranularity;

/// Every recognized pipeline option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Paper size used when normalizing
    pub target_paper_size: PaperSize,
    pub normalize_mode: NormalizeMode,
    /// Normalize pages before merging
    pub normalize: bool,
    /// Page position (1-based, in the merged output) to degrees
    pub rotations: BTreeMap<u32, i64>,
    pub split_granularity: SplitGranularity,
    pub output_file_name: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_paper_size: PaperSize::A4,
            normalize_mode: NormalizeMode::FitCentered,
            normalize: false,
            rotations: BTreeMap::new(),
            split_granularity: SplitGranularity::EachPage,
            output_file_name: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON configuration document
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Normalization settings, if normalization is enabled
    pub fn normalize_settings(&self) -> Option<NormalizeSettings> {
        self.normalize.then_some(NormalizeSettings {
            paper: self.target_paper_size,
            mode: self.normalize_mode,
        })
    }

    /// Validated rotations
    pub fn rotation_map(&self) -> Result<RotationMap> {
        let mut map = RotationMap::new();
        for (&page, &degrees) in &self.rotations {
            map.insert(page, degrees)?;
        }
        Ok(map)
    }

    /// Merge options; `default_name` is used when no output name is configured
    pub fn merge_options(&self, default_name: &str) -> Result<MergeOptions> {
        let name = self.output_file_name.as_deref().unwrap_or(default_name);
        let mut options = MergeOptions::new(name).with_rotations(self.rotation_map()?);
        options.normalize = self.normalize_settings();
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::rotate::Rotation;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.target_paper_size, PaperSize::A4);
        assert_eq!(config.normalize_settings(), None);
    }

    #[test]
    fn test_full_config() {
        let config = PipelineConfig::from_json(
            r#"{
                "target_paper_size": "letter",
                "normalize_mode": "crop",
                "normalize": true,
                "rotations": {"2": 90, "5": 270},
                "split_granularity": {"group-of": 4},
                "output_file_name": "handout"
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.normalize_settings(),
            Some(NormalizeSettings { paper: PaperSize::LETTER, mode: NormalizeMode::Crop })
        );
        assert_eq!(config.split_granularity, SplitGranularity::GroupOf(4));

        let options = config.merge_options("ignored.pdf").unwrap();
        assert_eq!(options.output_name, "handout");
        assert_eq!(options.rotations.get(2), Some(Rotation::Clockwise90));
        assert_eq!(options.rotations.get(5), Some(Rotation::Clockwise270));
    }

    #[test]
    fn test_invalid_rotation_in_config() {
        let config = PipelineConfig::from_json(r#"{"rotations": {"1": 45}}"#).unwrap();
        assert!(matches!(config.merge_options("x"), Err(Error::InvalidRotation(45))));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(matches!(PipelineConfig::from_json(r#"{"paper": "a4"}"#), Err(Error::Json(_))));
        assert!(matches!(
            PipelineConfig::from_json(r#"{"target_paper_size": "tabloid"}"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"normalize": true}}"#).unwrap();
        let config = PipelineConfig::load(file.path()).unwrap();
        assert!(config.normalize);
    }
}
