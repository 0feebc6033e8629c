//! Editable project session.
//!
//! Replaces widget-bound global lists with an owned builder: every edit
//! returns the updated collection, and [`ProjectSession::build`] hands out a
//! validated, immutable [`ProjectConfig`].

use std::path::PathBuf;

use crate::project::{EffectSet, MaterialKind, ProjectConfig, ProjectError};

/// A project under edit.
#[derive(Debug, Clone)]
pub struct ProjectSession {
    config: ProjectConfig,
}

impl ProjectSession {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: ProjectConfig::new(name),
        }
    }

    pub fn from_config(config: ProjectConfig) -> Self {
        Self { config }
    }

    /// Append a material unless it is already listed in that category.
    pub fn add(&mut self, kind: MaterialKind, path: impl Into<PathBuf>) -> &[PathBuf] {
        let path = path.into();
        let list = self.config.materials.get_mut(kind);
        if !list.contains(&path) {
            list.push(path);
        }
        self.config.touch();
        self.config.materials.get(kind)
    }

    pub fn remove(&mut self, kind: MaterialKind, index: usize) -> Result<&[PathBuf], ProjectError> {
        let list = self.config.materials.get_mut(kind);
        if index >= list.len() {
            return Err(out_of_range(kind.as_str(), index, list.len()));
        }
        list.remove(index);
        self.config.touch();
        Ok(self.config.materials.get(kind))
    }

    pub fn add_extra(&mut self, reference: impl Into<String>) -> &[String] {
        let reference = reference.into();
        let trimmed = reference.trim();
        if !trimmed.is_empty() {
            self.config.extras.push(trimmed.to_string());
            self.config.touch();
        }
        &self.config.extras
    }

    pub fn remove_extra(&mut self, index: usize) -> Result<&[String], ProjectError> {
        if index >= self.config.extras.len() {
            return Err(out_of_range("extra", index, self.config.extras.len()));
        }
        self.config.extras.remove(index);
        self.config.touch();
        Ok(&self.config.extras)
    }

    pub fn set_clip_count(&mut self, clip_count: u32) -> Result<(), ProjectError> {
        if clip_count == 0 {
            return Err(ProjectError::ValidationError {
                message: "clip_count must be at least 1".to_string(),
            });
        }
        self.config.clip_count = clip_count;
        self.config.touch();
        Ok(())
    }

    pub fn effects_mut(&mut self) -> &mut EffectSet {
        &mut self.config.effects
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Finish editing and return a validated configuration.
    pub fn build(self) -> Result<ProjectConfig, ProjectError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn out_of_range(label: &str, index: usize, len: usize) -> ProjectError {
    ProjectError::ValidationError {
        message: format!("{label} index {index} out of range (have {len})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_dedupes_within_category() {
        let mut session = ProjectSession::new("s");
        session.add(MaterialKind::Video, "/a.mp4");
        let videos = session.add(MaterialKind::Video, "/a.mp4").to_vec();
        assert_eq!(videos, vec![PathBuf::from("/a.mp4")]);

        // Same path in a different category is a different material.
        let gifs = session.add(MaterialKind::Gif, "/a.mp4");
        assert_eq!(gifs.len(), 1);
    }

    #[test]
    fn test_remove_returns_updated_list() {
        let mut session = ProjectSession::new("s");
        session.add(MaterialKind::Sound, "/1.wav");
        session.add(MaterialKind::Sound, "/2.wav");
        session.add(MaterialKind::Sound, "/3.wav");

        let remaining = session.remove(MaterialKind::Sound, 1).unwrap();
        assert_eq!(
            remaining,
            &[PathBuf::from("/1.wav"), PathBuf::from("/3.wav")]
        );
        assert!(session.remove(MaterialKind::Sound, 5).is_err());
    }

    #[test]
    fn test_extras_keep_order_and_skip_blank() {
        let mut session = ProjectSession::new("s");
        session.add_extra("https://example.com/a");
        session.add_extra("   ");
        session.add_extra(" /local/b.mp4 ");
        assert_eq!(
            session.config().extras,
            vec!["https://example.com/a".to_string(), "/local/b.mp4".to_string()]
        );

        let remaining = session.remove_extra(0).unwrap();
        assert_eq!(remaining, &["/local/b.mp4".to_string()]);
        assert!(session.remove_extra(3).is_err());
    }

    #[test]
    fn test_build_validates() {
        let mut session = ProjectSession::new("s");
        assert!(session.set_clip_count(0).is_err());
        session.effects_mut().pitch_semitones = 20;
        assert!(session.build().is_err());

        let mut session = ProjectSession::new("s");
        session.effects_mut().stutter = true;
        session.set_clip_count(3).unwrap();
        let config = session.build().unwrap();
        assert!(config.effects.stutter);
        assert_eq!(config.clip_count, 3);
    }

    proptest! {
        #[test]
        fn prop_add_keeps_first_occurrence_order(names in proptest::collection::vec("[a-d]", 0..20)) {
            let mut session = ProjectSession::new("p");
            for name in &names {
                session.add(MaterialKind::Video, format!("/{name}.mp4"));
            }

            let mut expected: Vec<PathBuf> = Vec::new();
            for name in &names {
                let path = PathBuf::from(format!("/{name}.mp4"));
                if !expected.contains(&path) {
                    expected.push(path);
                }
            }
            prop_assert_eq!(&session.config().materials.videos, &expected);
        }
    }
}
