//! Configuration of the subject database.
//!
//! The environment is read exactly once, by [`SubjectsConfig::from_env`] in the binaries.
//! Everything else receives the configuration explicitly.

use log::debug;

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CortexmapError, Result};
use crate::subject::Subject;


#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectsConfig {
    /// Directories searched for subjects, in order.
    pub subjects_dirs: Vec<PathBuf>,
    /// Subject used when none is given on the command line.
    pub default_subject: Option<String>,
}


impl SubjectsConfig {

    /// Build the configuration from the `SUBJECTS_DIR` (colon-separated) and `SUBJECT`
    /// environment variables.
    pub fn from_env() -> SubjectsConfig {
        let subjects_dir = env::var("SUBJECTS_DIR").ok();
        let subject = env::var("SUBJECT").ok();
        SubjectsConfig::from_vars(subjects_dir.as_deref(), subject.as_deref())
    }

    /// Build the configuration from the values of `SUBJECTS_DIR` and `SUBJECT`.
    pub fn from_vars(subjects_dir: Option<&str>, subject: Option<&str>) -> SubjectsConfig {
        let mut config = SubjectsConfig {
            subjects_dirs: Vec::new(),
            default_subject: subject.filter(|s| !s.is_empty()).map(String::from),
        };
        if let Some(dirs) = subjects_dir {
            config.subjects_dirs = split_dirs(dirs);
        }
        config
    }

    /// Add colon-separated directories, searched before the existing ones.
    pub fn add_dirs(&mut self, dirs: &str) {
        let mut added = split_dirs(dirs);
        added.append(&mut self.subjects_dirs);
        self.subjects_dirs = added;
    }

    /// Find a subject by id. An id that is the path of a subject directory is accepted directly.
    pub fn find_subject(&self, id: &str) -> Result<Subject> {
        let direct = Path::new(id);
        if Subject::is_subject_dir(direct) {
            let name = direct
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| id.to_string());
            return Ok(Subject::new(&name, direct));
        }
        for dir in self.subjects_dirs.iter() {
            let candidate = dir.join(id);
            if Subject::is_subject_dir(&candidate) {
                debug!("Found subject '{}' at {}", id, candidate.display());
                return Ok(Subject::new(id, candidate));
            }
        }
        Err(CortexmapError::SubjectNotFound(id.to_string()))
    }

    /// Whether `id` resolves to a subject.
    pub fn is_subject(&self, id: &str) -> bool {
        self.find_subject(id).is_ok()
    }

    /// The subject named by `SUBJECT`.
    pub fn default_subject(&self) -> Result<Subject> {
        match &self.default_subject {
            Some(id) => self.find_subject(id),
            None => Err(CortexmapError::NoSubject),
        }
    }
}


fn split_dirs(dirs: &str) -> Vec<PathBuf> {
    dirs.split(':').filter(|d| !d.is_empty()).map(PathBuf::from).collect()
}


#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn subjects_dirs_are_split_on_colons() {
        let mut config = SubjectsConfig::from_vars(Some("/a:/b::"), Some(""));
        assert_eq!(vec![PathBuf::from("/a"), PathBuf::from("/b")], config.subjects_dirs);
        assert_eq!(None, config.default_subject);

        config.add_dirs("/c");
        let expected = vec![PathBuf::from("/c"), PathBuf::from("/a"), PathBuf::from("/b")];
        assert_eq!(expected, config.subjects_dirs);
    }

    #[test]
    fn subjects_are_found_in_the_first_matching_dir() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::create_dir_all(second.path().join("bert/surf")).unwrap();
        fs::create_dir_all(first.path().join("other/surf")).unwrap();

        let dirs = format!("{}:{}", first.path().display(), second.path().display());
        let config = SubjectsConfig::from_vars(Some(&dirs), Some("bert"));

        let bert = config.find_subject("bert").unwrap();
        assert_eq!("bert", bert.id);
        assert_eq!(second.path().join("bert"), bert.path);
        assert_eq!(bert, config.default_subject().unwrap());
        assert!(config.is_subject("other"));
        assert!(matches!(config.find_subject("ernie"), Err(CortexmapError::SubjectNotFound(_))));
    }

    #[test]
    fn a_subject_path_is_accepted_directly() {
        let dir = tempdir().unwrap();
        let subj_dir = dir.path().join("fsaverage_sym");
        fs::create_dir_all(subj_dir.join("surf")).unwrap();

        let config = SubjectsConfig::default();
        let subj = config.find_subject(subj_dir.to_str().unwrap()).unwrap();
        assert_eq!("fsaverage_sym", subj.id);
        assert_eq!(subj_dir, subj.path);
    }

    #[test]
    fn no_default_subject_is_an_error() {
        let config = SubjectsConfig::default();
        assert!(matches!(config.default_subject(), Err(CortexmapError::NoSubject)));
    }
}
