use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    #[error("{selector} not found")]
    NotFound { selector: String },

    #[error("{selector} is not a valid pattern: {reason}")]
    InvalidPattern { selector: String, reason: String },

    #[error("{selector} not in target folder")]
    OutsideFolder { selector: String },

    #[error("{selector} in target folder")]
    InTargetFolder { selector: String },

    #[error("{} has no exif timestamp", file.display())]
    NoTimestamp { file: PathBuf },

    #[error("cannot process {}: is a directory", file.display())]
    IsDirectory { file: PathBuf },

    #[error("File {file} in folder {} not found in {ref_file}", folder.display())]
    UnknownPicture {
        file: String,
        folder: PathBuf,
        ref_file: String,
    },

    #[error("cannot rename {} to {}: target already exists", from.display(), to.display())]
    TargetExists { from: PathBuf, to: PathBuf },

    #[error("could not {action} {} to {}: {reason}", from.display(), to.display())]
    FileOperation {
        action: String,
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReport {
    pub dry_run: bool,
    pub changes: Vec<Change>,
    pub notices: Vec<Notice>,
}

impl OperationReport {
    pub(crate) fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn absorb(&mut self, other: OperationReport) {
        self.changes.extend(other.changes);
        self.notices.extend(other.notices);
    }
}

/// Receives what the engine has to say while it works.
pub trait Reporter {
    fn notice(&self, notice: &Notice);

    fn planned(&self, from: &str, to: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn notice(&self, notice: &Notice) {
        warn!("{notice}");
    }

    fn planned(&self, from: &str, to: &str) {
        debug!("{from} -> {to}");
    }
}

#[derive(Debug, Default)]
pub struct CollectingReporter {
    notices: RefCell<Vec<Notice>>,
    planned: RefCell<Vec<(String, String)>>,
}

impl CollectingReporter {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn planned_moves(&self) -> Vec<(String, String)> {
        self.planned.borrow().clone()
    }
}

impl Reporter for CollectingReporter {
    fn notice(&self, notice: &Notice) {
        self.notices.borrow_mut().push(notice.clone());
    }

    fn planned(&self, from: &str, to: &str) {
        self.planned
            .borrow_mut()
            .push((from.to_string(), to.to_string()));
    }
}

impl<R: Reporter + ?Sized> Reporter for std::rc::Rc<R> {
    fn notice(&self, notice: &Notice) {
        (**self).notice(notice);
    }

    fn planned(&self, from: &str, to: &str) {
        (**self).planned(from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_picture_names_folder_and_log() {
        let notice = Notice::UnknownPicture {
            file: "xy".to_string(),
            folder: PathBuf::from("/photos"),
            ref_file: "names.log".to_string(),
        };
        assert_eq!(
            notice.to_string(),
            "File xy in folder /photos not found in names.log"
        );
    }

    #[test]
    fn collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::default();
        reporter.notice(&Notice::NotFound {
            selector: "a".to_string(),
        });
        reporter.notice(&Notice::OutsideFolder {
            selector: "../b".to_string(),
        });
        reporter.planned("DSCF0001.JPG", "20180829_152420.jpg");

        let notices = reporter.notices();
        assert_eq!(notices.len(), 2);
        assert!(matches!(notices[1], Notice::OutsideFolder { .. }));
        assert_eq!(
            reporter.planned_moves(),
            vec![(
                "DSCF0001.JPG".to_string(),
                "20180829_152420.jpg".to_string()
            )]
        );
    }
}
