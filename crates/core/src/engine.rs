use crate::allocator::allocate;
use crate::config::{DirectoryPolicy, RenamerConfig, RunOptions};
use crate::error::RenameError;
use crate::exif_reader::{ExifTimestampReader, TimestampReader};
use crate::ledger::NameLedger;
use crate::metadata::apply_delta;
use crate::report::{Change, LogReporter, Notice, OperationReport, Reporter};
use crate::selector::{expand, has_wildcards, lands_in, local_pattern, resolve_dir};
use crate::template::render_mask;
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Rename,
    Back,
}

/// Renames pictures of one folder after their capture time, puts them back,
/// or merges pictures from another folder.
pub struct RenameEngine {
    config: RenamerConfig,
    reader: Rc<dyn TimestampReader>,
    reporter: Rc<dyn Reporter>,
}

impl RenameEngine {
    pub fn new(config: RenamerConfig) -> Result<Self, RenameError> {
        config.validate()?;
        Ok(Self {
            config,
            reader: Rc::new(ExifTimestampReader),
            reporter: Rc::new(LogReporter),
        })
    }

    pub fn with_reader(mut self, reader: impl TimestampReader + 'static) -> Self {
        self.reader = Rc::new(reader);
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Rc::new(reporter);
        self
    }

    pub fn config(&self) -> &RenamerConfig {
        &self.config
    }

    pub fn load_names(&self) -> Result<NameLedger, RenameError> {
        NameLedger::load(
            &self.config.folder,
            &self.config.ref_file,
            self.config.folding,
        )
    }

    pub fn rename<S: AsRef<str>>(
        &self,
        selectors: &[S],
        opts: &RunOptions,
    ) -> Result<OperationReport, RenameError> {
        let mut ledger = self.load_names()?;
        let mut report = OperationReport::new(opts.dry_run);
        let mut planned = HashSet::<String>::new();
        let folder = self.config.folder.as_path();
        let folder_id = resolve_dir(folder);
        let folding = self.config.folding;

        for selector in self.selectors_or_default(selectors) {
            let Some(pattern) = local_pattern(folder, &folder_id, &selector) else {
                self.warn(&mut report, Notice::OutsideFolder { selector });
                continue;
            };
            let Some(matches) = self.expand_selector(folder, &pattern, &selector, &mut report)
            else {
                continue;
            };

            for path in matches {
                if path.is_dir() {
                    self.on_directory(&path, Operation::Rename, opts, &mut report)?;
                    continue;
                }
                let Some(name) = file_name(&path) else {
                    continue;
                };
                if folding.same(&name, &self.config.ref_file) {
                    continue;
                }
                let Some(base) = self.candidate_base(&path, opts, &mut report)? else {
                    continue;
                };
                let ext = self.config.ext_mask.as_str();
                if folding.same(&format!("{base}{ext}"), &name) {
                    debug!("{name} already carries its timestamp name");
                    continue;
                }

                let mut occupied = ledger.occupied();
                occupied.extend(planned.iter().cloned());
                let new_name = allocate(&base, ext, &occupied, folding, |n| present(folder, n))?;
                if opts.debug {
                    self.reporter.planned(&name, &new_name);
                }

                if !opts.dry_run {
                    let target = folder.join(&new_name);
                    if let Err(err) = fs::rename(&path, &target) {
                        self.warn(
                            &mut report,
                            file_operation("rename", &path, &target, &err),
                        );
                        continue;
                    }
                    ledger.track_move(&name, &new_name, |n| present(folder, n))?;
                }
                planned.insert(folding.fold(&new_name));
                report.changes.push(Change {
                    from: PathBuf::from(&name),
                    to: PathBuf::from(&new_name),
                });
            }
        }

        self.finish(&ledger, &report, opts, "rename")?;
        Ok(report)
    }

    pub fn back<S: AsRef<str>>(
        &self,
        selectors: &[S],
        opts: &RunOptions,
    ) -> Result<OperationReport, RenameError> {
        let mut ledger = self.load_names()?;
        let mut report = OperationReport::new(opts.dry_run);
        let folder = self.config.folder.as_path();
        let folding = self.config.folding;

        let names = if selectors.is_empty() {
            ledger.keys()
        } else {
            self.back_names(selectors, opts, &mut report)?
        };

        for name in names {
            let Some(original) = ledger.lookup(&name).map(str::to_string) else {
                self.warn(
                    &mut report,
                    Notice::UnknownPicture {
                        file: name,
                        folder: self.config.folder.clone(),
                        ref_file: self.config.ref_file.clone(),
                    },
                );
                continue;
            };
            if opts.debug {
                self.reporter.planned(&name, &original);
            }

            if !opts.dry_run {
                let from = folder.join(&name);
                let to = folder.join(&original);
                if !folding.same(&name, &original) && present(folder, &original) {
                    self.warn(&mut report, Notice::TargetExists { from, to });
                    continue;
                }
                if let Err(err) = fs::rename(&from, &to) {
                    self.warn(&mut report, file_operation("rename", &from, &to, &err));
                    continue;
                }
                ledger.remove(&name);
            }
            report.changes.push(Change {
                from: PathBuf::from(&name),
                to: PathBuf::from(&original),
            });
        }

        self.finish(&ledger, &report, opts, "back")?;
        Ok(report)
    }

    /// Copies pictures from `src_folder` into the managed folder under
    /// their timestamp names. The source files are left alone.
    pub fn merge<S: AsRef<str>>(
        &self,
        selectors: &[S],
        src_folder: &Path,
        opts: &RunOptions,
    ) -> Result<OperationReport, RenameError> {
        let folder = self.config.folder.as_path();
        let folder_id = resolve_dir(folder);
        if resolve_dir(src_folder) == folder_id {
            return Err(RenameError::MergeSameDir {
                folder: folder.to_path_buf(),
            });
        }

        let mut report = OperationReport::new(opts.dry_run);
        let mut accepted = Vec::new();
        for selector in self.selectors_or_default(selectors) {
            if lands_in(src_folder, &selector, &folder_id) {
                self.warn(&mut report, Notice::InTargetFolder { selector });
            } else {
                accepted.push(selector);
            }
        }

        let mut ledger = self.load_names()?;
        let mut planned = HashSet::<String>::new();
        let folding = self.config.folding;

        for selector in accepted {
            let Some(matches) = self.expand_selector(src_folder, &selector, &selector, &mut report)
            else {
                continue;
            };

            for path in matches {
                if path.is_dir() {
                    self.warn(&mut report, Notice::IsDirectory { file: path });
                    continue;
                }
                let Some(name) = file_name(&path) else {
                    continue;
                };
                let Some(base) = self.candidate_base(&path, opts, &mut report)? else {
                    continue;
                };

                let mut occupied = ledger.occupied();
                occupied.extend(planned.iter().cloned());
                let new_name = allocate(&base, &self.config.ext_mask, &occupied, folding, |n| {
                    present(folder, n)
                })?;
                if opts.debug {
                    self.reporter.planned(&path.to_string_lossy(), &new_name);
                }

                if !opts.dry_run {
                    let target = folder.join(&new_name);
                    if let Err(err) = fs::copy(&path, &target) {
                        self.warn(&mut report, file_operation("copy", &path, &target, &err));
                        continue;
                    }
                    ledger.track_copy(&name, &new_name, |n| present(folder, n))?;
                }
                planned.insert(folding.fold(&new_name));
                report.changes.push(Change {
                    from: path,
                    to: PathBuf::from(&new_name),
                });
            }
        }

        self.finish(&ledger, &report, opts, "merge")?;
        Ok(report)
    }

    fn selectors_or_default<S: AsRef<str>>(&self, selectors: &[S]) -> Vec<String> {
        if selectors.is_empty() {
            vec![self.config.src_mask.clone()]
        } else {
            selectors.iter().map(|s| s.as_ref().to_string()).collect()
        }
    }

    fn expand_selector(
        &self,
        base: &Path,
        pattern: &str,
        selector: &str,
        report: &mut OperationReport,
    ) -> Option<Vec<PathBuf>> {
        match expand(base, pattern, self.config.folding) {
            Ok(matches) if matches.is_empty() => {
                self.warn(
                    report,
                    Notice::NotFound {
                        selector: selector.to_string(),
                    },
                );
                None
            }
            Ok(matches) => Some(matches),
            Err(err) => {
                self.warn(
                    report,
                    Notice::InvalidPattern {
                        selector: selector.to_string(),
                        reason: err.msg.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Ledger keys addressed by explicit back selectors. A literal name is
    /// looked up even when no such file exists any more.
    fn back_names<S: AsRef<str>>(
        &self,
        selectors: &[S],
        opts: &RunOptions,
        report: &mut OperationReport,
    ) -> Result<Vec<String>, RenameError> {
        let folder = self.config.folder.as_path();
        let folder_id = resolve_dir(folder);
        let mut names = Vec::new();

        for selector in selectors {
            let selector = selector.as_ref();
            let Some(pattern) = local_pattern(folder, &folder_id, selector) else {
                self.warn(
                    report,
                    Notice::OutsideFolder {
                        selector: selector.to_string(),
                    },
                );
                continue;
            };
            let matches = match expand(folder, &pattern, self.config.folding) {
                Ok(matches) => matches,
                Err(err) => {
                    self.warn(
                        report,
                        Notice::InvalidPattern {
                            selector: selector.to_string(),
                            reason: err.msg.to_string(),
                        },
                    );
                    continue;
                }
            };
            if matches.is_empty() {
                if has_wildcards(&pattern) {
                    self.warn(
                        report,
                        Notice::NotFound {
                            selector: selector.to_string(),
                        },
                    );
                } else {
                    names.push(pattern);
                }
                continue;
            }
            for path in matches {
                if path.is_dir() {
                    self.on_directory(&path, Operation::Back, opts, report)?;
                } else if let Some(name) = file_name(&path) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// Rendered timestamp name without extension, or `None` (with a notice)
    /// when the picture has no usable capture time.
    fn candidate_base(
        &self,
        path: &Path,
        opts: &RunOptions,
        report: &mut OperationReport,
    ) -> Result<Option<String>, RenameError> {
        let timestamp = self
            .reader
            .read_timestamp(path)
            .and_then(|ts| apply_delta(ts, opts.delta));
        let Some(timestamp) = timestamp else {
            self.warn(
                report,
                Notice::NoTimestamp {
                    file: path.to_path_buf(),
                },
            );
            return Ok(None);
        };
        Ok(Some(render_mask(&self.config.dst_mask, &timestamp)?))
    }

    fn on_directory(
        &self,
        dir: &Path,
        operation: Operation,
        opts: &RunOptions,
        report: &mut OperationReport,
    ) -> Result<(), RenameError> {
        match self.config.directory_policy {
            DirectoryPolicy::Skip => {
                self.warn(
                    report,
                    Notice::IsDirectory {
                        file: dir.to_path_buf(),
                    },
                );
                Ok(())
            }
            DirectoryPolicy::Recurse => {
                debug!("descending into {}", dir.display());
                let sub = RenameEngine {
                    config: self.config.for_folder(dir),
                    reader: Rc::clone(&self.reader),
                    reporter: Rc::clone(&self.reporter),
                };
                let none: [&str; 0] = [];
                let sub_report = match operation {
                    Operation::Rename => sub.rename(&none, opts)?,
                    Operation::Back => sub.back(&none, opts)?,
                };
                report.absorb(sub_report);
                Ok(())
            }
        }
    }

    fn finish(
        &self,
        ledger: &NameLedger,
        report: &OperationReport,
        opts: &RunOptions,
        operation: &str,
    ) -> Result<(), RenameError> {
        if !opts.dry_run {
            ledger.save()?;
        }
        info!(
            "{operation} in {}: {} file(s){}, {} notice(s)",
            self.config.folder.display(),
            report.changes.len(),
            if opts.dry_run { " (dry run)" } else { "" },
            report.notices.len()
        );
        Ok(())
    }

    fn warn(&self, report: &mut OperationReport, notice: Notice) {
        self.reporter.notice(&notice);
        report.notices.push(notice);
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn present(folder: &Path, name: &str) -> bool {
    fs::symlink_metadata(folder.join(name)).is_ok()
}

fn file_operation(action: &str, from: &Path, to: &Path, err: &std::io::Error) -> Notice {
    Notice::FileOperation {
        action: action.to_string(),
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        reason: err.to_string(),
    }
}
