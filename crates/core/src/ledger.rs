use crate::allocator::{allocate, split_extension};
use crate::config::NameFolding;
use crate::error::RenameError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub new_name: String,
    pub original: String,
}

#[derive(Debug, Clone)]
pub struct NameLedger {
    path: PathBuf,
    folding: NameFolding,
    records: Vec<NameRecord>,
}

impl NameLedger {
    pub fn empty(folder: &Path, ref_file: &str, folding: NameFolding) -> Self {
        Self {
            path: folder.join(ref_file),
            folding,
            records: Vec::new(),
        }
    }

    pub fn load(folder: &Path, ref_file: &str, folding: NameFolding) -> Result<Self, RenameError> {
        let mut ledger = Self::empty(folder, ref_file, folding);
        let file = match fs::File::open(&ledger.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(ledger),
            Err(err) => return Err(RenameError::io(&ledger.path, err)),
        };

        let mut reader = BufReader::new(file);
        let mut line = String::new();
        let mut line_number = 0usize;
        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .map_err(|err| RenameError::io(&ledger.path, err))?;
            if read == 0 {
                break;
            }
            line_number += 1;

            let mut fields = line.split(':');
            let new_name = fields.next().unwrap_or_default().trim();
            let Some(original) = fields.next() else {
                return Err(RenameError::NamesLog {
                    line_number,
                    line: line.clone(),
                });
            };
            ledger.record(new_name, original.trim());
        }

        Ok(ledger)
    }

    pub fn save(&self) -> Result<(), RenameError> {
        if self.records.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(RenameError::io(&self.path, err)),
            };
        }

        let mut body = Vec::new();
        for record in &self.records {
            writeln!(
                body,
                "{}:{}",
                self.folding.fold(&record.new_name),
                record.original
            )
            .map_err(|err| RenameError::io(&self.path, err))?;
        }
        fs::write(&self.path, body).map_err(|err| RenameError::io(&self.path, err))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn folding(&self) -> NameFolding {
        self.folding
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NameRecord] {
        &self.records
    }

    pub fn keys(&self) -> Vec<String> {
        self.records.iter().map(|r| r.new_name.clone()).collect()
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.position(key)
            .map(|index| self.records[index].original.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn contains_original(&self, original: &str) -> bool {
        self.records
            .iter()
            .any(|r| self.folding.same(&r.original, original))
    }

    pub fn record(&mut self, new_name: &str, original: &str) {
        match self.position(new_name) {
            Some(index) => self.records[index].original = original.to_string(),
            None => self.records.push(NameRecord {
                new_name: new_name.to_string(),
                original: original.to_string(),
            }),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.position(key)?;
        Some(self.records.remove(index).original)
    }

    pub fn occupied(&self) -> HashSet<String> {
        self.records
            .iter()
            .flat_map(|r| [&r.new_name, &r.original])
            .map(|name| self.folding.fold(name))
            .collect()
    }

    // A generated name keeps pointing at its true original; a name that is
    // already some record's original gets an alias.
    pub fn track_move<F>(
        &mut self,
        current: &str,
        new_name: &str,
        exists: F,
    ) -> Result<(), RenameError>
    where
        F: FnMut(&str) -> bool,
    {
        if let Some(original) = self.remove(current) {
            self.record(new_name, &original);
            return Ok(());
        }
        let original = if self.contains_original(current) {
            self.alias(current, exists)?
        } else {
            current.to_string()
        };
        self.record(new_name, &original);
        Ok(())
    }

    pub fn track_copy<F>(
        &mut self,
        source_name: &str,
        new_name: &str,
        exists: F,
    ) -> Result<(), RenameError>
    where
        F: FnMut(&str) -> bool,
    {
        if self.folding.same(source_name, new_name) {
            return Ok(());
        }
        let original = self.alias(source_name, exists)?;
        self.record(new_name, &original);
        Ok(())
    }

    fn alias<F>(&self, name: &str, exists: F) -> Result<String, RenameError>
    where
        F: FnMut(&str) -> bool,
    {
        let (stem, ext) = split_extension(name);
        allocate(stem, ext, &self.occupied(), self.folding, exists)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| self.folding.same(&r.new_name, key))
    }
}

#[cfg(test)]
mod tests {
    use super::{NameLedger, NameRecord};
    use crate::config::NameFolding;
    use crate::error::RenameError;
    use std::fs;
    use tempfile::tempdir;

    fn pairs(ledger: &NameLedger) -> Vec<(String, String)> {
        ledger
            .records()
            .iter()
            .map(|r| (r.new_name.clone(), r.original.clone()))
            .collect()
    }

    #[test]
    fn load_reads_records_in_file_order() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("names.log"), "a:b\nc:d\n").expect("write log");

        let ledger =
            NameLedger::load(temp.path(), "names.log", NameFolding::Sensitive).expect("load");
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.lookup("a"), Some("b"));
        assert_eq!(ledger.keys(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn load_reports_line_without_colon() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("names.log"), "a:b\nc\n:d\n").expect("write log");

        let err = NameLedger::load(temp.path(), "names.log", NameFolding::Sensitive)
            .expect_err("line 2 is malformed");
        match err {
            RenameError::NamesLog { line_number, line } => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "c\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_keeps_only_first_two_fields() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("names.log"), " x.jpg : y.jpg : extra\n").expect("write");
        let ledger =
            NameLedger::load(temp.path(), "names.log", NameFolding::Sensitive).expect("load");
        assert_eq!(ledger.lookup("x.jpg"), Some("y.jpg"));
    }

    #[test]
    fn missing_file_is_empty_ledger() {
        let temp = tempdir().expect("tempdir");
        let ledger =
            NameLedger::load(temp.path(), "names.log", NameFolding::Sensitive).expect("load");
        assert!(ledger.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempdir().expect("tempdir");
        let mut ledger = NameLedger::empty(temp.path(), "names.log", NameFolding::Sensitive);
        ledger.record("20180829_152420.jpg", "DSCF9762.JPG");
        ledger.record("20180829_152420a.jpg", "foo");
        ledger.record("20180101_000000.jpg", "bar");
        ledger.save().expect("save");

        let reloaded =
            NameLedger::load(temp.path(), "names.log", NameFolding::Sensitive).expect("load");
        assert_eq!(pairs(&reloaded), pairs(&ledger));
        let raw = fs::read_to_string(temp.path().join("names.log")).expect("read");
        assert_eq!(
            raw,
            "20180829_152420.jpg:DSCF9762.JPG\n20180829_152420a.jpg:foo\n20180101_000000.jpg:bar\n"
        );
    }

    #[test]
    fn save_folds_new_names_when_insensitive() {
        let temp = tempdir().expect("tempdir");
        let mut ledger = NameLedger::empty(temp.path(), "names.log", NameFolding::Insensitive);
        ledger.record("IMG_0001.JPG", "DSCF0001.JPG");
        ledger.save().expect("save");
        let raw = fs::read_to_string(temp.path().join("names.log")).expect("read");
        assert_eq!(raw, "img_0001.jpg:DSCF0001.JPG\n");
        assert_eq!(ledger.lookup("img_0001.jpg"), Some("DSCF0001.JPG"));
    }

    #[test]
    fn empty_ledger_deletes_sidecar() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("names.log");
        fs::write(&path, "a:b\n").expect("write");

        let mut ledger =
            NameLedger::load(temp.path(), "names.log", NameFolding::Sensitive).expect("load");
        assert_eq!(ledger.remove("a"), Some("b".to_string()));
        ledger.save().expect("save");
        assert!(!path.exists());

        ledger.save().expect("saving an empty ledger twice is fine");
    }

    #[test]
    fn record_updates_existing_key_in_place() {
        let temp = tempdir().expect("tempdir");
        let mut ledger = NameLedger::empty(temp.path(), "names.log", NameFolding::Sensitive);
        ledger.record("a", "1");
        ledger.record("b", "2");
        ledger.record("a", "3");
        assert_eq!(
            ledger.records(),
            &[
                NameRecord {
                    new_name: "a".to_string(),
                    original: "3".to_string()
                },
                NameRecord {
                    new_name: "b".to_string(),
                    original: "2".to_string()
                },
            ]
        );
    }

    #[test]
    fn track_move_rekeys_generated_name() {
        let temp = tempdir().expect("tempdir");
        let mut ledger = NameLedger::empty(temp.path(), "names.log", NameFolding::Sensitive);
        ledger.record("b", "a");
        ledger.track_move("b", "c", |_| false).expect("track");
        assert_eq!(pairs(&ledger), vec![("c".to_string(), "a".to_string())]);
    }

    #[test]
    fn track_move_aliases_reused_original() {
        let temp = tempdir().expect("tempdir");
        let mut ledger = NameLedger::empty(temp.path(), "names.log", NameFolding::Sensitive);
        ledger.record("b", "x");
        ledger.track_move("x", "c", |_| false).expect("track");
        assert_eq!(
            pairs(&ledger),
            vec![
                ("b".to_string(), "x".to_string()),
                ("c".to_string(), "xa".to_string())
            ]
        );
    }

    #[test]
    fn track_copy_skips_same_name_and_aliases_known_original() {
        let temp = tempdir().expect("tempdir");
        let mut ledger = NameLedger::empty(temp.path(), "names.log", NameFolding::Sensitive);
        ledger.track_copy("n.jpg", "n.jpg", |_| false).expect("track");
        assert!(ledger.is_empty());

        ledger.record("b", "x");
        ledger.track_copy("x", "c", |_| false).expect("track");
        assert_eq!(ledger.lookup("c"), Some("xa"));
        ledger.track_copy("y", "d", |_| false).expect("track");
        assert_eq!(ledger.lookup("d"), Some("y"));
    }
}
