use crate::config::NameFolding;
use glob::{glob_with, MatchOptions, Pattern};
use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub(crate) fn has_wildcards(selector: &str) -> bool {
    selector.contains(['*', '?', '['])
}

/// Canonical form of a directory, lexical when it cannot be resolved.
pub(crate) fn resolve_dir(path: &Path) -> PathBuf {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Bare name or pattern of a selector that points into `folder`.
pub(crate) fn local_pattern(folder: &Path, folder_id: &Path, selector: &str) -> Option<String> {
    let path = Path::new(selector);
    let mut components = path.components();
    if let (Some(Component::Normal(name)), None) = (components.next(), components.next()) {
        return Some(name.to_string_lossy().into_owned());
    }

    let candidate = if path.is_absolute() {
        path.to_path_buf()
    } else {
        folder.join(path)
    };
    let name = candidate.file_name()?.to_string_lossy().into_owned();
    let parent = candidate.parent()?;
    if resolve_dir(parent) == folder_id {
        Some(name)
    } else {
        None
    }
}

pub(crate) fn lands_in(base: &Path, selector: &str, folder_id: &Path) -> bool {
    let joined = base.join(selector);
    let normalized: PathBuf = joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    match normalized.parent() {
        Some(parent) => resolve_dir(parent) == folder_id,
        None => false,
    }
}

// `base` is escaped so it is never read as a pattern.
pub(crate) fn expand(
    base: &Path,
    selector: &str,
    folding: NameFolding,
) -> Result<Vec<PathBuf>, glob::PatternError> {
    let pattern = if Path::new(selector).is_absolute() {
        selector.to_string()
    } else {
        let escaped = PathBuf::from(Pattern::escape(&base.to_string_lossy()));
        escaped.join(selector).to_string_lossy().into_owned()
    };
    let options = MatchOptions {
        case_sensitive: folding == NameFolding::Sensitive,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut matches = Vec::new();
    for entry in glob_with(&pattern, options)? {
        match entry {
            Ok(path) => matches.push(path),
            Err(err) => debug!("skipping unreadable match of {pattern}: {err}"),
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn wildcards_are_detected() {
        assert!(has_wildcards("DSCF*.JPG"));
        assert!(has_wildcards("IMG_000?.jpg"));
        assert!(has_wildcards("[ab].jpg"));
        assert!(!has_wildcards("foo.jpg"));
    }

    #[test]
    fn bare_names_are_local() {
        let temp = tempdir().expect("tempdir");
        let id = resolve_dir(temp.path());
        assert_eq!(
            local_pattern(temp.path(), &id, "foo.jpg").as_deref(),
            Some("foo.jpg")
        );
    }

    #[test]
    fn paths_into_the_folder_are_reduced_to_names() {
        let temp = tempdir().expect("tempdir");
        let id = resolve_dir(temp.path());
        let absolute = temp.path().join("foo.jpg");
        assert_eq!(
            local_pattern(temp.path(), &id, &absolute.to_string_lossy()).as_deref(),
            Some("foo.jpg")
        );
        assert_eq!(
            local_pattern(temp.path(), &id, "./foo.jpg").as_deref(),
            Some("foo.jpg")
        );
    }

    #[test]
    fn nested_and_escaping_paths_are_rejected() {
        let temp = tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("sub")).expect("mkdir");
        let id = resolve_dir(temp.path());
        assert!(local_pattern(temp.path(), &id, "sub/foo.jpg").is_none());
        assert!(local_pattern(temp.path(), &id, "../foo.jpg").is_none());
        assert!(local_pattern(temp.path(), &id, "..").is_none());
    }

    #[test]
    fn expand_sorts_and_skips_dotfiles() {
        let temp = tempdir().expect("tempdir");
        for name in ["b.jpg", "a.jpg", ".c.jpg", "d.png"] {
            fs::write(temp.path().join(name), b"x").expect("write");
        }
        let matches = expand(temp.path(), "*.jpg", NameFolding::Sensitive).expect("pattern");
        let names: Vec<String> = matches
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
    }

    #[test]
    fn expand_escapes_the_base_folder() {
        let temp = tempdir().expect("tempdir");
        let odd = temp.path().join("[2018]");
        fs::create_dir(&odd).expect("mkdir");
        fs::write(odd.join("foo.jpg"), b"x").expect("write");
        let matches = expand(&odd, "foo.jpg", NameFolding::Sensitive).expect("pattern");
        assert_eq!(matches, vec![odd.join("foo.jpg")]);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let temp = tempdir().expect("tempdir");
        assert!(expand(temp.path(), "a**b", NameFolding::Sensitive).is_err());
    }

    #[test]
    fn lands_in_detects_target_folder() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("fee");
        fs::create_dir(&target).expect("mkdir");
        let id = resolve_dir(&target);
        assert!(lands_in(temp.path(), "fee/bar", &id));
        assert!(!lands_in(temp.path(), "bar", &id));
        assert!(lands_in(temp.path(), &target.join("x").to_string_lossy(), &id));
    }
}
