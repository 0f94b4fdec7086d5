use crate::config::NameFolding;
use crate::error::RenameError;
use std::collections::HashSet;

const SUFFIX_LETTERS: std::ops::RangeInclusive<char> = 'a'..='z';

/// Finds a free name for `base` + `ext` in a folder.
pub fn allocate<F>(
    base: &str,
    ext: &str,
    occupied: &HashSet<String>,
    folding: NameFolding,
    mut exists: F,
) -> Result<String, RenameError>
where
    F: FnMut(&str) -> bool,
{
    let mut is_free = |candidate: &str| -> bool {
        !exists(candidate) && !occupied.contains(&folding.fold(candidate))
    };

    let bare = format!("{base}{ext}");
    if is_free(&bare) {
        return Ok(bare);
    }

    for suffix in suffixes() {
        let candidate = format!("{base}{suffix}{ext}");
        if is_free(&candidate) {
            return Ok(candidate);
        }
    }

    Err(RenameError::TooManyFiles { file: bare })
}

pub(crate) fn suffixes() -> impl Iterator<Item = String> {
    let single = SUFFIX_LETTERS.map(String::from);
    let double = SUFFIX_LETTERS
        .flat_map(|first| SUFFIX_LETTERS.map(move |second| format!("{first}{second}")));
    single.chain(double)
}

pub(crate) fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => file_name.split_at(pos),
        _ => (file_name, ""),
    }
}
