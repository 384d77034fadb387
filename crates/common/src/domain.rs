/*
 * dkimoracle signing daemon
 *
 * Copyright (c) the dkimoracle authors
 * Licensed under the Apache License, Version 2.0
 *
 * You should have received a copy of the Apache License, Version 2.0 along
 * with this program. If not, see https://www.apache.org/licenses/LICENSE-2.0.
 *
 */

/// Capped at 10 levels per the sender-options query-key algorithm.
const MAX_LEVELS: usize = 10;

/// Iterate the leading-dot parent suffixes of `domain`, in most-specific to
/// least-specific order, e.g. for `mail.example.com`:
/// `.mail.example.com`, `.example.com`, `.com`, `.` — the final entry is the
/// bare catchall dot.
///
/// Capped at [`MAX_LEVELS`] levels to bound pathological inputs.
#[must_use]
pub fn parent_suffixes(domain: &str) -> impl Iterator<Item = String> + '_ {
    ParentSuffixes {
        rest: Some(domain),
        levels_left: MAX_LEVELS,
    }
}

struct ParentSuffixes<'d> {
    rest: Option<&'d str>,
    levels_left: usize,
}

impl<'d> Iterator for ParentSuffixes<'d> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.levels_left == 0 {
            return None;
        }
        let current = self.rest?;
        self.levels_left -= 1;
        self.rest = match current.split_once('.') {
            Some((_, rest)) => Some(rest),
            // reached the top-level label: one more step emits the bare
            // catchall "." before the iterator is exhausted.
            None if current.is_empty() => None,
            None => Some(""),
        };
        Some(format!(".{current}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn full_chain() {
        let suffixes: Vec<_> = parent_suffixes("mail.example.com").collect();
        assert_eq!(
            suffixes,
            vec![".mail.example.com", ".example.com", ".com", "."]
        );
    }

    #[test]
    fn single_label() {
        let suffixes: Vec<_> = parent_suffixes("com").collect();
        assert_eq!(suffixes, vec![".com", "."]);
    }

    #[test]
    fn capped_at_ten_levels() {
        let deep = (0..20).map(|i| format!("l{i}")).collect::<Vec<_>>().join(".");
        let suffixes: Vec<_> = parent_suffixes(&deep).collect();
        assert_eq!(suffixes.len(), MAX_LEVELS);
    }
}
