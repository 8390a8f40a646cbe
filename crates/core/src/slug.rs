// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slugify catalog object stems into job names.

/// Slugify a string for use as a job name.
///
/// Lowercases, replaces any run of non-alphanumeric characters with a
/// single hyphen, and trims leading/trailing hyphens.
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();

    let mut slug = String::with_capacity(lower.len());
    let mut last_was_hyphen = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    slug.trim_matches('-').to_string()
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
