//! Conflict-of-interest checks for complaint assignment. A staff member
//! named in a grievance must not be the one resolving it.

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn words_of(text: &str) -> impl Iterator<Item = &str> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

/// Case-insensitive check for a staff member's name inside complaint text.
///
/// Matches the full name as a substring, or any name part longer than two
/// characters as a whole word (so "John" will not fire on "Johnson", and
/// honorific fragments like "Dr" are ignored).
pub fn is_staff_mentioned(staff_name: &str, title: &str, description: &str) -> bool {
    let staff_name = normalize_name(staff_name);
    if staff_name.is_empty() {
        return false;
    }

    let full_text = format!("{} {}", title, description).to_lowercase();
    if full_text.contains(&staff_name) {
        return true;
    }

    staff_name
        .split_whitespace()
        .filter(|part| part.len() > 2)
        .any(|part| words_of(&full_text).any(|word| word == part))
}

/// Partitions a staff roster into assignment-eligible and excluded members
/// for the given complaint text. Stable: the same inputs always yield the
/// same split.
pub fn split_eligible<T, F>(title: &str, description: &str, staff: Vec<T>, name_of: F) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> &str,
{
    staff
        .into_iter()
        .partition(|member| !is_staff_mentioned(name_of(member), title, description))
}
