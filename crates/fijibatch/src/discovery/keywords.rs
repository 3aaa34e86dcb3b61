use indexmap::IndexSet;

use crate::error::ValidationError;

/// Normalizes keyword input into an ordered, duplicate-free list of trimmed
/// strings. Insertion order is preserved so the first caller-supplied
/// keyword keeps match priority.
pub fn normalize_keywords<I, S>(input: I) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: IndexSet<String> = IndexSet::new();

    for keyword in input {
        let cleaned = keyword.as_ref().trim();
        if !cleaned.is_empty() {
            seen.insert(cleaned.to_string());
        }
    }

    if seen.is_empty() {
        return Err(ValidationError::EmptyKeywords);
    }

    Ok(seen.into_iter().collect())
}

/// Human-friendly rendering of a keyword list for log and error messages.
pub fn format_keywords(keywords: &[String]) -> String {
    keywords.join(", ")
}
