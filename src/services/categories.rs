use std::collections::BTreeSet;

/// Flattens comma-separated category fields into a sorted, deduplicated list.
pub fn aggregate_categories<I, S>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .flat_map(|field| {
            field
                .as_ref()
                .split(',')
                .map(|token| token.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|token| !token.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Category tokens of a single image, in stored order.
#[must_use]
pub fn split_categories(field: &str) -> Vec<&str> {
    field
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}
