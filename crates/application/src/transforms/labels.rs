use ferrous_collector_domain::UNKNOWN_FIELD;

pub(crate) fn is_known(qname: &str) -> bool {
    !qname.is_empty() && qname != UNKNOWN_FIELD
}

pub(crate) fn split(qname: &str) -> Vec<&str> {
    qname
        .trim_end_matches('.')
        .split('.')
        .filter(|label| !label.is_empty())
        .collect()
}

/// The last `count` labels joined back together, `None` if the name is shorter.
pub(crate) fn suffix(qname: &str, count: usize) -> Option<String> {
    let labels = split(qname);
    if count == 0 || labels.len() < count {
        return None;
    }
    Some(labels[labels.len() - count..].join("."))
}
