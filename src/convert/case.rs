/// Convert an underscore-separated name to camel case.
///
/// `threshold_comparator` becomes `thresholdComparator`, or `ThresholdComparator`
/// when `upper_first` is set. Names without underscores only have their first
/// character adjusted.
pub fn to_camel_case(name: &str, upper_first: bool) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = upper_first;

    for c in name.chars() {
        if c == '_' {
            upper_next = true;
            continue;
        }

        if upper_next {
            out.extend(c.to_uppercase());
        } else if out.is_empty() {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        upper_next = false;
    }

    out
}

/// Convert a camel-cased name to lowercase underscore-separated form.
///
/// `timeWindowSize` becomes `time_window_size`.
pub fn to_underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for c in name.chars() {
        if c.is_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
