//! Name conversions shared by path computation and reporting.

/// Convert a camel-case simple class name into a hyphenated lowercase path
/// segment, the way config element names are derived from bean types.
///
/// Token boundaries:
/// - lowercase followed by uppercase (`AbcDef` -> `abc-def`)
/// - uppercase followed by uppercase+lowercase (`USArmy` -> `us-army`)
/// - digit next to non-digit, in either direction (`SSL2Connector` -> `ssl-2-connector`)
pub fn convert_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 5);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && is_boundary(chars[i - 1], c, chars.get(i + 1).copied()) {
            out.push('-');
        }
        out.extend(c.to_lowercase());
    }
    out
}

fn is_boundary(prev: char, cur: char, next: Option<char>) -> bool {
    if prev.is_lowercase() && cur.is_uppercase() {
        return true;
    }
    if prev.is_uppercase() && cur.is_uppercase() && next.is_some_and(char::is_lowercase) {
        return true;
    }
    prev.is_ascii_digit() != cur.is_ascii_digit()
}

/// Text after the last `.`; the whole string when there is none.
pub fn last_part(s: &str) -> &str {
    match s.rfind('.') {
        Some(idx) => &s[idx + 1..],
        None => s,
    }
}

/// Simple name of a dotted or internal (slash-separated) class name.
pub fn simple_name(class_name: &str) -> &str {
    match class_name.rfind(['.', '/']) {
        Some(idx) => &class_name[idx + 1..],
        None => class_name,
    }
}

/// Path segment derived from a class name's simple name.
pub fn path_segment(class_name: &str) -> String {
    convert_name(simple_name(class_name))
}

/// Map a REST operation type to the authorization verb it implies.
pub fn rest_op_type_to_action(op_type: &str) -> &'static str {
    match op_type {
        "POST" | "PUT" => "update",
        "GET" => "read",
        "DELETE" => "delete",
        _ => "????",
    }
}

/// `com/example/Foo` -> `com.example.Foo`
pub fn internal_to_dotted(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

/// `com.example.Foo` -> `com/example/Foo`
pub fn dotted_to_internal(dotted_name: &str) -> String {
    dotted_name.replace('.', "/")
}
