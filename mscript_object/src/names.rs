//! Helpers for the naming conventions used by script identifiers.

/// The parts of a system Parameter name, `owner.dependency.type` or `owner.type`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterName {
    /// The owning object, e.g. `sat1`.
    pub owner: String,
    /// The dependency, e.g. a coordinate system or body. Empty if absent.
    pub dependency: String,
    /// The Parameter type, e.g. `SMA`.
    pub type_name: String,
}

impl ParameterName {
    /// Split a dotted name on its first and last dot.
    ///
    /// Names without a dot have no parts, so every field is empty. Anything between the first
    /// and last dot is the dependency, which may itself contain dots
    /// (`FM.GravityField.Earth.Degree` has dependency `GravityField.Earth`).
    pub fn parse(description: &str) -> Self {
        match (description.find('.'), description.rfind('.')) {
            (Some(first), Some(last)) => Self {
                owner: description[..first].to_string(),
                dependency: if last > first {
                    description[first + 1..last].to_string()
                } else {
                    String::new()
                },
                type_name: description[last + 1..].to_string(),
            },
            _ => Self::default(),
        }
    }
}

/// Return true if `c` can appear in an identifier.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Return true if `name` is a plain identifier, e.g. `sat1` or `My_Array`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(is_name_char),
        _ => false,
    }
}

/// Replace whole-identifier occurrences of `from` with `to`.
///
/// `sat1.X + sat10.Y` with `sat1 -> satA` becomes `satA.X + sat10.Y`. Text inside single
/// quotes is left alone, and so is a field name: the `X` in `sat1.X` is not a reference to an
/// object named `X`. A name between two dots, like the coordinate system in
/// `sat1.EarthMJ2000Eq.X`, is still replaced.
pub fn replace_name(text: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return text.to_string();
    }
    let mut result = String::with_capacity(text.len());
    let mut in_quotes = false;
    let mut rest = text;
    let mut prev: Option<char> = None;

    while let Some(c) = rest.chars().next() {
        if c == '\'' {
            in_quotes = !in_quotes;
        }
        if !in_quotes && rest.starts_with(from) {
            let next = rest[from.len()..].chars().next();
            let before_ok = prev.map_or(true, |p| !is_name_char(p));
            let after_ok = next.map_or(true, |n| !is_name_char(n));
            let is_field = prev == Some('.') && next != Some('.');
            if before_ok && after_ok && !is_field {
                result.push_str(to);
                rest = &rest[from.len()..];
                prev = from.chars().last();
                continue;
            }
        }
        result.push(c);
        rest = &rest[c.len_utf8()..];
        prev = Some(c);
    }
    result
}

/// Remove an array index or bracket suffix, e.g. `A(1,2)` becomes `A`.
pub fn strip_index_suffix(name: &str) -> &str {
    let end = name.find(|c| c == '(' || c == '[').unwrap_or(name.len());
    name[..end].trim()
}
