//! Naming helpers shared by field defaults and config identity.
//!
//! These follow the conventions the admin routes are built on: a type name
//! such as `BlogPost` becomes `blog_post` for config keys and `BlogPosts`
//! for plural labels. The pluralizer only knows the regular English rules.

/// Last segment of a `::` or `\` separated type path.
pub fn basename(path: &str) -> &str {
    path.rsplit(|c| c == '\\' || c == ':')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

/// Lower snake case: an underscore is inserted before every upper-case letter
/// that follows another character, whitespace and dashes become underscores.
pub fn snake(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for (index, ch) in value.chars().enumerate() {
        if ch.is_whitespace() || ch == '-' {
            if !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if ch.is_uppercase() {
            if index > 0 && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn ucfirst(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const SIBILANT_ENDINGS: [&str; 5] = ["s", "x", "z", "ch", "sh"];

pub fn plural(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    if lower.is_empty() {
        return String::new();
    }
    if let Some(stem) = value.strip_suffix('y').or_else(|| value.strip_suffix('Y')) {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u') | None) {
            return format!("{stem}ies");
        }
    }
    if SIBILANT_ENDINGS.iter().any(|ending| lower.ends_with(ending)) {
        return format!("{value}es");
    }
    format!("{value}s")
}

pub fn singular(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", &value[..stem.len()]);
        }
    }
    if let Some(stem) = lower.strip_suffix("es") {
        if ["ss", "x", "z", "ch", "sh"].iter().any(|ending| stem.ends_with(ending)) {
            return value[..stem.len()].to_string();
        }
    }
    if lower.len() > 1 && lower.ends_with('s') && !lower.ends_with("ss") {
        return value[..value.len() - 1].to_string();
    }
    value.to_string()
}
