// Input validation utilities

use regex::Regex;

// Ports may also be supplied as ${VARIABLE} references that the server resolves.
const PORT_PATTERN: &str = r"^(\d{1,5}|\$\{[A-Za-z0-9_.]+\})$";

/// True when the value is absent or only whitespace.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Named cluster names are used as folder names server-side; '/' is never allowed.
pub fn cleanse_cluster_name(name: &str) -> String {
    name.replace('/', "")
}

/// A port field holds either a number in 1..=65535 or a variable reference.
pub fn is_valid_port(value: &str) -> bool {
    let v = value.trim();
    let Ok(re) = Regex::new(PORT_PATTERN) else {
        return false;
    };
    if !re.is_match(v) {
        return false;
    }
    if v.starts_with("${") {
        return true;
    }
    matches!(v.parse::<u32>(), Ok(p) if (1..=65535).contains(&p))
}
