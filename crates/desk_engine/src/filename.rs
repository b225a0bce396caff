use desk_core::{file_extension, file_stem};

const MAX_STEM_CHARS: usize = 120;

/// Windows-safe version of a result name, keeping its extension.
pub fn sanitize_filename(name: &str) -> String {
    let stem = sanitize_part(file_stem(name));
    let stem = if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    };
    let mut stem: String = stem.chars().take(MAX_STEM_CHARS).collect();
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    match file_extension(name) {
        Some(ext) => format!("{stem}.{}", sanitize_part(&ext)),
        None => stem,
    }
}

/// First of `name`, `stem (1).ext`, `stem (2).ext`, ... not already taken.
pub fn unique_filename(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(name) {
        return name.to_string();
    }
    let stem = file_stem(name);
    let suffix = file_extension(name)
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    (1..)
        .map(|n| format!("{stem} ({n}){suffix}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

fn sanitize_part(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{sanitize_filename, unique_filename};

    #[test]
    fn forbidden_characters_are_replaced() {
        assert_eq!(sanitize_filename("a/b:c?.pdf"), "a_b_c.pdf");
        assert_eq!(sanitize_filename("..__report__.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("con.pdf"), "con_.pdf");
        assert_eq!(sanitize_filename("???.pdf"), "untitled.pdf");
    }

    #[test]
    fn long_multibyte_stems_are_cut_on_char_boundaries() {
        let name = format!("{}.pdf", "é".repeat(200));
        let sanitized = sanitize_filename(&name);
        assert!(sanitized.ends_with(".pdf"));
        assert_eq!(sanitized.chars().count(), 120 + ".pdf".len());
    }

    #[test]
    fn duplicates_get_numbered_suffixes() {
        let taken: HashSet<&str> = ["invoice.pdf", "invoice (1).pdf"].into_iter().collect();
        assert_eq!(unique_filename("other.pdf", |n| taken.contains(n)), "other.pdf");
        assert_eq!(
            unique_filename("invoice.pdf", |n| taken.contains(n)),
            "invoice (2).pdf"
        );
    }
}
