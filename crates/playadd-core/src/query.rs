//! Turns a raw tab title into a catalog search query.
//!
//! Video titles carry noise that hurts search accuracy: the platform name the
//! browser appends, "(Official Video)"-style qualifiers, and featured-artist
//! clauses. Each pass strips one of these.

/// Tab titles carry the platform name appended by the browser.
const PLATFORM_SUFFIX: &str = " - YouTube";

/// Markers introducing a featured-artist clause; everything from the marker
/// onward is dropped.
const FEATURE_MARKERS: &[&str] = &["ft.", "feat.", "featuring"];

/// Apply all cleanup passes in order.
pub fn clean_title(raw: &str) -> String {
    let s = strip_platform_suffix(raw);
    let s = strip_bracketed(s);
    strip_featured(&s)
}

// ── Pass 1: platform suffix ───────────────────────────────────────────

fn strip_platform_suffix(s: &str) -> &str {
    s.strip_suffix(PLATFORM_SUFFIX).unwrap_or(s)
}

// ── Pass 2: parenthesized/bracketed segments ──────────────────────────

/// Drop `(...)` and `[...]` segments (non-nested, like the qualifiers seen in
/// video titles), collapsing the surrounding whitespace to a single space.
fn strip_bracketed(s: &str) -> String {
    let mut kept = String::with_capacity(s.len());
    let mut closer: Option<char> = None;

    for c in s.chars() {
        if let Some(close) = closer {
            if c == close {
                closer = None;
            }
            continue;
        }
        match c {
            '(' => closer = Some(')'),
            '[' => closer = Some(']'),
            _ => kept.push(c),
        }
    }

    collapse_spaces(&kept)
}

fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for c in s.chars() {
        if c == ' ' {
            if !prev_space {
                out.push(c);
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out
}

// ── Pass 3: featured artists ──────────────────────────────────────────

fn strip_featured(s: &str) -> String {
    let cut = FEATURE_MARKERS
        .iter()
        .filter_map(|marker| find_ascii_case_insensitive(s, marker))
        .min();
    match cut {
        Some(i) => s[..i].to_string(),
        None => s.to_string(),
    }
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cleanup() {
        assert_eq!(
            clean_title("Song (Official Video) ft. Someone - YouTube"),
            "Song "
        );
    }

    #[test]
    fn test_suffix_only_stripped_at_end() {
        assert_eq!(clean_title("Artist - Song - YouTube"), "Artist - Song");
        // No suffix: title passes through untouched.
        assert_eq!(clean_title("Artist - Song"), "Artist - Song");
    }

    #[test]
    fn test_square_brackets() {
        assert_eq!(
            clean_title("Artist - Song [Official Audio] - YouTube"),
            "Artist - Song "
        );
    }

    #[test]
    fn test_feature_marker_variants() {
        assert_eq!(clean_title("Song feat. Other - YouTube"), "Song ");
        assert_eq!(clean_title("Song featuring Other - YouTube"), "Song ");
        assert_eq!(clean_title("Song FT. Other - YouTube"), "Song ");
    }

    #[test]
    fn test_multiple_bracketed_segments() {
        assert_eq!(
            clean_title("Song (Remix) [HD] - YouTube"),
            "Song "
        );
    }

    #[test]
    fn test_plain_title_untouched() {
        assert_eq!(clean_title("Artist Song"), "Artist Song");
    }

    #[test]
    fn test_empty() {
        assert_eq!(clean_title(""), "");
    }

    #[test]
    fn test_ft_without_dot_kept() {
        // "ft" alone is not a marker; only "ft." introduces a feature clause.
        assert_eq!(clean_title("Drift Away - YouTube"), "Drift Away");
    }
}
