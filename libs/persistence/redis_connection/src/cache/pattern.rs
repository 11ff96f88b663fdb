//! Redis-compatible glob matching, used by backends without native `SCAN
//! MATCH` support.

/// Matches `key` against a Redis glob: `*`, `?`, `[abc]`, `[^abc]`,
/// `[a-z]` and `\` escapes.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();
    match_from(&pattern, &key)
}

fn match_from(pattern: &[char], key: &[char]) -> bool {
    let (mut p, mut k) = (0, 0);
    // Position to resume from after the most recent `*`.
    let mut star: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    star = Some((p, k));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    k += 1;
                    continue;
                }
                '[' => {
                    if let Some((matched, next)) = match_class(pattern, p, key[k])
                    {
                        if matched {
                            p = next;
                            k += 1;
                            continue;
                        }
                    }
                }
                '\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == key[k] {
                        p += 2;
                        k += 1;
                        continue;
                    }
                }
                c => {
                    if c == key[k] {
                        p += 1;
                        k += 1;
                        continue;
                    }
                }
            }
        }

        match star {
            Some((star_p, star_k)) => {
                p = star_p + 1;
                k = star_k + 1;
                star = Some((star_p, star_k + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Evaluates the character class opening at `pattern[start]`. Returns
/// whether `c` matched and the index just past the closing `]`, or `None`
/// for an unterminated class.
fn match_class(pattern: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negated = pattern.get(i) == Some(&'^');
    if negated {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < pattern.len() && (pattern[i] != ']' || first) {
        first = false;
        let mut lo = pattern[i];
        if lo == '\\' && i + 1 < pattern.len() {
            i += 1;
            lo = pattern[i];
        }

        if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']'
        {
            let hi = pattern[i + 2];
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            if lo <= c && c <= hi {
                matched = true;
            }
            i += 3;
        }
        else {
            if lo == c {
                matched = true;
            }
            i += 1;
        }
    }

    if i >= pattern.len() {
        return None;
    }

    Some((matched != negated, i + 1))
}

#[cfg(test)]
mod tests {
    use super::glob_match;

    #[test]
    fn test_literal() {
        assert!(glob_match("users:all", "users:all"));
        assert!(!glob_match("users:all", "users:al"));
        assert!(!glob_match("users:al", "users:all"));
    }

    #[test]
    fn test_star() {
        assert!(glob_match("user:*", "user:1"));
        assert!(glob_match("user:*", "user:"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("u*r:*1", "user:101"));
        assert!(!glob_match("user:*", "users:all"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob_match("user:?", "user:7"));
        assert!(!glob_match("user:?", "user:42"));
    }

    #[test]
    fn test_classes() {
        assert!(glob_match("user:[12]", "user:1"));
        assert!(!glob_match("user:[12]", "user:3"));
        assert!(glob_match("user:[^12]", "user:3"));
        assert!(glob_match("user:[0-9]", "user:5"));
        assert!(!glob_match("user:[0-9]", "user:x"));
    }

    #[test]
    fn test_escape() {
        assert!(glob_match(r"a\*b", "a*b"));
        assert!(!glob_match(r"a\*b", "axb"));
    }
}
