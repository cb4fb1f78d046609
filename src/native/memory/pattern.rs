//! Glob-style key patterns (KEYS / SCAN MATCH)
//!
//! Supported:
//! - `*` : any sequence, including empty
//! - `?` : exactly one byte
//! - `[abc]`, `[a-z]`, `[^a]` : byte classes
//! - `\x` : literal `x`

/// Check if `key` matches `pattern`
pub fn matches_pattern(key: &[u8], pattern: &[u8]) -> bool {
    // Fast paths for the common shapes
    if pattern == b"*" {
        return true;
    }
    if !pattern.iter().any(|b| matches!(b, b'*' | b'?' | b'[' | b'\\')) {
        return key == pattern;
    }
    glob(key, pattern)
}

fn glob(key: &[u8], pattern: &[u8]) -> bool {
    let (mut k, mut p) = (0, 0);
    // Last `*` seen in the pattern, and the key position it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() {
            match pattern[p] {
                b'*' => {
                    backtrack = Some((p, k));
                    p += 1;
                    continue;
                }
                b'?' => {
                    k += 1;
                    p += 1;
                    continue;
                }
                b'[' => {
                    if let Some((matched, next)) = match_class(key[k], &pattern[p..]) {
                        if matched {
                            k += 1;
                            p += next;
                            continue;
                        }
                    }
                }
                b'\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == key[k] {
                        k += 1;
                        p += 2;
                        continue;
                    }
                }
                literal => {
                    if literal == key[k] {
                        k += 1;
                        p += 1;
                        continue;
                    }
                }
            }
        }

        // Mismatch: let the last star swallow one more byte
        match backtrack {
            Some((star, tried)) => {
                p = star + 1;
                k = tried + 1;
                backtrack = Some((star, k));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}

/// Match one byte against the class at the start of `class`
///
/// Returns whether it matched and the length of the class in the pattern,
/// or None for an unterminated class.
fn match_class(byte: u8, class: &[u8]) -> Option<(bool, usize)> {
    let mut i = 1;
    let negate = class.get(i) == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < class.len() && class[i] != b']' {
        if class[i] == b'\\' && i + 1 < class.len() {
            matched |= class[i + 1] == byte;
            i += 2;
        } else if i + 2 < class.len() && class[i + 1] == b'-' && class[i + 2] != b']' {
            let (lo, hi) = if class[i] <= class[i + 2] {
                (class[i], class[i + 2])
            } else {
                (class[i + 2], class[i])
            };
            matched |= (lo..=hi).contains(&byte);
            i += 3;
        } else {
            matched |= class[i] == byte;
            i += 1;
        }
    }

    if i >= class.len() {
        return None;
    }
    Some((matched != negate, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star() {
        assert!(matches_pattern(b"anything", b"*"));
        assert!(matches_pattern(b"user:1", b"user:*"));
        assert!(matches_pattern(b"data:cache", b"*:cache"));
        assert!(matches_pattern(b"user_admin", b"*admin*"));
        assert!(!matches_pattern(b"role_user", b"*admin*"));
        assert!(matches_pattern(b"conn1:a5", b"conn1:a*"));
        assert!(!matches_pattern(b"conn2:a5", b"conn1:a*"));
    }

    #[test]
    fn test_exact() {
        assert!(matches_pattern(b"exact_key", b"exact_key"));
        assert!(!matches_pattern(b"exact_key2", b"exact_key"));
    }

    #[test]
    fn test_question_mark() {
        assert!(matches_pattern(b"hallo", b"h?llo"));
        assert!(!matches_pattern(b"hllo", b"h?llo"));
    }

    #[test]
    fn test_classes() {
        assert!(matches_pattern(b"hello", b"h[ae]llo"));
        assert!(!matches_pattern(b"hillo", b"h[ae]llo"));
        assert!(matches_pattern(b"hbllo", b"h[^e]llo"));
        assert!(!matches_pattern(b"hello", b"h[^e]llo"));
        assert!(matches_pattern(b"key7", b"key[0-9]"));
        assert!(!matches_pattern(b"keyx", b"key[0-9]"));
    }

    #[test]
    fn test_escape() {
        assert!(matches_pattern(b"a*b", b"a\\*b"));
        assert!(!matches_pattern(b"axb", b"a\\*b"));
    }

    #[test]
    fn test_backtracking() {
        assert!(matches_pattern(b"abcabcabd", b"*abd"));
        assert!(matches_pattern(b"a1b2c3", b"a*b*c?"));
        assert!(!matches_pattern(b"a1b2c", b"a*b*c?"));
    }
}
