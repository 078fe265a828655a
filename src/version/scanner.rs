//! Dotted numeric token scanning.
//!
//! A *version token* is a maximal run of ASCII digits joined by interior dots,
//! where every dot is immediately followed by another digit. Only runs with at
//! least one interior dot qualify, so lone numbers (`cdn2`, `build 42`) never
//! produce a version.
//!
//! Scanning is split into a [`Tokenizer`] (an explicit state machine over bytes)
//! and [`parse_token`] (splits an accepted token into integers).

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Not inside a digit run.
    Idle,
    /// Inside a digit run that started at `start`.
    Digits { start: usize, dots: usize },
    /// Just consumed a dot that followed a digit; `start` is the run start.
    Dot { start: usize, dots: usize },
}

/// Iterator over qualifying version tokens in a string, left to right.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.input.as_bytes();
        let mut state = State::Idle;

        while self.pos <= bytes.len() {
            let current = bytes.get(self.pos).copied();
            let i = self.pos;
            self.pos += 1;

            state = match (state, current) {
                (State::Idle, Some(b)) if b.is_ascii_digit() => State::Digits {
                    start: i,
                    dots: 0,
                },
                (State::Idle, _) => State::Idle,

                (State::Digits { start, dots }, Some(b)) if b.is_ascii_digit() => {
                    State::Digits { start, dots }
                }
                (State::Digits { start, dots }, Some(b'.')) => State::Dot {
                    start,
                    dots: dots + 1,
                },
                (State::Digits { start, dots }, _) => {
                    if dots > 0 {
                        self.pos = i;
                        return Some(&self.input[start..i]);
                    }
                    State::Idle
                }

                (State::Dot { start, dots }, Some(b)) if b.is_ascii_digit() => {
                    State::Digits { start, dots }
                }
                (State::Dot { start, dots }, _) => {
                    // Trailing dot is not part of the token
                    let end = i - 1;
                    if dots > 1 {
                        self.pos = i;
                        return Some(&self.input[start..end]);
                    }
                    State::Idle
                }
            };
        }

        None
    }
}

/// Split an accepted token into its integer components.
///
/// Returns `None` when the token yields no integers or a component overflows `u64`.
pub fn parse_token(token: &str) -> Option<Vec<u64>> {
    let parts = token
        .split('.')
        .map(str::parse::<u64>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// Components of the first qualifying token in `input`, or an empty vector.
pub fn first_version_components(input: &str) -> Vec<u64> {
    Tokenizer::new(input).find_map(parse_token).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<&str> {
        Tokenizer::new(input).collect()
    }

    #[test]
    fn test_plain_token() {
        assert_eq!(tokens("2.3.1"), vec!["2.3.1"]);
    }

    #[test]
    fn test_embedded_token() {
        assert_eq!(tokens("build-10.0-final"), vec!["10.0"]);
        assert_eq!(tokens("plugin_v1.2.zip"), vec!["1.2"]);
    }

    #[test]
    fn test_lone_numbers_are_not_tokens() {
        assert!(tokens("cdn2 build 42").is_empty());
        assert!(tokens("").is_empty());
        assert!(tokens("no digits here").is_empty());
    }

    #[test]
    fn test_trailing_dot_excluded() {
        assert_eq!(tokens("version 1.2. done"), vec!["1.2"]);
        // "3." has no interior dot, so it is not a token
        assert!(tokens("chapter 3.").is_empty());
    }

    #[test]
    fn test_double_dot_splits_runs() {
        // "1..2" has no dot followed by a digit after "1."
        assert!(tokens("1..2").is_empty());
        assert_eq!(tokens("1..2.3"), vec!["2.3"]);
    }

    #[test]
    fn test_multiple_tokens_in_order() {
        assert_eq!(tokens("from 1.0 to 2.5.1"), vec!["1.0", "2.5.1"]);
    }

    #[test]
    fn test_number_dot_word_then_token() {
        assert_eq!(tokens("cdn2.example.com/v1.10.0/game.zip"), vec!["1.10.0"]);
    }

    #[test]
    fn test_parse_token_overflow_discarded() {
        assert_eq!(parse_token("1.2"), Some(vec![1, 2]));
        assert_eq!(parse_token("99999999999999999999999.1"), None);
        assert_eq!(
            first_version_components("99999999999999999999999.1 then 4.5"),
            vec![4, 5]
        );
    }
}
