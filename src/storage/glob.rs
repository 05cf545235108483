//! Glob matching for the KEYS command.
//!
//! Supported syntax:
//! - `*` matches any run of characters, including none
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[^a]` match one character from (or not from) a class
//! - `\x` matches `x` literally
//!
//! Everything else matches itself. The whole key must match, not a prefix.

/// A compiled KEYS pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
    Class { negate: bool, items: Vec<ClassItem> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Single(char),
    Range(char, char),
}

impl Token {
    /// Whether this single-character token accepts `c`. Never called for `AnyRun`.
    fn accepts(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyOne => true,
            Token::AnyRun => true,
            Token::Class { negate, items } => {
                let hit = items.iter().any(|item| match item {
                    ClassItem::Single(s) => *s == c,
                    ClassItem::Range(lo, hi) => (*lo..=*hi).contains(&c),
                });
                hit != *negate
            }
        }
    }
}

impl GlobPattern {
    /// Compiles a pattern. Malformed classes (no closing `]`) are read as literals.
    pub fn new(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    // Consecutive stars collapse into one
                    if tokens.last() != Some(&Token::AnyRun) {
                        tokens.push(Token::AnyRun);
                    }
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::AnyOne);
                    i += 1;
                }
                '\\' if i + 1 < chars.len() => {
                    tokens.push(Token::Literal(chars[i + 1]));
                    i += 2;
                }
                '[' => match parse_class(&chars[i + 1..]) {
                    Some((token, used)) => {
                        tokens.push(token);
                        i += 1 + used;
                    }
                    None => {
                        tokens.push(Token::Literal('['));
                        i += 1;
                    }
                },
                c => {
                    tokens.push(Token::Literal(c));
                    i += 1;
                }
            }
        }

        Self { tokens }
    }

    /// Returns true if `text` matches the whole pattern.
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let (mut t, mut p) = (0usize, 0usize);
        // Where to resume after the most recent `*`: (pattern index, text index)
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            match self.tokens.get(p) {
                Some(Token::AnyRun) => {
                    backtrack = Some((p + 1, t));
                    p += 1;
                }
                Some(token) if token.accepts(text[t]) => {
                    p += 1;
                    t += 1;
                }
                _ => match backtrack {
                    Some((bp, bt)) => {
                        // Let the last star swallow one more character
                        backtrack = Some((bp, bt + 1));
                        p = bp;
                        t = bt + 1;
                    }
                    None => return false,
                },
            }
        }

        self.tokens[p..].iter().all(|token| *token == Token::AnyRun)
    }
}

/// Parses the body of a `[...]` class. `rest` starts just after the `[`.
/// Returns the token and the number of chars consumed including the `]`.
fn parse_class(rest: &[char]) -> Option<(Token, usize)> {
    let mut i = 0;
    let negate = rest.first() == Some(&'^');
    if negate {
        i += 1;
    }

    let mut items = Vec::new();
    while i < rest.len() {
        match rest[i] {
            ']' => return Some((Token::Class { negate, items }, i + 1)),
            '\\' if i + 1 < rest.len() => {
                items.push(ClassItem::Single(rest[i + 1]));
                i += 2;
            }
            c if i + 2 < rest.len() && rest[i + 1] == '-' && rest[i + 2] != ']' => {
                let (lo, hi) = if c <= rest[i + 2] {
                    (c, rest[i + 2])
                } else {
                    (rest[i + 2], c)
                };
                items.push(ClassItem::Range(lo, hi));
                i += 3;
            }
            c => {
                items.push(ClassItem::Single(c));
                i += 1;
            }
        }
    }

    None
}
