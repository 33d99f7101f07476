use std::iter::Peekable;
use std::str::Chars;

/// Bracket and literal balance of a piece of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Balance {
    Closed,
    /// Something is still open at the end of the text.
    Open,
    Broken { message: String, line: usize },
}

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

enum Literal {
    Closed,
    Open,
    Broken(String),
}

pub(crate) fn scan_balance(text: &str) -> Balance {
    let mut scanner = Scanner {
        chars: text.chars().peekable(),
        line: 1,
    };
    let mut brackets: Vec<char> = Vec::new();

    while let Some(ch) = scanner.chars.next() {
        let literal = match ch {
            '\n' => {
                scanner.line += 1;
                continue;
            }
            '/' if scanner.chars.peek() == Some(&'/') => {
                scanner.skip_line_comment();
                continue;
            }
            '/' if scanner.chars.peek() == Some(&'*') => {
                scanner.chars.next();
                scanner.block_comment()
            }
            '"' => scanner.quoted('"', false),
            '\'' => scanner.quoted('\'', false),
            '`' => scanner.quoted('`', true),
            '(' | '[' | '{' => {
                brackets.push(ch);
                continue;
            }
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if brackets.pop() != Some(expected) {
                    return Balance::Broken {
                        message: format!("unexpected '{}'", ch),
                        line: scanner.line,
                    };
                }
                continue;
            }
            _ => continue,
        };
        match literal {
            Literal::Closed => {}
            Literal::Open => return Balance::Open,
            Literal::Broken(message) => {
                return Balance::Broken {
                    message,
                    line: scanner.line,
                }
            }
        }
    }

    if brackets.is_empty() {
        Balance::Closed
    } else {
        Balance::Open
    }
}

impl Scanner<'_> {
    fn skip_line_comment(&mut self) {
        while let Some(&next) = self.chars.peek() {
            if next == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    // Block comments nest.
    fn block_comment(&mut self) -> Literal {
        let mut depth = 1usize;
        while let Some(ch) = self.chars.next() {
            match ch {
                '\n' => self.line += 1,
                '*' if self.chars.peek() == Some(&'/') => {
                    self.chars.next();
                    depth -= 1;
                    if depth == 0 {
                        return Literal::Closed;
                    }
                }
                '/' if self.chars.peek() == Some(&'*') => {
                    self.chars.next();
                    depth += 1;
                }
                _ => {}
            }
        }
        Literal::Open
    }

    /// Plain strings may continue on the next line only after a trailing backslash;
    /// backtick strings span lines freely.
    fn quoted(&mut self, quote: char, multi_line: bool) -> Literal {
        let mut escaped = false;
        while let Some(ch) = self.chars.next() {
            if ch == '\n' {
                self.line += 1;
                if !escaped && !multi_line {
                    return Literal::Broken("unterminated string literal".to_string());
                }
                escaped = false;
                continue;
            }
            if escaped {
                escaped = false;
                continue;
            }
            if ch == '\\' && !multi_line {
                escaped = true;
            } else if ch == quote {
                return Literal::Closed;
            }
        }
        if multi_line || escaped {
            Literal::Open
        } else if quote == '\'' {
            Literal::Broken("unterminated character literal".to_string())
        } else {
            Literal::Broken("unterminated string literal".to_string())
        }
    }
}

#[cfg(test)]
mod syntax_tests {
    use super::*;

    #[test]
    fn balanced_text_is_closed() {
        assert_eq!(scan_balance(""), Balance::Closed);
        assert_eq!(scan_balance("let x = [1, (2)];"), Balance::Closed);
        assert_eq!(scan_balance("#{a: \"}\"}"), Balance::Closed);
        assert_eq!(scan_balance("let c = ')';"), Balance::Closed);
    }

    #[test]
    fn open_constructs_need_more_input() {
        assert_eq!(scan_balance("fn f() {"), Balance::Open);
        assert_eq!(scan_balance("print(1,\n"), Balance::Open);
        assert_eq!(scan_balance("let s = `one\ntwo"), Balance::Open);
        assert_eq!(scan_balance("/* note /* inner */"), Balance::Open);
        assert_eq!(scan_balance("let s = \"abc\\"), Balance::Open);
    }

    #[test]
    fn comments_hide_brackets() {
        assert_eq!(scan_balance("1 // {"), Balance::Closed);
        assert_eq!(scan_balance("/* ( */ 1"), Balance::Closed);
    }

    #[test]
    fn mismatched_closer_reports_line() {
        assert_eq!(
            scan_balance("let a = 1;\n(2]"),
            Balance::Broken {
                message: "unexpected ']'".to_string(),
                line: 2,
            }
        );
        assert!(matches!(scan_balance(")"), Balance::Broken { line: 1, .. }));
    }

    #[test]
    fn unterminated_plain_string_is_broken() {
        assert!(matches!(
            scan_balance("let s = \"abc\nx"),
            Balance::Broken { .. }
        ));
        assert!(matches!(scan_balance("let s = \"abc"), Balance::Broken { .. }));
    }
}
