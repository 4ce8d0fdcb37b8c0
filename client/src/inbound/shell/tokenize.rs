//! Quote-aware splitting of a shell line into arguments.

use super::ShellError;

/// Split on whitespace. Single or double quotes group words; a backslash
/// escapes the next character outside single quotes.
pub(super) fn tokenize(line: &str) -> Result<Vec<String>, ShellError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(open), c) if c == open => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => {
                let escaped = chars.next().ok_or(ShellError::DanglingEscape)?;
                current.push(escaped);
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err(ShellError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("open 2", &["open", "2"])]
    #[case("  add   \"Write brief\"  ", &["add", "Write brief"])]
    #[case("setup Aoi 'heads down, shipping'", &["setup", "Aoi", "heads down, shipping"])]
    #[case(r"rename 1 it\'s\ done", &["rename", "1", "it's done"])]
    #[case("link 1 \"\"", &["link", "1", ""])]
    #[case("", &[])]
    fn splits_words(#[case] line: &str, #[case] expected: &[&str]) {
        assert_eq!(tokenize(line).expect("tokenize"), expected);
    }

    #[rstest]
    #[case("add \"open", ShellError::UnterminatedQuote)]
    #[case("add trailing\\", ShellError::DanglingEscape)]
    fn reports_malformed_lines(#[case] line: &str, #[case] expected: ShellError) {
        assert_eq!(tokenize(line).expect_err("must fail"), expected);
    }
}
