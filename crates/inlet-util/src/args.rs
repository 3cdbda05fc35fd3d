//! Command-line argument splitting.

use crate::error::UtilError;

/// Split a single command-line string into arguments.
///
/// Whitespace separates arguments. Single or double quotes group text
/// (including whitespace) into one argument; the quotes themselves are
/// dropped. A quote of the other kind inside a quoted section is literal.
/// An empty quoted section (`""`) yields an empty argument.
///
/// # Errors
/// Returns `UtilError::UnbalancedQuotes` if a quoted section is not closed.
pub fn split_command_line(line: &str) -> Result<Vec<String>, UtilError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(UtilError::UnbalancedQuotes {
            line: line.to_owned(),
        });
    }
    if in_token {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        let args = split_command_line("  one two\tthree  ").unwrap();
        assert_eq!(args, vec!["one", "two", "three"]);
    }

    #[test]
    fn empty_line_has_no_args() {
        assert!(split_command_line("").unwrap().is_empty());
        assert!(split_command_line("   ").unwrap().is_empty());
    }

    #[test]
    fn quotes_group_words() {
        let args = split_command_line(r#"--name "hello world" 'single quoted'"#).unwrap();
        assert_eq!(args, vec!["--name", "hello world", "single quoted"]);
    }

    #[test]
    fn quotes_join_adjacent_text() {
        let args = split_command_line(r#"--opt="a b"c"#).unwrap();
        assert_eq!(args, vec!["--opt=a bc"]);
    }

    #[test]
    fn other_quote_kind_is_literal() {
        let args = split_command_line(r#""it's" 'say "hi"'"#).unwrap();
        assert_eq!(args, vec!["it's", "say \"hi\""]);
    }

    #[test]
    fn empty_quotes_yield_empty_arg() {
        let args = split_command_line(r#"a "" b"#).unwrap();
        assert_eq!(args, vec!["a", "", "b"]);
    }

    #[test]
    fn unbalanced_quote_rejected() {
        let err = split_command_line(r#"a "b c"#).unwrap_err().to_string();
        assert!(err.contains("unbalanced quotes"), "error was: {err}");
    }
}
