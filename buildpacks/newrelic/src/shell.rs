//! Rendering of env vars as POSIX shell, so that the output of the export program can be
//! `eval`-ed or sourced.

use std::fmt::Write;

/// Renders one `export NAME='value'` line per variable.
pub fn export_statements<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    vars.into_iter()
        .fold(String::new(), |mut output, (name, value)| {
            let _ = writeln!(output, "export {name}={}", single_quote(value));
            output
        })
}

/// Quotes a value for the shell. Single quotes suppress all expansion, the only character that
/// needs special treatment is the single quote itself.
pub fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_values() {
        assert_eq!(single_quote("abc123"), "'abc123'");
        assert_eq!(single_quote(""), "''");
    }

    #[test]
    fn quotes_shell_metacharacters() {
        assert_eq!(single_quote("$HOME `id` \"x\""), "'$HOME `id` \"x\"'");
        assert_eq!(single_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn renders_export_statements() {
        assert_eq!(
            export_statements([
                ("NEW_RELIC_LICENSE_KEY", ""),
                ("NEW_RELIC_APP_NAME", "my app")
            ]),
            "export NEW_RELIC_LICENSE_KEY=''\nexport NEW_RELIC_APP_NAME='my app'\n"
        );
    }
}
