//! Parsing of `opam env --shell=sh` output

use crate::error::{SetupError, SetupResult};

const COMMAND: &str = "opam env";

/// Parse `NAME='value'; export NAME;` lines into pairs.
///
/// Values use sh single quoting, where a literal quote is written `'\''`.
pub fn parse_sh_env(output: &str) -> SetupResult<Vec<(String, String)>> {
    let mut vars = vec![];

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let malformed = || SetupError::UnexpectedOutput {
            command: COMMAND.to_string(),
            reason: format!("cannot parse line {:?}", line),
        };

        let (name, rest) = line.split_once('=').ok_or_else(malformed)?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(malformed());
        }

        let value = if let Some(quoted) = rest.strip_prefix('\'') {
            parse_single_quoted(quoted).ok_or_else(malformed)?
        } else {
            rest.split(';').next().unwrap_or_default().to_string()
        };

        vars.push((name.to_string(), value));
    }

    Ok(vars)
}

/// Read a single-quoted value whose opening quote is already consumed.
fn parse_single_quoted(mut s: &str) -> Option<String> {
    let mut value = String::new();
    loop {
        let end = s.find('\'')?;
        value.push_str(&s[..end]);
        s = &s[end + 1..];
        match s.strip_prefix("\\''") {
            Some(rest) => {
                value.push('\'');
                s = rest;
            }
            None => return Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_opam_env_output() {
        let output = "\
OPAM_SWITCH_PREFIX='/home/runner/.opam/default'; export OPAM_SWITCH_PREFIX;
CAML_LD_LIBRARY_PATH='/home/runner/.opam/default/lib/stublibs:/home/runner/.opam/default/lib/ocaml/stublibs'; export CAML_LD_LIBRARY_PATH;
PATH='/home/runner/.opam/default/bin:/usr/bin'; export PATH;
";
        let vars = parse_sh_env(output).unwrap();
        assert_eq!(vars.len(), 3);
        assert_eq!(
            vars[0],
            (
                "OPAM_SWITCH_PREFIX".to_string(),
                "/home/runner/.opam/default".to_string()
            )
        );
        assert_eq!(vars[2].0, "PATH");
        assert_eq!(vars[2].1, "/home/runner/.opam/default/bin:/usr/bin");
    }

    #[test]
    fn unescapes_single_quotes() {
        let vars = parse_sh_env("X='it'\\''s'; export X;").unwrap();
        assert_eq!(vars, vec![("X".to_string(), "it's".to_string())]);
    }

    #[test]
    fn empty_values_and_blank_lines() {
        let vars = parse_sh_env("\nMANPATH=''; export MANPATH;\n\n").unwrap();
        assert_eq!(vars, vec![("MANPATH".to_string(), String::new())]);
    }

    #[test]
    fn unquoted_values() {
        let vars = parse_sh_env("OPAMNOENVNOTICE=true; export OPAMNOENVNOTICE;").unwrap();
        assert_eq!(vars, vec![("OPAMNOENVNOTICE".to_string(), "true".to_string())]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_sh_env("[ERROR] No switch is currently set").is_err());
        assert!(parse_sh_env("X='unterminated").is_err());
    }
}
