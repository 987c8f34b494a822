use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

/// Declarative sources the tables are loaded from.
/// Defaults to the dictionaries bundled with the crate.
#[derive(Debug, Clone, Copy)]
pub struct TableSources<'a> {
    /// `name=renamed` per line
    pub element_dictionary: &'a str,
    /// `name=renamed` per line, listed attributes are the allow-list
    pub attribute_dictionary: &'a str,
    /// `op1,op2;higher1,higher2` per line
    pub operators: &'a str,
}

impl Default for TableSources<'static> {
    fn default() -> Self {
        Self {
            element_dictionary: include_str!("data/element-dictionary"),
            attribute_dictionary: include_str!("data/attr-dictionary"),
            operators: include_str!("data/operators"),
        }
    }
}

/// Lines carrying an entry: trimmed, blank lines and `#` comments dropped
fn entries(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse a `key=value` dictionary
pub fn parse_dictionary(source: &str, text: &str) -> Result<IndexMap<String, String>> {
    let mut dict = IndexMap::new();
    for (line_no, line) in entries(text) {
        let (key, value) = line.split_once('=').ok_or_else(|| {
            Error::configuration(format!("{}:{}: expected `name=value`, got `{}`", source, line_no, line))
        })?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return Err(Error::configuration(format!(
                "{}:{}: empty name or value in `{}`",
                source, line_no, line
            )));
        }
        dict.insert(key.to_string(), value.to_string());
    }
    Ok(dict)
}

/// Parse the commutative operator priority table.
/// Every operator named left of `;` maps to the set named right of it.
pub fn parse_operators(source: &str, text: &str) -> Result<IndexMap<String, IndexSet<String>>> {
    let mut table = IndexMap::new();
    for (line_no, line) in entries(text) {
        let (ops, higher) = line.split_once(';').ok_or_else(|| {
            Error::configuration(format!(
                "{}:{}: expected `op,...;higher,...`, got `{}`",
                source, line_no, line
            ))
        })?;
        let higher: IndexSet<String> = split_list(higher).collect();
        let ops: Vec<String> = split_list(ops).collect();
        if ops.is_empty() {
            return Err(Error::configuration(format!("{}:{}: no operator before `;`", source, line_no)));
        }
        for op in ops {
            table.insert(op, higher.clone());
        }
    }
    Ok(table)
}

fn split_list(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_skips_comments_and_blank_lines() {
        let dict = parse_dictionary("dict", "# comment\n\nmi=i\n  mo = o \n").unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get("mo").map(String::as_str), Some("o"));
    }

    #[test]
    fn dictionary_without_delimiter_is_rejected() {
        let err = parse_dictionary("element-dictionary", "mi=i\nmo\n").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("element-dictionary:2"));
        assert!(parse_dictionary("d", "=x").is_err());
    }

    #[test]
    fn operators_share_their_priority_set() {
        let table = parse_operators("operators", "*,×;/,^\n=;\n").unwrap();
        assert_eq!(table.len(), 3);
        let times = table.get("×").unwrap();
        assert!(times.contains("/") && times.contains("^"));
        assert_eq!(table.get("*"), Some(times));
        assert!(table.get("=").unwrap().is_empty());
    }

    #[test]
    fn operators_without_separator_are_rejected() {
        assert!(parse_operators("operators", "+,-").is_err());
        assert!(parse_operators("operators", ";*").is_err());
    }

    #[test]
    fn bundled_sources_parse() {
        let sources = TableSources::default();
        assert!(parse_dictionary("element-dictionary", sources.element_dictionary).is_ok());
        assert!(parse_dictionary("attr-dictionary", sources.attribute_dictionary).is_ok());
        let ops = parse_operators("operators", sources.operators).unwrap();
        assert!(ops.get("+").unwrap().contains("*"));
    }
}
