use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::tree::{MathTree, NodeId, MAX_NESTING_DEPTH};

/// Entities accepted in text besides numeric character references.
/// The MathML names cover the invisible operators the canonicalizer rewrites.
fn resolve_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "InvisibleTimes" | "it" => Some("\u{2062}"),
        "ApplyFunction" | "af" => Some("\u{2061}"),
        "InvisibleComma" | "ic" => Some("\u{2063}"),
        "times" => Some("\u{00D7}"),
        "minus" => Some("\u{2212}"),
        "sdot" => Some("\u{22C5}"),
        "nbsp" => Some("\u{00A0}"),
        _ => None,
    }
}

fn decode_name(raw: &[u8]) -> Result<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| Error::parse(format!("invalid UTF-8 in name: {}", e)))
}

impl MathTree {
    /// Build a tree from XML markup.
    ///
    /// Element and attribute names keep their local part only, namespace
    /// declarations are dropped, comments and processing instructions are
    /// skipped. Whitespace text is kept as-is; extraction strips it.
    /// Elements nested deeper than `MAX_NESTING_DEPTH` are a parse error.
    pub fn parse(markup: &str) -> Result<MathTree> {
        let mut reader = Reader::from_str(markup);
        let mut tree = MathTree::new();
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    check_depth(&stack)?;
                    let id = open_element(&mut tree, e)?;
                    attach(&mut tree, &stack, id)?;
                    stack.push(id);
                }
                Event::Empty(ref e) => {
                    check_depth(&stack)?;
                    let id = open_element(&mut tree, e)?;
                    attach(&mut tree, &stack, id)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(ref e) => {
                    let text = e.unescape_with(resolve_entity)?;
                    // text outside the root element carries nothing
                    if let Some(&parent) = stack.last() {
                        let leaf = tree.text(text.into_owned());
                        tree.append_child(parent, leaf);
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|err| Error::parse(format!("invalid UTF-8 in CDATA: {}", err)))?;
                    if let Some(&parent) = stack.last() {
                        let leaf = tree.text(text);
                        tree.append_child(parent, leaf);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::parse(format!("{} unclosed element(s) at end of input", stack.len())));
        }
        if tree.root().is_none() {
            return Err(Error::parse("no root element"));
        }
        Ok(tree)
    }
}

fn open_element(tree: &mut MathTree, start: &BytesStart) -> Result<NodeId> {
    let name = decode_name(start.local_name().as_ref())?;
    let id = tree.element(name);
    for attr in start.attributes() {
        let attr = attr?;
        let raw_key = attr.key.as_ref();
        if raw_key == b"xmlns" || raw_key.starts_with(b"xmlns:") {
            continue;
        }
        let key = decode_name(attr.key.local_name().as_ref())?;
        let value = attr.unescape_value()?;
        tree.set_attribute(id, key, value.into_owned());
    }
    Ok(id)
}

fn check_depth(stack: &[NodeId]) -> Result<()> {
    if stack.len() >= MAX_NESTING_DEPTH {
        return Err(Error::parse(format!(
            "elements nested deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }
    Ok(())
}

fn attach(tree: &mut MathTree, stack: &[NodeId], id: NodeId) -> Result<()> {
    match stack.last() {
        Some(&parent) => tree.append_child(parent, id),
        None => {
            if tree.root().is_some() {
                return Err(Error::parse("more than one root element"));
            }
            tree.set_root(id);
        }
    }
    Ok(())
}
