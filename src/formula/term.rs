use crate::tables::ClassificationTables;
use crate::tree::{MathTree, Node, NodeId};

/// Render the subtree at `node` as a canonical term.
///
/// Elements render as `name[attr=value,...](children)` with names taken
/// from the element dictionary and only dictionary attributes kept.
/// Skipped wrappers render their children only, skipped subtrees render
/// nothing. With `include_text` false leaf text is left out, which gives
/// the structural shape used to order operands.
pub fn node_to_string(
    tree: &MathTree,
    node: NodeId,
    tables: &ClassificationTables,
    include_text: bool,
) -> String {
    let mut out = String::new();
    write_node(tree, node, tables, include_text, &mut out);
    out
}

/// Term of a whole formula tree, empty for a tree without root
pub fn formula_term(tree: &MathTree, tables: &ClassificationTables) -> String {
    tree.root()
        .map(|root| node_to_string(tree, root, tables, true))
        .unwrap_or_default()
}

fn write_node(
    tree: &MathTree,
    node: NodeId,
    tables: &ClassificationTables,
    include_text: bool,
    out: &mut String,
) {
    let el = match tree.node(node) {
        Some(Node::Text(text)) => {
            if include_text {
                out.push_str(text.trim());
            }
            return;
        }
        Some(Node::Element(el)) => el,
        None => return,
    };

    let name = el.name.as_str();
    if tables.skip_subtree(name) {
        return;
    }
    if name.is_empty() || tables.skip_node(name) {
        write_children(tree, &el.children, tables, include_text, out);
        return;
    }

    out.push_str(tables.rename_element(name).unwrap_or(name));

    let mut attributes = el
        .attributes
        .iter()
        .filter_map(|(key, value)| tables.rename_attribute(key).map(|k| (k, value)))
        .peekable();
    if attributes.peek().is_some() {
        out.push('[');
        for (i, (key, value)) in attributes.enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        out.push(']');
    }

    out.push('(');
    write_children(tree, &el.children, tables, include_text, out);
    out.push(')');
}

fn write_children(
    tree: &MathTree,
    children: &[NodeId],
    tables: &ClassificationTables,
    include_text: bool,
    out: &mut String,
) {
    for &child in children {
        write_node(tree, child, tables, include_text, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markup: &str, include_text: bool) -> String {
        let tables = ClassificationTables::load_default().unwrap();
        let tree = MathTree::parse(markup).unwrap();
        node_to_string(&tree, tree.root().unwrap(), &tables, include_text)
    }

    #[test]
    fn renames_elements_and_keeps_text() {
        assert_eq!(
            render("<mrow><mi>a</mi><mo> + </mo><mn>2</mn></mrow>", true),
            "r(i(a)o(+)n(2))"
        );
        assert_eq!(render("<mrow><mi>a</mi><mo>+</mo><mn>2</mn></mrow>", false), "r(i()o()n())");
    }

    #[test]
    fn unknown_names_are_kept() {
        assert_eq!(
            render("<apply><plus/><ci>x</ci><cn>1</cn></apply>", true),
            "a(plus()ci(x)cn(1))"
        );
    }

    #[test]
    fn only_dictionary_attributes_are_rendered() {
        assert_eq!(
            render(r#"<mi mathvariant="bold" xref="id3">x</mi>"#, true),
            "i[v=bold](x)"
        );
    }

    #[test]
    fn skip_sets_shape_the_output() {
        let markup = "<semantics><mrow><mi>x</mi></mrow><annotation>x</annotation></semantics>";
        assert_eq!(render(markup, true), "r(i(x))");
    }
}
