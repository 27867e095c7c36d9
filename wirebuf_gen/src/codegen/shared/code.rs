//! Structured code tree and its pretty-printer.
//!
//! Back-ends build nested [`CodeNode`]s and hand them to [`render`]; the
//! nesting depth travels with the recursion, so indentation never depends on
//! the characters inside a line.
//!
//! # Example
//! ```
//! use wirebuf_gen::codegen::shared::code::*;
//!
//! let tree = vec![CodeNode::block(
//!     "class Ping",
//!     vec![CodeNode::line("int Seq = 0;")],
//! )];
//! assert_eq!(render(&tree, "  ").unwrap(), "class Ping {\n  int Seq = 0;\n}\n");
//! ```

use std::fmt::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeNode {
    Line(String),
    Blank,
    /// `header` opens the block on its own line, `body` is indented one
    /// level deeper, `close` ends it at the header's depth.
    Block {
        header: String,
        body: Vec<CodeNode>,
        close: String,
    },
}

impl CodeNode {
    pub fn line(text: impl Into<String>) -> Self {
        CodeNode::Line(text.into())
    }

    /// Brace block: `header {` ... `}`.
    pub fn block(header: impl AsRef<str>, body: Vec<CodeNode>) -> Self {
        CodeNode::Block {
            header: format!("{} {{", header.as_ref()),
            body,
            close: "}".to_string(),
        }
    }

    /// Block whose closing line differs from a bare brace (`};`, `});`).
    pub fn block_with_close(
        header: impl AsRef<str>,
        body: Vec<CodeNode>,
        close: impl Into<String>,
    ) -> Self {
        CodeNode::Block {
            header: format!("{} {{", header.as_ref()),
            body,
            close: close.into(),
        }
    }
}

/// Join groups of nodes with one blank line between non-empty groups.
pub fn separated(groups: Vec<Vec<CodeNode>>) -> Vec<CodeNode> {
    let mut out = Vec::new();
    for group in groups.into_iter().filter(|g| !g.is_empty()) {
        if !out.is_empty() {
            out.push(CodeNode::Blank);
        }
        out.extend(group);
    }
    out
}

/// Render a tree from depth zero with the given indent unit.
pub fn render(nodes: &[CodeNode], indent: &str) -> Result<String, fmt::Error> {
    let mut out = String::new();
    render_into(&mut out, nodes, 0, indent)?;
    Ok(out)
}

pub fn render_into<W: Write>(
    out: &mut W,
    nodes: &[CodeNode],
    depth: usize,
    indent: &str,
) -> fmt::Result {
    for node in nodes {
        match node {
            CodeNode::Line(text) => write_line(out, text, depth, indent)?,
            CodeNode::Blank => out.write_char('\n')?,
            CodeNode::Block {
                header,
                body,
                close,
            } => {
                write_line(out, header, depth, indent)?;
                render_into(out, body, depth + 1, indent)?;
                write_line(out, close, depth, indent)?;
            }
        }
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, text: &str, depth: usize, indent: &str) -> fmt::Result {
    if !text.is_empty() {
        for _ in 0..depth {
            out.write_str(indent)?;
        }
        out.write_str(text)?;
    }
    out.write_char('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_indent_by_depth() {
        let tree = vec![CodeNode::block(
            "namespace FastNet",
            vec![CodeNode::block(
                "class A",
                vec![CodeNode::line("string s = \"{\";"), CodeNode::Blank],
            )],
        )];
        let text = render(&tree, "    ").unwrap();
        assert_eq!(
            text,
            "namespace FastNet {\n    class A {\n        string s = \"{\";\n\n    }\n}\n"
        );
    }

    #[test]
    fn custom_close_and_separation() {
        let tree = separated(vec![
            vec![CodeNode::block_with_close("enum E", vec![], "};")],
            vec![],
            vec![CodeNode::line("x")],
        ]);
        assert_eq!(render(&tree, "\t").unwrap(), "enum E {\n};\n\nx\n");
    }
}
