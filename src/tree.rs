//! Informative pretty-printing for parsed files and loaded objects, via
//! `ptree` the same way the teacher's `ASTNode` does (`ast_node.rs`): a
//! `TreeItem` impl plus a thin `print()` wrapper around `ptree::print_tree`.
//!
//! Unlike the teacher's `ASTNode<TNode>`, which implements `TreeItem`
//! directly on the parsed node, nyan's two things worth dumping — a parsed
//! [crate::ast::File] and a loaded object's member table reached through
//! [crate::loader::ObjectHandle] — don't share a node type, so both render
//! into this single owned intermediate tree instead.

use ptree::{Style, TreeItem};
use std::borrow::Cow;
use std::io;

#[derive(Debug, Clone)]
pub struct PrintNode {
    label: String,
    children: Vec<PrintNode>,
}

impl PrintNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self { label: label.into(), children: Vec::new() }
    }

    pub fn new(label: impl Into<String>, children: Vec<PrintNode>) -> Self {
        Self { label: label.into(), children }
    }
}

impl TreeItem for PrintNode {
    type Child = PrintNode;

    fn write_self<W: io::Write>(&self, f: &mut W, _: &Style) -> io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(&self.children)
    }
}

pub fn print(root: &PrintNode) -> io::Result<()> {
    ptree::print_tree(root)
}

pub(crate) mod build {
    use super::PrintNode;
    use crate::ast::{File, MemberDecl, ObjectDecl, ValueExpr};
    use crate::loader::ObjectHandle;

    pub fn file(file: &File) -> PrintNode {
        PrintNode::new("File", file.objects.iter().map(object_decl).collect())
    }

    fn object_decl(decl: &ObjectDecl) -> PrintNode {
        let mut header = decl.name.clone();
        if !decl.patch_targets.is_empty() {
            header.push('<');
            header.push_str(&decl.patch_targets.join(", "));
            header.push('>');
        }
        if !decl.inheritance_add.is_empty() {
            header.push_str(" [+");
            header.push_str(&decl.inheritance_add.join(", +"));
            header.push(']');
        }
        header.push('(');
        header.push_str(&decl.parents.join(", "));
        header.push(')');
        PrintNode::new(header, decl.members.iter().map(member_decl).collect())
    }

    fn member_decl(member: &MemberDecl) -> PrintNode {
        let mut label = member.name.clone();
        if let Some(t) = &member.declared_type {
            label.push_str(" : ");
            label.push_str(&t.name);
        }
        if let (Some(op), Some(value)) = (member.operation, &member.value) {
            label.push(' ');
            label.push_str(op.as_str());
            label.push(' ');
            label.push_str(&value_expr(value));
        }
        PrintNode::leaf(label)
    }

    fn value_expr(expr: &ValueExpr) -> String {
        match expr {
            ValueExpr::Scalar { literal_text, .. } => literal_text.clone(),
            ValueExpr::Sequence { elements, .. } => {
                format!("<{}>", elements.iter().map(value_expr).collect::<Vec<_>>().join(", "))
            }
        }
    }

    /// `Object::print_tree`: the object's own fqon, its resolved parents and
    /// patches, and the effective value of every member it declares itself —
    /// inherited-only members aren't listed since they belong to an ancestor's
    /// own subtree.
    pub fn object(handle: &ObjectHandle) -> PrintNode {
        let mut children = Vec::new();

        let parents = handle.parents();
        if !parents.is_empty() {
            children.push(PrintNode::new(
                "parents",
                parents.iter().map(|p| PrintNode::leaf(p.fqon().to_string())).collect(),
            ));
        }

        let mut members = Vec::new();
        for name in handle.member_names() {
            let rendered = match handle.effective_value(name) {
                Ok(value) => format!("{} = {}", name, value),
                Err(e) => format!("{} = <{}>", name, e),
            };
            members.push(PrintNode::leaf(rendered));
        }
        if !members.is_empty() {
            children.push(PrintNode::new("members", members));
        }

        PrintNode::new(handle.fqon().to_string(), children)
    }
}
