//! Bulk tree dumps
//!
//! Serializable nested views of a tree, keyed by node path and depth, for
//! downstream exporters. Output formatting (OPML, Markdown and friends) is
//! somebody else's job; this module only produces the data.

use serde::Serialize;

use crate::arc::{Arc, ArcElement};
use crate::outline::Outline;
use crate::story::StoryElement;
use crate::tree::{MpTree, NodeId};

/// One dumped node with its subtree.
#[derive(Clone, Debug, Serialize)]
pub struct TreeDumpNode<T> {
    pub id: NodeId,
    pub path: String,
    pub depth: usize,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeDumpNode<T>>,
}

/// Dumps every root of a tree with its full subtree, in tree order.
pub fn dump_tree<P: Clone + Serialize>(tree: &MpTree<P>) -> Vec<TreeDumpNode<P>> {
    tree.roots()
        .iter()
        .filter_map(|root| dump_subtree(tree, root.id))
        .collect()
}

/// Dumps one node and everything beneath it.
pub fn dump_subtree<P: Clone + Serialize>(tree: &MpTree<P>, node: NodeId) -> Option<TreeDumpNode<P>> {
    let record = tree.get(node)?;
    let children = tree
        .children(node)
        .iter()
        .filter_map(|child| dump_subtree(tree, child.id))
        .collect();
    Some(TreeDumpNode {
        id: record.id,
        path: record.path.clone(),
        depth: tree.depth(node),
        data: record.payload.clone(),
        children,
    })
}

/// The outline's story tree, from its hidden root down.
pub fn dump_story(outline: &Outline) -> Vec<TreeDumpNode<StoryElement>> {
    dump_tree(outline.story.tree())
}

/// An arc's element tree, from its hidden root down.
pub fn dump_arc(arc: &Arc) -> Vec<TreeDumpNode<ArcElement>> {
    dump_tree(arc.tree())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story_elements::StoryElementKind;
    use crate::story::StoryElement;
    use crate::workspace::Workspace;

    #[test]
    fn story_dump_nests_by_depth() {
        let mut workspace = Workspace::new();
        let outline_id = workspace.create_outline("u1", "Dump me", None);
        {
            let outline = workspace.outline_mut(outline_id).unwrap();
            let root = outline.story.root();
            let book = outline
                .story
                .add_child(root, StoryElement::named(StoryElementKind::Book, "book one"))
                .unwrap();
            outline
                .story
                .add_child(book, StoryElement::new(StoryElementKind::Chapter))
                .unwrap();
        }
        let outline = workspace.outline(outline_id).unwrap();
        let dump = dump_story(outline);
        assert_eq!(dump.len(), 1);
        assert_eq!(dump[0].depth, 1);
        assert_eq!(dump[0].children.len(), 1);
        let book = &dump[0].children[0];
        assert_eq!(book.depth, 2);
        assert_eq!(book.data.name.as_deref(), Some("book one"));
        assert_eq!(book.children.len(), 1);
        assert_eq!(book.children[0].depth, 3);

        let json = serde_json::to_value(&dump).unwrap();
        assert!(json[0]["children"][0]["data"]["name"].is_string());
    }
}
