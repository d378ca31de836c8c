//! Context stack: the nodes currently open for writing.
//!
//! The root fragment is held apart from the open containers, so there is
//! always a current node to append to and no empty-stack case to handle.

use crate::ast::{Element, Fragment, IfBlock, OptionsNode, TemplateNode};

/// A container that has been opened but not yet closed.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenNode {
    Element(Element),
    Options(OptionsNode),
    IfBlock(IfBlock),
}

impl OpenNode {
    pub fn start(&self) -> usize {
        match self {
            OpenNode::Element(node) => node.start,
            OpenNode::Options(node) => node.start,
            OpenNode::IfBlock(node) => node.start,
        }
    }

    /// Tag name, for nodes opened by a tag.
    pub fn name(&self) -> Option<&str> {
        match self {
            OpenNode::Element(node) => Some(&node.name),
            OpenNode::Options(node) => Some(&node.name),
            OpenNode::IfBlock(_) => None,
        }
    }

    fn children_mut(&mut self) -> &mut Vec<TemplateNode> {
        match self {
            OpenNode::Element(node) => &mut node.children,
            OpenNode::Options(node) => &mut node.children,
            OpenNode::IfBlock(node) => match &mut node.else_block {
                Some(else_block) => &mut else_block.children,
                None => &mut node.children,
            },
        }
    }

    fn finish(self, end: usize) -> TemplateNode {
        match self {
            OpenNode::Element(mut node) => {
                node.end = end;
                TemplateNode::Element(node)
            }
            OpenNode::Options(mut node) => {
                node.end = end;
                TemplateNode::Options(node)
            }
            OpenNode::IfBlock(mut node) => {
                node.end = end;
                TemplateNode::IfBlock(node)
            }
        }
    }
}

/// The node new children are appended to.
#[derive(Debug, Clone, Copy)]
pub enum Current<'a> {
    Root(&'a Fragment),
    Open(&'a OpenNode),
}

/// Ordered record of open nodes, root first.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    root: Fragment,
    open: Vec<OpenNode>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries including the root; never less than 1.
    pub fn depth(&self) -> usize {
        1 + self.open.len()
    }

    /// Nothing but the root is open.
    pub fn is_top_level(&self) -> bool {
        self.open.is_empty()
    }

    /// Node the next child lands in: the innermost open node, or the root.
    pub fn current(&self) -> Current<'_> {
        match self.open.last() {
            Some(node) => Current::Open(node),
            None => Current::Root(&self.root),
        }
    }

    /// Innermost open container, if any.
    pub fn top(&self) -> Option<&OpenNode> {
        self.open.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut OpenNode> {
        self.open.last_mut()
    }

    /// Append a finished node to the current container.
    pub fn push(&mut self, node: TemplateNode) {
        self.children_mut().push(node);
    }

    pub fn open(&mut self, node: OpenNode) {
        self.open.push(node);
    }

    /// Close the innermost container at `end` and attach it to its parent.
    ///
    /// Returns `false` when only the root is left.
    pub fn close(&mut self, end: usize) -> bool {
        let Some(node) = self.open.pop() else {
            return false;
        };
        let node = node.finish(end);
        self.push(node);
        true
    }

    pub fn root(&self) -> &Fragment {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Fragment {
        &mut self.root
    }

    pub fn into_root(self) -> Fragment {
        self.root
    }

    fn children_mut(&mut self) -> &mut Vec<TemplateNode> {
        match self.open.last_mut() {
            Some(node) => node.children_mut(),
            None => &mut self.root.children,
        }
    }
}

/// Record of the last element closed implicitly by an opening tag.
///
/// Only used to explain a later closing tag that no longer has a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCloseMemo {
    /// The element that was closed.
    pub tag: String,
    /// The tag whose opening closed it.
    pub reason: String,
    /// Stack depth right after the close.
    pub depth: usize,
}
