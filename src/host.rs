//! The surface node an effect overlays.
//!
//! A host is shared between whoever owns the page (which may resize or
//! detach it at any time) and the effect drawing on it, hence
//! `Rc<RefCell<_>>`. One effect per host is assumed; attaching two effects to
//! the same host is not guarded against.

use std::cell::RefCell;
use std::rc::Rc;

use crate::document::Document;

pub type HostHandle = Rc<RefCell<HostSurface>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZIndex {
    Auto,
    Value(i32),
}

/// Declared (not computed) style values; `None` means "not declared".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleDecl {
    pub position: Option<Position>,
    pub z_index: Option<ZIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

/// A child element of the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub class_name: String,
    pub z_index: Option<i32>,
}

impl Element {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self { class_name: class_name.into(), z_index: None }
    }

    pub fn with_z_index(mut self, z: i32) -> Self {
        self.z_index = Some(z);
        self
    }
}

#[derive(Debug)]
pub struct HostSurface {
    document: Rc<Document>,
    attached: bool,
    width: f32,
    height: f32,
    /// Values coming from style sheets.
    pub cascade: StyleDecl,
    /// Values set directly on the node.
    pub inline: StyleDecl,
    children: Vec<(NodeId, Element)>,
    next_node: u64,
}

impl HostSurface {
    pub fn new(document: Rc<Document>, width: f32, height: f32) -> Self {
        Self {
            document,
            attached: true,
            width,
            height,
            cascade: StyleDecl::default(),
            inline: StyleDecl::default(),
            children: Vec::new(),
            next_node: 0,
        }
    }

    pub fn into_handle(self) -> HostHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Remove the host from the visible tree.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Visible box in logical pixels. Detached hosts measure as empty.
    pub fn bounding_box(&self) -> (f32, f32) {
        if !self.attached {
            return (0.0, 0.0);
        }
        (self.width.max(0.0), self.height.max(0.0))
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn computed_position(&self) -> Position {
        self.inline.position.or(self.cascade.position).unwrap_or(Position::Static)
    }

    pub fn computed_z_index(&self) -> ZIndex {
        self.inline.z_index.or(self.cascade.z_index).unwrap_or(ZIndex::Auto)
    }

    /// Insert `element` before every existing child.
    pub fn insert_first(&mut self, element: Element) -> NodeId {
        self.next_node += 1;
        let id = NodeId(self.next_node);
        self.children.insert(0, (id, element));
        id
    }

    /// Append after every existing child (host content, not effect layers).
    pub fn append(&mut self, element: Element) -> NodeId {
        self.next_node += 1;
        let id = NodeId(self.next_node);
        self.children.push((id, element));
        id
    }

    /// Remove a child; returns whether it was present.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let before = self.children.len();
        self.children.retain(|(child, _)| *child != id);
        before != self.children.len()
    }

    pub fn set_child_z_index(&mut self, id: NodeId, z: i32) {
        if let Some((_, el)) = self.children.iter_mut().find(|(child, _)| *child == id) {
            el.z_index = Some(z);
        }
    }

    pub fn child(&self, id: NodeId) -> Option<&Element> {
        self.children.iter().find(|(child, _)| *child == id).map(|(_, el)| el)
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.children.first().map(|(id, _)| *id)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}
