//! Arena-backed declaration tree.
//!
//! The locator flattens every schema and handler it finds into a
//! [`DeclArena`]: a vector of [`SyntaxNode`]s addressed by [`NodeId`]. Each
//! declaration is a root node whose children describe only the structure the
//! rewriters need, with byte spans into the original text.
//!
//! Node names are interned into a [`bumpalo::Bump`] arena. Repeated names
//! (`params`, `client`, field names shared between schemas) are stored once per
//! file, and the whole tree is freed when the arena is reset.
//!
//! # Layout
//!
//! ```text
//! Schema                      Handler
//! └─ ObjectBody               ├─ ParamList
//!    └─ Member*               │  └─ ObjectPattern ─ PatternField*
//!                             │     | ParamBinding
//!                             ├─ Block ─ Statement*
//!                             └─ CallArgument*
//! ```
//!
//! ```
//! use bumpalo::Bump;
//! use ir_core::{SourceLocation, Span};
//! use ir_ts_parser::arena::{DeclArena, NodeKind, SyntaxNode};
//!
//! let bump = Bump::new();
//! let mut arena = DeclArena::new(&bump);
//! let name = arena.intern("boardSchema");
//! let root = arena.push_root(SyntaxNode::new(NodeKind::Schema, Span::new(13, 40), SourceLocation::default()).named(name));
//! let body = arena.push_child(root, SyntaxNode::new(NodeKind::ObjectBody, Span::new(33, 39), SourceLocation::default()));
//!
//! assert_eq!(arena.child(root, NodeKind::ObjectBody), Some(body));
//! assert_eq!(arena.declarations().count(), 1);
//! ```

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

use bumpalo::Bump;
use ir_core::{
    Declaration, DeclarationKind, FxHashMap, HandlerSignature, SourceLocation, Span,
};
use smallvec::SmallVec;

/// Zero-cost newtype for arena-allocated strings.
///
/// Has the same layout as `&str`; the wrapper only keeps arena-backed names
/// from being mixed up with owned strings.
#[derive(Debug, Clone, Copy)]
pub struct ArenaStr<'a>(&'a str);

impl<'a> ArenaStr<'a> {
    /// Wraps an arena-allocated string slice.
    #[inline]
    #[must_use]
    pub const fn new(s: &'a str) -> Self {
        Self(s)
    }

    /// Returns the underlying string slice.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.0
    }
}

impl AsRef<str> for ArenaStr<'_> {
    #[inline]
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl Borrow<str> for ArenaStr<'_> {
    #[inline]
    fn borrow(&self) -> &str {
        self.0
    }
}

impl std::ops::Deref for ArenaStr<'_> {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl PartialEq for ArenaStr<'_> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialEq<str> for ArenaStr<'_> {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Eq for ArenaStr<'_> {}

impl Hash for ArenaStr<'_> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::fmt::Display for ArenaStr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// String interner backed by a bump arena.
///
/// Repeated strings return the same arena-allocated reference.
///
/// ```
/// use bumpalo::Bump;
/// use ir_ts_parser::arena::StringInterner;
///
/// let bump = Bump::new();
/// let mut interner = StringInterner::new(&bump);
/// let a = interner.intern("params");
/// let b = interner.intern("params");
/// assert!(std::ptr::eq(a.as_str(), b.as_str()));
/// assert_eq!(interner.len(), 1);
/// ```
#[derive(Debug)]
pub struct StringInterner<'bump> {
    arena: &'bump Bump,
    interned: FxHashMap<&'bump str, ArenaStr<'bump>>,
}

impl<'bump> StringInterner<'bump> {
    /// Creates a new string interner backed by the given arena.
    #[inline]
    #[must_use]
    pub fn new(arena: &'bump Bump) -> Self {
        Self {
            arena,
            interned: FxHashMap::default(),
        }
    }

    /// Interns a string, returning an arena-allocated reference.
    #[inline]
    pub fn intern(&mut self, s: &str) -> ArenaStr<'bump> {
        if let Some(&existing) = self.interned.get(s) {
            return existing;
        }

        let allocated = self.arena.alloc_str(s);
        let arena_str = ArenaStr::new(allocated);
        self.interned.insert(allocated, arena_str);
        arena_str
    }

    /// Returns the number of unique strings interned.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.interned.len()
    }

    /// Returns `true` if no strings have been interned.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interned.is_empty()
    }
}

/// Index of a node inside a [`DeclArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the position of the node in the arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a [`SyntaxNode`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of a schema declaration (`const fooSchema = z.object(...)`).
    Schema,
    /// The object literal passed to the schema factory. Anchor: the `}`.
    ObjectBody,
    /// A property, shorthand, spread or method inside an object body.
    Member,
    /// Root of a handler declaration (an `async` arrow function).
    Handler,
    /// The handler's parameter list, parenthesized or bare.
    ParamList,
    /// A destructuring pattern parameter. Anchor: where a type annotation goes.
    ObjectPattern,
    /// One binding inside an object pattern.
    PatternField,
    /// A single identifier parameter. Anchor: where a type annotation goes.
    ParamBinding,
    /// The block new statements are inserted into. Anchor: just after `{`.
    Block,
    /// A statement (or comment) directly inside the block.
    Statement,
    /// An argument identifier that names the positional parameter.
    CallArgument,
}

/// Bit set of structural facts about a node.
///
/// ```
/// use ir_ts_parser::arena::NodeFlags;
///
/// let flags = NodeFlags::ANNOTATED | NodeFlags::PARENTHESIZED;
/// assert!(flags.contains(NodeFlags::ANNOTATED));
/// assert!(!flags.contains(NodeFlags::INJECTED));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeFlags(u8);

impl NodeFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The member list ends with a comma.
    pub const TRAILING_COMMA: Self = Self(1);
    /// The parameter already has a type annotation.
    pub const ANNOTATED: Self = Self(1 << 1);
    /// The parameter list is wrapped in parentheses.
    pub const PARENTHESIZED: Self = Self(1 << 2);
    /// The declaration already carries the injection marker.
    pub const INJECTED: Self = Self(1 << 3);
    /// The member or field is a spread (`...x`) or rest element.
    pub const SPREAD: Self = Self(1 << 4);
    /// The parameter list has a shape the rewriter does not handle.
    pub const UNSUPPORTED: Self = Self(1 << 5);
    /// The handler already binds the routing field.
    pub const BINDS_ROUTING: Self = Self(1 << 6);

    /// Returns `true` if every flag in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets every flag in `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Sets or clears `other` depending on `value`.
    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl std::ops::BitOr for NodeFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One node of the declaration tree.
#[derive(Debug, Clone)]
pub struct SyntaxNode<'bump> {
    /// What this node represents.
    pub kind: NodeKind,

    /// Declaration name, member key or bound identifier.
    pub name: Option<ArenaStr<'bump>>,

    /// Byte range in the original text.
    pub span: Span,

    /// Byte offset where appended content goes (see [`NodeKind`]).
    pub anchor: u32,

    /// Position of the node's first byte.
    pub location: SourceLocation,

    /// Structural facts.
    pub flags: NodeFlags,

    /// Parent node; `None` for declaration roots.
    pub parent: Option<NodeId>,

    children: SmallVec<[NodeId; 4]>,
}

impl<'bump> SyntaxNode<'bump> {
    /// Creates a node whose anchor is the end of its span.
    #[must_use]
    pub fn new(kind: NodeKind, span: Span, location: SourceLocation) -> Self {
        Self {
            kind,
            name: None,
            span,
            anchor: span.end,
            location,
            flags: NodeFlags::NONE,
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Sets the node's name.
    #[must_use]
    pub fn named(mut self, name: ArenaStr<'bump>) -> Self {
        self.name = Some(name);
        self
    }

    /// Sets the node's anchor offset.
    #[must_use]
    pub fn anchored(mut self, anchor: u32) -> Self {
        self.anchor = anchor;
        self
    }

    /// Adds flags to the node.
    #[must_use]
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags.insert(flags);
        self
    }

    /// Returns the node's name, or `""` if it has none.
    #[inline]
    #[must_use]
    pub fn name_str(&self) -> &'bump str {
        self.name.map_or("", |n| n.as_str())
    }

    /// Returns `true` if the node has the given flags.
    #[inline]
    #[must_use]
    pub const fn has(&self, flags: NodeFlags) -> bool {
        self.flags.contains(flags)
    }
}

/// Flat, index-addressed tree of the declarations found in one file.
#[derive(Debug)]
pub struct DeclArena<'bump> {
    interner: StringInterner<'bump>,
    nodes: Vec<SyntaxNode<'bump>>,
    roots: SmallVec<[NodeId; 16]>,
}

impl<'bump> DeclArena<'bump> {
    /// Creates an empty arena whose names live in `bump`.
    #[must_use]
    pub fn new(bump: &'bump Bump) -> Self {
        Self {
            interner: StringInterner::new(bump),
            nodes: Vec::new(),
            roots: SmallVec::new(),
        }
    }

    /// Interns a name for use in a node.
    #[inline]
    pub fn intern(&mut self, s: &str) -> ArenaStr<'bump> {
        self.interner.intern(s)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn alloc(&mut self, node: SyntaxNode<'bump>) -> NodeId {
        // Node counts are bounded by file size, which fits in u32.
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Adds a declaration root.
    pub fn push_root(&mut self, node: SyntaxNode<'bump>) -> NodeId {
        let id = self.alloc(node);
        self.roots.push(id);
        id
    }

    /// Appends `node` as the last child of `parent`.
    pub fn push_child(&mut self, parent: NodeId, mut node: SyntaxNode<'bump>) -> NodeId {
        node.parent = Some(parent);
        let id = self.alloc(node);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Returns the node with the given id.
    ///
    /// Ids are only handed out by this arena, so lookups never miss.
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SyntaxNode<'bump> {
        &self.nodes[id.index()]
    }

    /// Returns a mutable reference to the node with the given id.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut SyntaxNode<'bump> {
        &mut self.nodes[id.index()]
    }

    /// Iterates over declaration roots in source order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.iter().copied()
    }

    /// Iterates over the children of `id` in source order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).children.iter().copied()
    }

    /// Iterates over the children of `id` that have the given kind.
    pub fn children_of(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(move |&c| self.node(c).kind == kind)
    }

    /// Returns the first child of `id` with the given kind.
    #[must_use]
    pub fn child(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of(id, kind).next()
    }

    /// Returns the last child of `id` with the given kind.
    #[must_use]
    pub fn last_child(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of(id, kind).last()
    }

    /// Returns the number of nodes in the arena.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the arena holds no nodes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Builds the owned [`Declaration`] for a root node.
    ///
    /// Returns `None` if `root` is not a declaration root.
    #[must_use]
    pub fn declaration(&self, root: NodeId) -> Option<Declaration> {
        let node = self.node(root);
        let kind = match node.kind {
            NodeKind::Schema => DeclarationKind::Schema,
            NodeKind::Handler => DeclarationKind::Handler,
            _ => return None,
        };
        Some(Declaration {
            name: node.name_str().to_owned(),
            kind,
            span: node.span,
            location: node.location,
            already_injected: node.has(NodeFlags::INJECTED),
        })
    }

    /// Iterates over all located declarations in source order.
    pub fn declarations(&self) -> impl Iterator<Item = Declaration> + '_ {
        self.roots().filter_map(|id| self.declaration(id))
    }

    /// Classifies a handler's parameter list.
    ///
    /// Returns `None` for nodes that are not handlers and for parameter shapes
    /// the rewriter does not support. An empty list `()` is a destructured
    /// signature with no fields.
    #[must_use]
    pub fn signature(&self, handler: NodeId) -> Option<HandlerSignature> {
        if self.node(handler).kind != NodeKind::Handler {
            return None;
        }
        let binds_routing = self.node(handler).has(NodeFlags::BINDS_ROUTING);
        let params = self.child(handler, NodeKind::ParamList)?;
        if self.node(params).has(NodeFlags::UNSUPPORTED) {
            return None;
        }

        if let Some(binding) = self.child(params, NodeKind::ParamBinding) {
            return Some(HandlerSignature::positional(
                self.node(binding).name_str(),
                binds_routing,
            ));
        }

        let fields = self
            .child(params, NodeKind::ObjectPattern)
            .into_iter()
            .flat_map(|pattern| self.children_of(pattern, NodeKind::PatternField))
            .map(|field| self.node(field).name_str());
        Some(HandlerSignature::destructured(fields, binds_routing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_core::HandlerShape;

    fn node<'a>(kind: NodeKind, start: u32, end: u32) -> SyntaxNode<'a> {
        SyntaxNode::new(kind, Span::new(start, end), SourceLocation::default())
    }

    #[test]
    fn test_arena_str_basic() {
        let bump = Bump::new();
        let s = ArenaStr::new(bump.alloc_str("hello"));
        assert_eq!(s.as_str(), "hello");
        assert_eq!(s.len(), 5);
        assert!(s == *"hello");
    }

    #[test]
    fn test_interner_deduplicates() {
        let bump = Bump::new();
        let mut interner = StringInterner::new(&bump);
        let a = interner.intern("client");
        let b = interner.intern("client");
        let c = interner.intern("restParams");
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
        assert_ne!(a, c);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_node_flags() {
        let mut flags = NodeFlags::NONE;
        assert!(!flags.contains(NodeFlags::SPREAD));
        flags.insert(NodeFlags::SPREAD);
        flags.set(NodeFlags::INJECTED, true);
        assert!(flags.contains(NodeFlags::SPREAD | NodeFlags::INJECTED));
        flags.set(NodeFlags::SPREAD, false);
        assert!(!flags.contains(NodeFlags::SPREAD));
        assert!(flags.contains(NodeFlags::NONE));
    }

    #[test]
    fn test_parent_child_links() {
        let bump = Bump::new();
        let mut arena = DeclArena::new(&bump);
        let root = arena.push_root(node(NodeKind::Schema, 0, 30));
        let body = arena.push_child(root, node(NodeKind::ObjectBody, 10, 30).anchored(29));
        let a = arena.push_child(body, node(NodeKind::Member, 12, 15));
        let b = arena.push_child(body, node(NodeKind::Member, 17, 20));

        assert_eq!(arena.node(a).parent, Some(body));
        assert_eq!(arena.children(body).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(arena.last_child(body, NodeKind::Member), Some(b));
        assert_eq!(arena.node(body).anchor, 29);
        assert_eq!(arena.roots().count(), 1);
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_declarations_skip_non_roots() {
        let bump = Bump::new();
        let mut arena = DeclArena::new(&bump);
        let name = arena.intern("listBoards");
        let root = arena.push_root(
            node(NodeKind::Handler, 5, 50)
                .named(name)
                .with_flags(NodeFlags::INJECTED),
        );
        let params = arena.push_child(root, node(NodeKind::ParamList, 11, 13));

        let decls: Vec<_> = arena.declarations().collect();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "listBoards");
        assert_eq!(decls[0].kind, DeclarationKind::Handler);
        assert!(decls[0].already_injected);
        assert!(arena.declaration(params).is_none());
    }

    #[test]
    fn test_signature_shapes() {
        let bump = Bump::new();
        let mut arena = DeclArena::new(&bump);

        let empty = arena.push_root(node(NodeKind::Handler, 0, 20));
        arena.push_child(empty, node(NodeKind::ParamList, 6, 8));
        let sig = arena.signature(empty).expect("empty list is supported");
        assert_eq!(sig.shape, HandlerShape::Destructured);
        assert!(sig.bindings.is_empty());

        let positional = arena.push_root(node(NodeKind::Handler, 30, 60));
        let params = arena.push_child(positional, node(NodeKind::ParamList, 36, 44));
        let name = arena.intern("params");
        arena.push_child(params, node(NodeKind::ParamBinding, 37, 43).named(name));
        let sig = arena.signature(positional).expect("positional is supported");
        assert_eq!(sig.param_name(), Some("params"));

        let unsupported = arena.push_root(node(NodeKind::Handler, 70, 90));
        arena.push_child(
            unsupported,
            node(NodeKind::ParamList, 76, 82).with_flags(NodeFlags::UNSUPPORTED),
        );
        assert!(arena.signature(unsupported).is_none());
    }
}
