//! Ad kind descriptors and their specialization graph.
//!
//! A kind is either:
//! - a [`KindForm::Capability`]: an interface-like tag; one kind may carry many,
//!   and a capability may extend other capabilities
//! - a [`KindForm::Concrete`]: a class-like kind with at most one concrete parent
//!
//! The graph is declared once with [`KindGraphBuilder`] and is immutable
//! afterwards. Handles are only handed out for kinds that are already
//! declared, so the graph is acyclic by construction.
//!
//! # Example
//!
//! ```rust
//! use adunify_kernel::kind::{standard, KindGraph};
//!
//! let mut builder = KindGraph::standard_builder();
//! let custom = builder
//!     .concrete("custom_interstitial", None, &[standard::INTERSTITIAL])
//!     .unwrap();
//! let graph = builder.build();
//!
//! assert!(graph.is_assignable(standard::INTERSTITIAL, custom));
//! assert!(graph.is_assignable(standard::AD, custom));
//! assert!(!graph.is_assignable(standard::REWARDED, custom));
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MediationError, MediationResult};

/// Handle to a kind declared in a [`KindGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdKind(u32);

impl AdKind {
    /// Position of the kind in declaration order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind#{}", self.0)
    }
}

/// Well-known kinds pre-declared by [`KindGraph::standard`].
pub mod standard {
    use super::AdKind;

    /// Root capability every standard kind extends.
    pub const AD: AdKind = AdKind(0);
    /// Full-screen ad shown at natural breaks.
    pub const INTERSTITIAL: AdKind = AdKind(1);
    /// Full-screen ad that grants a reward on completion.
    pub const REWARDED: AdKind = AdKind(2);
    /// Inline banner.
    pub const BANNER: AdKind = AdKind(3);
    /// Ad shown while the application starts.
    pub const APP_OPEN: AdKind = AdKind(4);

    pub(super) const DECLARATIONS: [(&str, AdKind); 4] = [
        ("interstitial", INTERSTITIAL),
        ("rewarded", REWARDED),
        ("banner", BANNER),
        ("app_open", APP_OPEN),
    ];
}

/// Shape of a kind in the specialization graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindForm {
    /// Interface-like tag.
    Capability,
    /// Class-like kind with single inheritance.
    Concrete,
}

impl fmt::Display for KindForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindForm::Capability => write!(f, "capability"),
            KindForm::Concrete => write!(f, "concrete"),
        }
    }
}

#[derive(Debug, Clone)]
struct KindNode {
    name: String,
    form: KindForm,
    parent: Option<AdKind>,
    capabilities: Vec<AdKind>,
}

/// Immutable specialization graph of ad kinds.
#[derive(Debug, Clone, Default)]
pub struct KindGraph {
    nodes: Vec<KindNode>,
    by_name: HashMap<String, AdKind>,
}

impl KindGraph {
    /// Create a builder for an empty graph.
    pub fn builder() -> KindGraphBuilder {
        KindGraphBuilder::new()
    }

    /// Create a builder pre-loaded with the [`standard`] kinds.
    pub fn standard_builder() -> KindGraphBuilder {
        let mut builder = KindGraphBuilder::new();
        builder.push("ad", KindForm::Capability, None, Vec::new());
        for (name, _) in standard::DECLARATIONS {
            builder.push(name, KindForm::Capability, None, vec![standard::AD]);
        }
        builder
    }

    /// Graph holding only the [`standard`] kinds.
    pub fn standard() -> Self {
        Self::standard_builder().build()
    }

    /// Number of declared kinds.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph declares no kinds.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if `kind` was declared in this graph.
    pub fn contains(&self, kind: AdKind) -> bool {
        kind.index() < self.nodes.len()
    }

    /// Iterate all kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = AdKind> + '_ {
        (0..self.nodes.len()).map(|i| AdKind(i as u32))
    }

    /// Look up a kind by name.
    pub fn lookup(&self, name: &str) -> Option<AdKind> {
        self.by_name.get(name).copied()
    }

    /// Name of a kind, or `"<unknown>"` for a foreign handle.
    pub fn name(&self, kind: AdKind) -> &str {
        self.node(kind).map_or("<unknown>", |n| n.name.as_str())
    }

    pub fn form(&self, kind: AdKind) -> Option<KindForm> {
        self.node(kind).map(|n| n.form)
    }

    pub fn parent(&self, kind: AdKind) -> Option<AdKind> {
        self.node(kind).and_then(|n| n.parent)
    }

    /// Concrete ancestors of `kind`, nearest first.
    pub fn ancestors(&self, kind: AdKind) -> Vec<AdKind> {
        let mut chain = Vec::new();
        let mut current = self.parent(kind);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent(parent);
        }
        chain
    }

    /// Every capability carried by `kind`, through its parents and through
    /// capability extension. Excludes `kind` itself; declaration order.
    pub fn all_capabilities(&self, kind: AdKind) -> Vec<AdKind> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<AdKind> = Vec::new();

        let mut current = Some(kind);
        while let Some(k) = current {
            if let Some(node) = self.node(k) {
                stack.extend(node.capabilities.iter().copied());
            }
            current = self.parent(k);
        }

        while let Some(capability) = stack.pop() {
            if capability == kind || seen[capability.index()] {
                continue;
            }
            seen[capability.index()] = true;
            if let Some(node) = self.node(capability) {
                stack.extend(node.capabilities.iter().copied());
            }
        }

        self.kinds().filter(|k| seen[k.index()]).collect()
    }

    /// Check whether an adapter registered for `registered` can serve a
    /// request for `requested`.
    pub fn is_assignable(&self, registered: AdKind, requested: AdKind) -> bool {
        if registered == requested {
            return self.contains(registered);
        }
        match self.form(registered) {
            Some(KindForm::Concrete) => self.ancestors(requested).contains(&registered),
            Some(KindForm::Capability) => self.all_capabilities(requested).contains(&registered),
            None => false,
        }
    }

    /// Fail with [`MediationError::UnknownKind`] for foreign handles.
    pub fn ensure_contains(&self, kind: AdKind) -> MediationResult<()> {
        if self.contains(kind) {
            Ok(())
        } else {
            Err(MediationError::UnknownKind(kind))
        }
    }

    fn node(&self, kind: AdKind) -> Option<&KindNode> {
        self.nodes.get(kind.index())
    }
}

/// Builder for [`KindGraph`].
#[derive(Debug, Default)]
pub struct KindGraphBuilder {
    graph: KindGraph,
}

impl KindGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a capability extending zero or more capabilities.
    pub fn capability(
        &mut self,
        name: impl Into<String>,
        extends: &[AdKind],
    ) -> MediationResult<AdKind> {
        let name = name.into();
        self.check_name(&name)?;
        self.check_capabilities(&name, extends)?;
        Ok(self.push(name, KindForm::Capability, None, extends.to_vec()))
    }

    /// Declare a concrete kind with an optional concrete parent and the
    /// capabilities it implements directly.
    pub fn concrete(
        &mut self,
        name: impl Into<String>,
        parent: Option<AdKind>,
        implements: &[AdKind],
    ) -> MediationResult<AdKind> {
        let name = name.into();
        self.check_name(&name)?;
        if let Some(parent) = parent {
            match self.graph.form(parent) {
                Some(KindForm::Concrete) => {}
                Some(KindForm::Capability) => {
                    return Err(MediationError::InvalidKindGraph(format!(
                        "'{}' cannot use capability '{}' as its parent",
                        name,
                        self.graph.name(parent)
                    )));
                }
                None => return Err(MediationError::UnknownKind(parent)),
            }
        }
        self.check_capabilities(&name, implements)?;
        Ok(self.push(name, KindForm::Concrete, parent, implements.to_vec()))
    }

    pub fn build(self) -> KindGraph {
        self.graph
    }

    fn check_name(&self, name: &str) -> MediationResult<()> {
        if name.is_empty() {
            return Err(MediationError::InvalidKindGraph(
                "kind name must not be empty".to_string(),
            ));
        }
        if self.graph.by_name.contains_key(name) {
            return Err(MediationError::InvalidKindGraph(format!(
                "kind '{}' declared twice",
                name
            )));
        }
        Ok(())
    }

    fn check_capabilities(&self, name: &str, capabilities: &[AdKind]) -> MediationResult<()> {
        for &capability in capabilities {
            match self.graph.form(capability) {
                Some(KindForm::Capability) => {}
                Some(KindForm::Concrete) => {
                    return Err(MediationError::InvalidKindGraph(format!(
                        "'{}' lists concrete kind '{}' as a capability",
                        name,
                        self.graph.name(capability)
                    )));
                }
                None => return Err(MediationError::UnknownKind(capability)),
            }
        }
        Ok(())
    }

    fn push(
        &mut self,
        name: impl Into<String>,
        form: KindForm,
        parent: Option<AdKind>,
        capabilities: Vec<AdKind>,
    ) -> AdKind {
        let name = name.into();
        let kind = AdKind(self.graph.nodes.len() as u32);
        self.graph.by_name.insert(name.clone(), kind);
        self.graph.nodes.push(KindNode {
            name,
            form,
            parent,
            capabilities,
        });
        kind
    }
}
