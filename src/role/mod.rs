//! Role classification
//!
//! Every `Autowired` field is assigned a [`Role`]. An explicit tag wins;
//! otherwise the markers embedded in the target type decide, checked in a
//! fixed priority order:
//!
//! ```text
//! Configuration > Entities > Controller > Middleware > Router > Testing > component set
//! ```
//!
//! A type that embeds none of them is a [`Role::LeafValue`] and is never
//! built as a dependency.

mod marker;

pub use marker::{
    Component, Configuration, Controller, Entities, Middleware, Parameter, Repository, Router,
    Testing,
};

use std::any::TypeId;
use std::collections::HashMap;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Functional category of a bean.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Configuration,
    Controller,
    Middleware,
    Router,
    Entities,
    Repository,
    Testing,
    #[strum(to_string = "component")]
    GenericComponent,
    #[strum(to_string = "value")]
    LeafValue,
}

/// Role markers in the order structural inference checks them.
fn marker_priority() -> [(TypeId, Role); 6] {
    [
        (TypeId::of::<Configuration>(), Role::Configuration),
        (TypeId::of::<Entities>(), Role::Entities),
        (TypeId::of::<Controller>(), Role::Controller),
        (TypeId::of::<Middleware>(), Role::Middleware),
        (TypeId::of::<Router>(), Role::Router),
        (TypeId::of::<Testing>(), Role::Testing),
    ]
}

/// Marker types that make an embedding struct a component.
#[derive(Debug, Clone)]
pub struct ComponentSet {
    markers: HashMap<TypeId, Role>,
}

impl ComponentSet {
    pub fn new() -> Self {
        let mut markers = HashMap::new();
        markers.insert(TypeId::of::<Component>(), Role::GenericComponent);
        markers.insert(TypeId::of::<Parameter>(), Role::GenericComponent);
        markers.insert(TypeId::of::<Repository>(), Role::Repository);
        Self { markers }
    }

    /// Add a user marker type; structs embedding `M` classify as `role`.
    pub fn insert<M: 'static>(&mut self, role: Role) {
        self.markers.insert(TypeId::of::<M>(), role);
    }

    pub fn contains(&self, marker: TypeId) -> bool {
        self.markers.contains_key(&marker)
    }

    fn role_of(&self, marker: &TypeId) -> Option<Role> {
        self.markers.get(marker).copied()
    }
}

impl Default for ComponentSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer a role from the marker types a struct embeds.
pub fn infer(markers: &[TypeId], components: &ComponentSet) -> Role {
    for (marker, role) in marker_priority() {
        if markers.contains(&marker) {
            return role;
        }
    }
    markers
        .iter()
        .find_map(|m| components.role_of(m))
        .unwrap_or(Role::LeafValue)
}

/// Classify a field: explicit tag role first, the target's inferred role otherwise.
pub fn classify(explicit: Option<Role>, inferred: Role) -> Role {
    explicit.unwrap_or(inferred)
}
