use super::definition::TypeInfo;
use super::handle::{ErasedBean, Shared, downcast};
use crate::config::ValueBean;
use crate::error::Result;
use crate::role::Role;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Position of a bean in the container's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BeanId(pub(crate) usize);

/// Arena slot for one bean instance.
pub(crate) struct BeanSlot {
    /// `None` for anonymous factory parameter objects.
    pub(crate) name: Option<String>,
    pub(crate) role: Role,
    pub(crate) info: TypeInfo,
    pub(crate) instance: ErasedBean,
    pub(crate) prefix: Option<String>,
    pub(crate) deps: Vec<BeanId>,
    pub(crate) values: Vec<Arc<ValueBean>>,
}

impl BeanSlot {
    pub(crate) fn label(&self) -> String {
        match &self.name {
            Some(name) if name != self.info.name() => format!("{} ({})", name, self.info.name()),
            Some(name) => name.clone(),
            None => format!("<parameter {}>", self.info.name()),
        }
    }
}

/// Every bean the container built, indexed by `(type, name)`.
#[derive(Default)]
pub(crate) struct Registry {
    slots: Vec<BeanSlot>,
    index: HashMap<TypeId, BTreeMap<String, BeanId>>,
}

impl Registry {
    pub(crate) fn insert(
        &mut self,
        info: TypeInfo,
        name: Option<String>,
        role: Role,
        prefix: Option<String>,
    ) -> BeanId {
        let id = BeanId(self.slots.len());
        if let Some(name) = &name {
            self.index
                .entry(info.id())
                .or_default()
                .insert(name.clone(), id);
        }
        self.slots.push(BeanSlot {
            name,
            role,
            info,
            instance: info.create(),
            prefix,
            deps: Vec::new(),
            values: Vec::new(),
        });
        id
    }

    pub(crate) fn lookup(&self, type_id: TypeId, name: &str) -> Option<BeanId> {
        self.index.get(&type_id)?.get(name).copied()
    }

    /// Registered beans of one type, ordered by name.
    pub(crate) fn of_type(&self, type_id: TypeId) -> Vec<(&str, BeanId)> {
        self.index
            .get(&type_id)
            .map(|names| names.iter().map(|(n, id)| (n.as_str(), *id)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn slot(&self, id: BeanId) -> &BeanSlot {
        &self.slots[id.0]
    }

    pub(crate) fn slot_mut(&mut self, id: BeanId) -> &mut BeanSlot {
        &mut self.slots[id.0]
    }

    pub(crate) fn instance(&self, id: BeanId) -> ErasedBean {
        Arc::clone(&self.slots[id.0].instance)
    }

    /// Registered (named) beans in creation order.
    pub(crate) fn registered(&self) -> impl Iterator<Item = (BeanId, &BeanSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.name.is_some())
            .map(|(i, slot)| (BeanId(i), slot))
    }

    pub(crate) fn len(&self) -> usize {
        self.index.values().map(BTreeMap::len).sum()
    }
}

/// A registered bean as handed to collaborators.
#[derive(Clone)]
pub struct BeanRef {
    pub name: String,
    pub role: Role,
    pub type_name: &'static str,
    pub prefix: Option<String>,
    instance: ErasedBean,
}

impl BeanRef {
    pub(crate) fn new(slot: &BeanSlot) -> Self {
        Self {
            name: slot.name.clone().unwrap_or_default(),
            role: slot.role,
            type_name: slot.info.name(),
            prefix: slot.prefix.clone(),
            instance: Arc::clone(&slot.instance),
        }
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.instance.is::<std::sync::RwLock<T>>()
    }

    pub fn downcast<T: Send + Sync + 'static>(&self) -> Result<Shared<T>> {
        downcast(&self.instance)
    }

    pub fn instance(&self) -> &ErasedBean {
        &self.instance
    }
}

impl std::fmt::Debug for BeanRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanRef")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("type_name", &self.type_name)
            .field("prefix", &self.prefix)
            .finish()
    }
}
