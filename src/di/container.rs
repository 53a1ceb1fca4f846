use super::definition::{Bean, Tag, TypeDef, TypeInfo, TypeTable};
use super::factory::{FactoryId, FactoryMethod};
use super::handle::{Shared, downcast, lock};
use super::registry::{BeanId, BeanRef, Registry};
use crate::config::{ConfigStore, ValueBeanCache};
use crate::error::{Result, WireError};
use crate::role::Role;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// A type collected by an `Entities` bean instead of being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityType {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

/// The entity types collected so far, injectable into beans and factories.
///
/// A factory taking `&EntityTypes` is re-run whenever another entity is
/// collected, so by the end of the build it has seen every entity.
///
/// ```ignore
/// impl OrmConfig {
///     fn migrate(&self, entities: &EntityTypes) -> Migrator {
///         Migrator::new(entities.names())
///     }
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EntityTypes(Vec<EntityType>);

impl EntityTypes {
    pub fn as_slice(&self) -> &[EntityType] {
        &self.0
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.type_name).collect()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.0.iter().any(|e| e.type_id == TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn set(&mut self, entities: &[EntityType]) {
        self.0 = entities.to_vec();
    }
}

impl Bean for EntityTypes {
    fn define(def: &mut TypeDef<Self>) {
        def.embed::<crate::role::Component>();
    }
}

/// What one reload changed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    /// Config keys whose resolved value changed.
    pub changed: Vec<String>,
    /// Factory methods re-run, in the order they ran.
    pub recalled: Vec<String>,
}

impl ReloadSummary {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.recalled.is_empty()
    }
}

/// The bean graph and the config it was built from.
///
/// Beans are created by [`Container::build`] and live as long as the
/// container. After construction the graph is read-only; only config values
/// and factory results change, through [`Container::reload`].
pub struct Container {
    pub(crate) types: TypeTable,
    pub(crate) registry: Registry,
    pub(crate) factories: Vec<FactoryMethod>,
    pub(crate) entities: Vec<EntityType>,
    pub(crate) config: ConfigStore,
    pub(crate) values: ValueBeanCache,
    reload_lock: Mutex<()>,
}

impl Container {
    pub fn new(config: ConfigStore) -> Self {
        Self {
            types: TypeTable::default(),
            registry: Registry::default(),
            factories: Vec::new(),
            entities: Vec::new(),
            config,
            values: ValueBeanCache::new(),
            reload_lock: Mutex::new(()),
        }
    }

    /// Structs embedding `M` classify as `role` unless a stronger marker applies.
    pub fn component_marker<M: 'static>(&mut self, role: Role) {
        self.types.add_component::<M>(role);
    }

    /// Role a field of type `T` tagged with `tag` gets.
    pub fn classify<T: Bean>(&mut self, tag: &Tag) -> Role {
        self.types.entry(TypeInfo::of::<T>()).classify(tag)
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn values(&self) -> &ValueBeanCache {
        &self.values
    }

    /// The only registered bean of type `T`.
    pub fn bean<T: Bean>(&self) -> Result<Shared<T>> {
        let info = TypeInfo::of::<T>();
        match self.unique_of(info)? {
            Some(id) => downcast(&self.registry.slot(id).instance),
            None => Err(WireError::BeanNotFound {
                type_name: info.name().to_string(),
                name: None,
            }),
        }
    }

    pub fn named<T: Bean>(&self, name: &str) -> Result<Shared<T>> {
        let info = TypeInfo::of::<T>();
        match self.registry.lookup(info.id(), name) {
            Some(id) => downcast(&self.registry.slot(id).instance),
            None => Err(WireError::BeanNotFound {
                type_name: info.name().to_string(),
                name: Some(name.to_string()),
            }),
        }
    }

    /// All registered beans of type `T` with their names.
    pub fn beans_of<T: Bean>(&self) -> Result<Vec<(String, Shared<T>)>> {
        self.registry
            .of_type(TypeId::of::<T>())
            .into_iter()
            .map(|(name, id)| Ok((name.to_string(), downcast(&self.registry.slot(id).instance)?)))
            .collect()
    }

    pub fn contains<T: Bean>(&self) -> bool {
        !self.registry.of_type(TypeId::of::<T>()).is_empty()
    }

    /// Registered beans with `role`, in creation order.
    pub fn beans_with_role(&self, role: Role) -> Vec<BeanRef> {
        self.registry
            .registered()
            .filter(|(_, slot)| slot.role == role)
            .map(|(_, slot)| BeanRef::new(slot))
            .collect()
    }

    pub fn beans(&self) -> Vec<BeanRef> {
        self.registry
            .registered()
            .map(|(_, slot)| BeanRef::new(slot))
            .collect()
    }

    pub fn entities(&self) -> &[EntityType] {
        &self.entities
    }

    pub fn factory_names(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-read the config source and push changed values into the graph.
    ///
    /// Fields bound to a changed key are updated in place, then every factory
    /// fed by such a field is re-run, followed by the factories that read
    /// its result. Each factory runs at most once per reload. If the source
    /// cannot be read the current document is kept and nothing changes.
    pub fn reload(&self) -> Result<ReloadSummary> {
        let _guard = lock(&self.reload_lock);
        self.config.reload()?;
        self.propagate()
    }

    /// Same as [`Container::reload`] with a document supplied by the caller.
    pub fn reload_with(&self, document: Value) -> Result<ReloadSummary> {
        let _guard = lock(&self.reload_lock);
        self.config.replace(document);
        self.propagate()
    }

    fn propagate(&self) -> Result<ReloadSummary> {
        let propagation = self.values.propagate(&self.config);
        for key in &propagation.changed {
            tracing::info!("Config value '{}' changed", key);
        }
        let recalled = self.recall(propagation.recall)?;
        Ok(ReloadSummary {
            changed: propagation.changed,
            recalled,
        })
    }

    /// Factories reading `bean`, other than `except`.
    pub(crate) fn consumers_of(
        &self,
        bean: BeanId,
        except: Option<FactoryId>,
    ) -> BTreeSet<FactoryId> {
        self.factories
            .iter()
            .filter(|f| Some(f.id) != except && f.sources.contains(&bean))
            .map(|f| f.id)
            .collect()
    }

    /// Re-run `seeds` and every factory reading their results, transitively.
    ///
    /// Each factory runs once, after the pending factories whose targets it
    /// reads. Factories caught in a cycle run in id order.
    pub(crate) fn recall(&self, seeds: BTreeSet<FactoryId>) -> Result<Vec<String>> {
        let mut pending = seeds;
        let mut frontier: Vec<FactoryId> = pending.iter().copied().collect();
        while let Some(id) = frontier.pop() {
            let method = &self.factories[id.0];
            for consumer in self.consumers_of(method.target, Some(id)) {
                if pending.insert(consumer) {
                    frontier.push(consumer);
                }
            }
        }

        let mut recalled = Vec::new();
        while !pending.is_empty() {
            let ready = pending.iter().copied().find(|id| {
                let sources = &self.factories[id.0].sources;
                pending
                    .iter()
                    .all(|other| other == id || !sources.contains(&self.factories[other.0].target))
            });
            let Some(id) = ready.or_else(|| pending.first().copied()) else {
                break;
            };
            pending.remove(&id);
            if ready.is_none() {
                tracing::debug!("Factory cycle, recalling {} first", self.factories[id.0].name);
            }

            let method = &self.factories[id.0];
            tracing::info!("Recall factory method {}", method.name);
            method.call(&self.registry)?;
            recalled.push(method.name.clone());
        }
        Ok(recalled)
    }

    pub(crate) fn unique_of(&self, info: TypeInfo) -> Result<Option<BeanId>> {
        let beans = self.registry.of_type(info.id());
        match beans.as_slice() {
            [] => Ok(None),
            [(_, id)] => Ok(Some(*id)),
            _ => Err(WireError::AmbiguousBean {
                type_name: info.name().to_string(),
                candidates: beans.iter().map(|(name, _)| name.to_string()).collect(),
            }),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(ConfigStore::from_value(Value::Object(Default::default())))
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("beans", &self.beans())
            .field("factories", &self.factory_names())
            .field("entities", &self.entities)
            .field("values", &self.values.len())
            .finish()
    }
}
