//! Graph construction.
//!
//! Building starts from a root type and walks its fields depth first. A bean
//! is registered before its own fields are visited, so a field that points
//! back at an ancestor (or at the bean itself) reuses the existing instance
//! and the walk terminates on any graph.

use super::container::{Container, EntityType, EntityTypes};
use super::definition::{Bean, FieldSpec, Tag, TypeEntry, TypeInfo};
use super::factory::{FactoryId, FactoryMethod};
use super::handle::{Shared, downcast, write_lock};
use super::registry::BeanId;
use crate::error::{Result, WireError};
use crate::role::Role;
use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

impl Container {
    /// Build `T` and everything reachable from it.
    ///
    /// The root is registered under its type name and always built, whatever
    /// its role. Building the same root twice returns the existing bean.
    pub fn build<T: Bean>(&mut self) -> Result<Shared<T>> {
        let id = self.build_root(TypeInfo::of::<T>())?;
        downcast(&self.registry.slot(id).instance)
    }

    pub(crate) fn build_root(&mut self, info: TypeInfo) -> Result<BeanId> {
        if let Some(id) = self.registry.lookup(info.id(), info.name()) {
            return Ok(id);
        }
        let entry = self.types.entry(info);
        tracing::debug!("Build root {} as {}", info.name(), entry.role);
        self.construct(info, &entry, info.name().to_string(), entry.role, None)
    }

    fn construct(
        &mut self,
        info: TypeInfo,
        entry: &TypeEntry,
        name: String,
        role: Role,
        prefix: Option<String>,
    ) -> Result<BeanId> {
        let prefix = prefix.or_else(|| entry.prefix.clone());
        let id = self.registry.insert(info, Some(name), role, prefix);
        tracing::debug!("Create bean {} as {}", self.registry.slot(id).label(), role);
        if info.id() == TypeId::of::<EntityTypes>() {
            self.publish_entities(id)?;
        }

        self.inject_fields(id, entry, role)?;
        if role == Role::Configuration {
            self.install_factories(id, entry)?;
        }
        Ok(id)
    }

    fn inject_fields(&mut self, id: BeanId, entry: &TypeEntry, role: Role) -> Result<()> {
        let owner = self.registry.instance(id);
        let mut bare: HashMap<TypeId, &'static str> = HashMap::new();

        for spec in &entry.fields {
            match spec {
                FieldSpec::Dependency {
                    field,
                    target,
                    tag,
                    assign,
                } => {
                    if role == Role::Entities {
                        self.record_entity(*target)?;
                        continue;
                    }
                    let target_entry = self.types.entry(*target);
                    let target_role = target_entry.classify(tag);
                    if target_role == Role::LeafValue {
                        tracing::debug!(
                            "Field {} ({}) is not a component, leaving it unwired",
                            field,
                            target.name()
                        );
                        continue;
                    }
                    if tag.explicit_name().is_none()
                        && let Some(other) = bare.insert(target.id(), *field)
                    {
                        return Err(WireError::AmbiguousBean {
                            type_name: target.name().to_string(),
                            candidates: vec![other.to_string(), field.to_string()],
                        });
                    }

                    let dependency = self.resolve(*target, &target_entry, tag, target_role)?;
                    assign(&owner, &self.registry.instance(dependency))?;
                    self.registry.slot_mut(id).deps.push(dependency);
                }
                FieldSpec::Value {
                    field,
                    key,
                    default,
                    bind,
                } => {
                    let bean = self.values.get_or_create(&self.config, key, default.as_deref());
                    tracing::trace!("Inject value '{}' into field {}", key, field);
                    bind(&owner, &bean)?;
                    self.registry.slot_mut(id).values.push(bean);
                }
            }
        }
        Ok(())
    }

    /// Reuse a matching bean or create a new one for a dependency field.
    fn resolve(
        &mut self,
        info: TypeInfo,
        entry: &TypeEntry,
        tag: &Tag,
        role: Role,
    ) -> Result<BeanId> {
        let name = match tag.explicit_name() {
            Some(name) => name.to_string(),
            None => {
                if self.registry.of_type(info.id()).len() > 1 {
                    self.unique_of(info)?;
                }
                info.name().to_string()
            }
        };
        if let Some(existing) = self.registry.lookup(info.id(), &name) {
            tracing::trace!("Reuse bean {}", self.registry.slot(existing).label());
            return Ok(existing);
        }
        let prefix = tag.route_prefix().map(str::to_string);
        self.construct(info, entry, name, role, prefix)
    }

    /// Collect an entity type and refresh every `EntityTypes` bean and the
    /// factories reading one.
    fn record_entity(&mut self, info: TypeInfo) -> Result<()> {
        if self.entities.iter().any(|e| e.type_id == info.id()) {
            return Ok(());
        }
        tracing::debug!("Collect entity {}", info.name());
        self.entities.push(EntityType {
            type_id: info.id(),
            type_name: info.name(),
        });

        let holders: Vec<BeanId> = self
            .registry
            .of_type(TypeId::of::<EntityTypes>())
            .into_iter()
            .map(|(_, id)| id)
            .collect();
        for holder in holders {
            self.publish_entities(holder)?;
            let consumers = self.consumers_of(holder, None);
            if !consumers.is_empty() {
                self.recall(consumers)?;
            }
        }
        Ok(())
    }

    fn publish_entities(&self, holder: BeanId) -> Result<()> {
        let bean = downcast::<EntityTypes>(&self.registry.slot(holder).instance)?;
        write_lock(&bean).set(&self.entities);
        Ok(())
    }

    fn install_factories(&mut self, receiver: BeanId, entry: &TypeEntry) -> Result<()> {
        for spec in &entry.factories {
            let name = format!("{}::{}", self.registry.slot(receiver).info.name(), spec.method);
            let params = spec
                .params
                .iter()
                .map(|param| self.resolve_parameter(*param))
                .collect::<Result<Vec<_>>>()?;

            let target_name = spec
                .target_name
                .clone()
                .unwrap_or_else(|| spec.output.name().to_string());
            let target = match self.registry.lookup(spec.output.id(), &target_name) {
                Some(existing) => existing,
                None => {
                    let output = self.types.entry(spec.output);
                    let prefix = output.prefix.clone();
                    self.registry
                        .insert(spec.output, Some(target_name), output.role, prefix)
                }
            };

            let id = FactoryId(self.factories.len());
            let mut sources = BTreeSet::new();
            self.collect_sources(receiver, &mut sources);
            for param in &params {
                self.collect_sources(*param, &mut sources);
            }
            for bean in &sources {
                for value in &self.registry.slot(*bean).values {
                    value.subscribe(id);
                }
            }

            let method = FactoryMethod {
                id,
                name,
                receiver,
                params,
                target,
                output: spec.output,
                produce: Arc::clone(&spec.produce),
                sources,
            };
            tracing::debug!(
                "Call factory method {} into {}",
                method.name,
                self.registry.slot(target).label()
            );
            method.call(&self.registry)?;
            self.factories.push(method);

            // Factories installed earlier may have read the old target.
            let consumers = self.consumers_of(target, Some(id));
            if !consumers.is_empty() {
                self.recall(consumers)?;
            }
        }
        Ok(())
    }

    /// An existing unique bean of the parameter type, or a fresh anonymous one.
    ///
    /// `EntityTypes` is registered under its type name instead, so later
    /// entities reach it. A configuration parameter gets its own factories.
    fn resolve_parameter(&mut self, info: TypeInfo) -> Result<BeanId> {
        if let Some(existing) = self.unique_of(info)? {
            return Ok(existing);
        }
        let entry = self.types.entry(info);
        if info.id() == TypeId::of::<EntityTypes>() {
            return self.construct(info, &entry, info.name().to_string(), entry.role, None);
        }
        let id = self.registry.insert(info, None, entry.role, None);
        tracing::debug!("Create parameter object {}", info.name());
        self.inject_fields(id, &entry, entry.role)?;
        if entry.role == Role::Configuration {
            self.install_factories(id, &entry)?;
        }
        Ok(id)
    }

    /// `bean` and every bean it depends on, transitively.
    fn collect_sources(&self, bean: BeanId, seen: &mut BTreeSet<BeanId>) {
        let mut stack = vec![bean];
        while let Some(next) = stack.pop() {
            if seen.insert(next) {
                stack.extend(self.registry.slot(next).deps.iter().copied());
            }
        }
    }
}
