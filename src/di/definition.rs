use super::factory::{Factory, FactorySpec};
use super::handle::{Autowired, ErasedBean, Value, downcast, read_lock, write_lock};
use crate::config::{FromConfig, ValueBean};
use crate::error::{Result, WireError};
use crate::role::{self, ComponentSet, Role};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

/// A type the container can build.
///
/// `define` lists the type's injectable fields, embedded markers and factory
/// methods. It is usually generated by `#[derive(Bean)]`.
///
/// ```ignore
/// #[derive(Default, Bean)]
/// struct RedisConfig {
///     marker: Configuration,
///     #[bean(value = "rady.redis.port", default = "6379")]
///     port: u16,
/// }
/// ```
pub trait Bean: Default + Send + Sync + 'static {
    fn define(def: &mut TypeDef<Self>);
}

/// Type-erased entry points for one bean type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    describe: fn() -> TypeEntry,
    create: fn() -> ErasedBean,
    replace: fn(&ErasedBean, Box<dyn Any + Send>) -> Result<()>,
}

impl TypeInfo {
    pub fn of<T: Bean>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            describe: TypeEntry::describe::<T>,
            create: create::<T>,
            replace: replace::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn create(&self) -> ErasedBean {
        (self.create)()
    }

    pub(crate) fn replace(&self, target: &ErasedBean, value: Box<dyn Any + Send>) -> Result<()> {
        (self.replace)(target, value)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

fn create<T: Bean>() -> ErasedBean {
    Arc::new(RwLock::new(T::default()))
}

fn replace<T: Bean>(target: &ErasedBean, value: Box<dyn Any + Send>) -> Result<()> {
    let value = value
        .downcast::<T>()
        .map_err(|_| WireError::downcast::<T>())?;
    let target = downcast::<T>(target)?;
    *write_lock(&target) = *value;
    Ok(())
}

/// Field tag: explicit bean name, role and route prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    name: Option<String>,
    role: Option<Role>,
    prefix: Option<String>,
}

impl Tag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surrounding whitespace is dropped; a blank name counts as no name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim();
        self.name = (!name.is_empty()).then(|| name.to_string());
        self
    }

    /// Role by keyword, e.g. `"controller"`. Unknown keywords are ignored.
    pub fn kind(mut self, keyword: &str) -> Self {
        match Role::from_str(keyword.trim()) {
            Ok(role) => self.role = Some(role),
            Err(_) => tracing::debug!("Unknown role keyword '{}', inferring instead", keyword),
        }
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn explicit_role(&self) -> Option<Role> {
        self.role
    }

    pub fn route_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

type Assign = Box<dyn Fn(&ErasedBean, &ErasedBean) -> Result<()> + Send + Sync>;
type Bind = Box<dyn Fn(&ErasedBean, &Arc<ValueBean>) -> Result<()> + Send + Sync>;

pub(crate) enum FieldSpec {
    Dependency {
        field: &'static str,
        target: TypeInfo,
        tag: Tag,
        assign: Assign,
    },
    Value {
        field: &'static str,
        key: String,
        default: Option<String>,
        bind: Bind,
    },
}

/// Everything the container knows about one bean type.
pub(crate) struct TypeEntry {
    pub(crate) markers: Vec<TypeId>,
    pub(crate) prefix: Option<String>,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) factories: Vec<FactorySpec>,
    /// Structural role, filled in by the [`TypeTable`].
    pub(crate) role: Role,
}

impl TypeEntry {
    fn describe<T: Bean>() -> Self {
        let mut def = TypeDef::<T> {
            entry: TypeEntry {
                markers: Vec::new(),
                prefix: None,
                fields: Vec::new(),
                factories: Vec::new(),
                role: Role::LeafValue,
            },
            _type: PhantomData,
        };
        T::define(&mut def);
        def.entry
    }

    /// Role of a field pointing at this type.
    pub(crate) fn classify(&self, tag: &Tag) -> Role {
        role::classify(tag.explicit_role(), self.role)
    }
}

/// Builder handed to [`Bean::define`].
pub struct TypeDef<T> {
    entry: TypeEntry,
    _type: PhantomData<fn() -> T>,
}

impl<T: Bean> TypeDef<T> {
    /// Declare an embedded marker such as [`crate::Controller`].
    pub fn embed<M: 'static>(&mut self) -> &mut Self {
        self.entry.markers.push(TypeId::of::<M>());
        self
    }

    /// Route prefix used when the type itself carries none in its field tag.
    pub fn prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.entry.prefix = Some(prefix.into());
        self
    }

    /// A dependency on another bean.
    pub fn autowired<D: Bean>(
        &mut self,
        field: &'static str,
        tag: Tag,
        access: fn(&mut T) -> &mut Autowired<D>,
    ) -> &mut Self {
        let assign = move |owner: &ErasedBean, dependency: &ErasedBean| -> Result<()> {
            let owner = downcast::<T>(owner)?;
            let dependency = downcast::<D>(dependency)?;
            *access(&mut *write_lock(&owner)) = Autowired::wired(&dependency);
            Ok(())
        };
        self.entry.fields.push(FieldSpec::Dependency {
            field,
            target: TypeInfo::of::<D>(),
            tag,
            assign: Box::new(assign),
        });
        self
    }

    /// A plain field holding a copy of the value at `key`, re-applied on reload.
    pub fn value<V: FromConfig>(
        &mut self,
        field: &'static str,
        key: impl Into<String>,
        default: Option<&str>,
        access: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        let bind = move |owner: &ErasedBean, bean: &Arc<ValueBean>| -> Result<()> {
            let cell = bean.cell::<V>()?;
            let owner = downcast::<T>(owner)?;
            *access(&mut *write_lock(&owner)) = read_lock(&cell).clone();

            let owner = Arc::downgrade(&owner);
            bean.bind(Box::new(move || match owner.upgrade() {
                Some(owner) => {
                    let value = read_lock(&cell).clone();
                    *access(&mut *write_lock(&owner)) = value;
                    true
                }
                None => false,
            }));
            Ok(())
        };
        self.push_value(field, key.into(), default, Box::new(bind))
    }

    /// A [`Value`] field sharing the live cell for `key`.
    pub fn shared_value<V: FromConfig>(
        &mut self,
        field: &'static str,
        key: impl Into<String>,
        default: Option<&str>,
        access: fn(&mut T) -> &mut Value<V>,
    ) -> &mut Self {
        let bind = move |owner: &ErasedBean, bean: &Arc<ValueBean>| -> Result<()> {
            let cell = bean.cell::<V>()?;
            let owner = downcast::<T>(owner)?;
            *access(&mut *write_lock(&owner)) = Value::bound(cell);
            Ok(())
        };
        self.push_value(field, key.into(), default, Box::new(bind))
    }

    /// A factory method; its result is registered under the output's type name.
    pub fn factory<Args, O, F>(&mut self, method: &'static str, factory: F) -> &mut Self
    where
        Args: 'static,
        O: Bean,
        F: Factory<T, Args, O>,
    {
        self.entry
            .factories
            .push(FactorySpec::typed::<T, Args, O, F>(method, factory));
        self
    }

    /// A factory method whose result is registered under `bean`.
    pub fn factory_into<Args, O, F>(
        &mut self,
        method: &'static str,
        bean: impl Into<String>,
        factory: F,
    ) -> &mut Self
    where
        Args: 'static,
        O: Bean,
        F: Factory<T, Args, O>,
    {
        self.entry
            .factories
            .push(FactorySpec::typed::<T, Args, O, F>(method, factory).named(bean));
        self
    }

    pub fn raw_factory(&mut self, spec: FactorySpec) -> &mut Self {
        self.entry.factories.push(spec);
        self
    }

    fn push_value(
        &mut self,
        field: &'static str,
        key: String,
        default: Option<&str>,
        bind: Bind,
    ) -> &mut Self {
        self.entry.fields.push(FieldSpec::Value {
            field,
            key,
            default: default.map(str::to_string),
            bind,
        });
        self
    }
}

/// Described types, keyed by `TypeId`; each type is described once.
#[derive(Default)]
pub(crate) struct TypeTable {
    entries: HashMap<TypeId, Arc<TypeEntry>>,
    components: ComponentSet,
}

impl TypeTable {
    pub(crate) fn entry(&mut self, info: TypeInfo) -> Arc<TypeEntry> {
        let components = &self.components;
        Arc::clone(self.entries.entry(info.id()).or_insert_with(|| {
            let mut entry = (info.describe)();
            entry.role = role::infer(&entry.markers, components);
            tracing::trace!("Described {} as {}", info.name(), entry.role);
            Arc::new(entry)
        }))
    }

    /// Register a user marker; cached roles are recomputed on next use.
    pub(crate) fn add_component<M: 'static>(&mut self, role: Role) {
        self.components.insert::<M>(role);
        self.entries.clear();
    }
}
