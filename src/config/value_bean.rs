use super::convert::FromConfig;
use crate::di::{FactoryId, lock, read_lock, write_lock};
use crate::error::{Result, WireError};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

/// Re-applies a value to a copy field; `false` once the owning bean is gone.
pub(crate) type Binding = Box<dyn Fn() -> bool + Send + Sync>;

/// Convert a resolved raw value, falling back to the zero value.
pub fn convert<T: FromConfig>(key: &str, raw: &Value) -> T {
    if raw.is_null() {
        return T::default();
    }
    T::from_config(raw).unwrap_or_else(|| {
        tracing::debug!(
            "Cannot convert '{}' ({}) into {}, leaving it unset",
            key,
            raw,
            std::any::type_name::<T>()
        );
        T::default()
    })
}

trait ConvertedForm: Send + Sync {
    fn refresh(&self, key: &str, raw: &Value);
    fn cell(&self) -> Arc<dyn Any + Send + Sync>;
}

struct Form<T> {
    cell: Arc<RwLock<T>>,
}

impl<T: FromConfig> ConvertedForm for Form<T> {
    fn refresh(&self, key: &str, raw: &Value) {
        *write_lock(&self.cell) = convert(key, raw);
    }

    fn cell(&self) -> Arc<dyn Any + Send + Sync> {
        self.cell.clone()
    }
}

/// One config key, its raw value and every typed form handed out for it.
///
/// All fields injected from the same key share the cell of their type, so a
/// reload updates them together.
pub struct ValueBean {
    key: String,
    default: Option<Value>,
    raw: RwLock<Value>,
    forms: RwLock<HashMap<TypeId, Box<dyn ConvertedForm>>>,
    bindings: Mutex<Vec<Binding>>,
    subscribers: Mutex<BTreeSet<FactoryId>>,
}

impl ValueBean {
    pub fn new(key: impl Into<String>, default: Option<Value>, raw: Value) -> Self {
        Self {
            key: key.into(),
            default,
            raw: RwLock::new(raw),
            forms: RwLock::new(HashMap::new()),
            bindings: Mutex::new(Vec::new()),
            subscribers: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn raw(&self) -> Value {
        read_lock(&self.raw).clone()
    }

    /// The shared cell holding this value converted to `T`, created on first use.
    pub fn cell<T: FromConfig>(&self) -> Result<Arc<RwLock<T>>> {
        let id = TypeId::of::<T>();
        let existing = read_lock(&self.forms).get(&id).map(|form| form.cell());
        let cell = match existing {
            Some(cell) => cell,
            None => {
                let mut forms = write_lock(&self.forms);
                forms
                    .entry(id)
                    .or_insert_with(|| {
                        let value: T = convert(&self.key, &read_lock(&self.raw));
                        let form: Box<dyn ConvertedForm> = Box::new(Form {
                            cell: Arc::new(RwLock::new(value)),
                        });
                        form
                    })
                    .cell()
            }
        };
        cell.downcast::<RwLock<T>>()
            .map_err(|_| WireError::downcast::<T>())
    }

    pub fn form_count(&self) -> usize {
        read_lock(&self.forms).len()
    }

    pub(crate) fn bind(&self, binding: Binding) {
        lock(&self.bindings).push(binding);
    }

    pub(crate) fn subscribe(&self, factory: FactoryId) {
        lock(&self.subscribers).insert(factory);
    }

    pub fn subscribers(&self) -> Vec<FactoryId> {
        lock(&self.subscribers).iter().copied().collect()
    }

    /// Install a newly resolved raw value. Returns `false` when it is unchanged.
    pub(crate) fn update(&self, next: Value) -> bool {
        {
            let mut raw = write_lock(&self.raw);
            if *raw == next {
                return false;
            }
            tracing::debug!("Reset value '{}' to {}", self.key, next);
            *raw = next.clone();
        }
        {
            let forms = write_lock(&self.forms);
            for form in forms.values() {
                form.refresh(&self.key, &next);
            }
        }
        lock(&self.bindings).retain(|binding| binding());
        true
    }
}

impl std::fmt::Debug for ValueBean {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueBean")
            .field("key", &self.key)
            .field("default", &self.default)
            .field("raw", &self.raw())
            .field("forms", &self.form_count())
            .field("subscribers", &self.subscribers())
            .finish()
    }
}
