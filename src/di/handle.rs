use crate::error::{Result, WireError};
use std::any::Any;
use std::fmt;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};

/// A bean instance as the container stores it.
pub type Shared<T> = Arc<RwLock<T>>;

/// A bean instance with its concrete type erased; always an `Arc<RwLock<T>>`.
pub type ErasedBean = Arc<dyn Any + Send + Sync>;

pub(crate) fn read_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn downcast<T: Send + Sync + 'static>(bean: &ErasedBean) -> Result<Shared<T>> {
    Arc::clone(bean)
        .downcast::<RwLock<T>>()
        .map_err(|_| WireError::downcast::<T>())
}

/// A dependency field, filled by the container with a reference to another bean.
///
/// The container owns every bean; the handle only holds a weak reference, so
/// beans that reference each other (or themselves) do not keep each other
/// alive once the container is dropped.
pub struct Autowired<T> {
    target: Option<Weak<RwLock<T>>>,
}

impl<T: Send + Sync + 'static> Autowired<T> {
    pub(crate) fn wired(target: &Shared<T>) -> Self {
        Self {
            target: Some(Arc::downgrade(target)),
        }
    }

    pub fn is_wired(&self) -> bool {
        self.target.is_some()
    }

    pub fn get(&self) -> Result<Shared<T>> {
        self.target
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| WireError::NotWired {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let bean = self.get()?;
        let guard = read_lock(&bean);
        Ok(f(&guard))
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let bean = self.get()?;
        let mut guard = write_lock(&bean);
        Ok(f(&mut guard))
    }

    /// Whether this handle points at `bean`.
    pub fn is(&self, bean: &Shared<T>) -> bool {
        self.target
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(bean)))
    }
}

impl<T> Default for Autowired<T> {
    fn default() -> Self {
        Self { target: None }
    }
}

impl<T> Clone for Autowired<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T> fmt::Debug for Autowired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("type", &std::any::type_name::<T>())
            .field("wired", &self.target.is_some())
            .finish()
    }
}

/// A config-bound field that follows reloads.
///
/// Every `Value<T>` bound to the same key shares one cell, so a reload is
/// visible through all of them at once. Plain `T` fields get a copy instead,
/// which the container re-applies on reload.
pub struct Value<T> {
    cell: Arc<RwLock<T>>,
}

impl<T: Clone> Value<T> {
    pub(crate) fn bound(cell: Arc<RwLock<T>>) -> Self {
        Self { cell }
    }

    pub fn get(&self) -> T {
        read_lock(&self.cell).clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&read_lock(&self.cell))
    }

    /// Whether both fields share one config cell.
    pub fn shares(&self, other: &Value<T>) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: Default> Default for Value<T> {
    fn default() -> Self {
        Self {
            cell: Arc::new(RwLock::new(T::default())),
        }
    }
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&*read_lock(&self.cell)).finish()
    }
}
