use super::definition::{Bean, TypeInfo};
use super::handle::{ErasedBean, downcast, read_lock};
use super::registry::{BeanId, Registry};
use crate::error::{Result, WireError};
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Index of an installed factory method inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactoryId(pub(crate) usize);

/// Values a factory produced, before the container checks them.
pub type Produced = Vec<Box<dyn Any + Send>>;

type Producer = Arc<dyn Fn(&ErasedBean, &[ErasedBean]) -> Result<Produced> + Send + Sync>;

/// A method on a configuration bean whose result becomes another bean.
///
/// Implemented for `Fn(&C) -> O` and `Fn(&C, &P1, ..) -> O` with up to four
/// parameter objects. An existing unique bean of a parameter type is passed
/// in; otherwise a fresh anonymous instance is field-injected and used.
pub trait Factory<C, Args, O>: Send + Sync + 'static {
    fn params() -> Vec<TypeInfo>;

    fn produce(&self, receiver: &C, params: &[ErasedBean]) -> Result<O>;
}

impl<C, O, F> Factory<C, (), O> for F
where
    F: Fn(&C) -> O + Send + Sync + 'static,
    C: Bean,
    O: Bean,
{
    fn params() -> Vec<TypeInfo> {
        Vec::new()
    }

    fn produce(&self, receiver: &C, _params: &[ErasedBean]) -> Result<O> {
        Ok(self(receiver))
    }
}

fn param(params: &[ErasedBean], index: usize) -> Result<&ErasedBean> {
    params.get(index).ok_or_else(|| {
        WireError::Internal(format!("factory parameter {} was not resolved", index))
    })
}

macro_rules! factory_arity {
    ($($ty:ident $var:ident $idx:tt),+) => {
        impl<C, O, F, $($ty),+> Factory<C, ($($ty,)+), O> for F
        where
            F: Fn(&C, $(&$ty),+) -> O + Send + Sync + 'static,
            C: Bean,
            O: Bean,
            $($ty: Bean,)+
        {
            fn params() -> Vec<TypeInfo> {
                vec![$(TypeInfo::of::<$ty>()),+]
            }

            fn produce(&self, receiver: &C, params: &[ErasedBean]) -> Result<O> {
                $(let $var = downcast::<$ty>(param(params, $idx)?)?;)+
                $(let $var = read_lock(&$var);)+
                Ok(self(receiver, $(&*$var),+))
            }
        }
    };
}

factory_arity!(P1 p1 0);
factory_arity!(P1 p1 0, P2 p2 1);
factory_arity!(P1 p1 0, P2 p2 1, P3 p3 2);
factory_arity!(P1 p1 0, P2 p2 1, P3 p3 2, P4 p4 3);

/// A factory method as declared on a configuration type.
#[derive(Clone)]
pub struct FactorySpec {
    pub(crate) method: String,
    pub(crate) params: Vec<TypeInfo>,
    pub(crate) output: TypeInfo,
    pub(crate) target_name: Option<String>,
    pub(crate) produce: Producer,
}

impl FactorySpec {
    pub(crate) fn typed<C, Args, O, F>(method: impl Into<String>, factory: F) -> Self
    where
        C: Bean,
        O: Bean,
        Args: 'static,
        F: Factory<C, Args, O>,
    {
        let produce = move |receiver: &ErasedBean, params: &[ErasedBean]| -> Result<Produced> {
            let receiver = downcast::<C>(receiver)?;
            let receiver = read_lock(&receiver);
            let output = <F as Factory<C, Args, O>>::produce(&factory, &*receiver, params)?;
            Ok(vec![Box::new(output) as Box<dyn Any + Send>])
        };
        Self {
            method: method.into(),
            params: <F as Factory<C, Args, O>>::params(),
            output: TypeInfo::of::<O>(),
            target_name: None,
            produce: Arc::new(produce),
        }
    }

    /// A factory over erased values, for methods that do not fit [`Factory`].
    ///
    /// `produce` receives the receiver bean and the resolved `params` in
    /// order, and must return exactly one value of type `O`.
    pub fn raw<O, P>(method: impl Into<String>, params: Vec<TypeInfo>, produce: P) -> Self
    where
        O: Bean,
        P: Fn(&ErasedBean, &[ErasedBean]) -> Result<Produced> + Send + Sync + 'static,
    {
        Self {
            method: method.into(),
            params,
            output: TypeInfo::of::<O>(),
            target_name: None,
            produce: Arc::new(produce),
        }
    }

    /// Register the result under `name` instead of its type name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        self.target_name = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn output(&self) -> TypeInfo {
        self.output
    }
}

impl std::fmt::Debug for FactorySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorySpec")
            .field("method", &self.method)
            .field("params", &self.params)
            .field("output", &self.output)
            .field("target_name", &self.target_name)
            .finish()
    }
}

/// An installed factory: receiver, resolved parameters and the bean it fills.
pub(crate) struct FactoryMethod {
    pub(crate) id: FactoryId,
    pub(crate) name: String,
    pub(crate) receiver: BeanId,
    pub(crate) params: Vec<BeanId>,
    pub(crate) target: BeanId,
    pub(crate) output: TypeInfo,
    pub(crate) produce: Producer,
    /// Beans whose config values feed this factory, transitively.
    pub(crate) sources: BTreeSet<BeanId>,
}

impl FactoryMethod {
    /// Run the method and write its result into the target bean in place.
    ///
    /// Receiver and parameter locks are released before the target is
    /// written, so a factory may produce into a bean it also reads.
    pub(crate) fn call(&self, registry: &Registry) -> Result<()> {
        let receiver = registry.instance(self.receiver);
        let params: Vec<ErasedBean> = self.params.iter().map(|id| registry.instance(*id)).collect();

        let mut produced = (self.produce)(&receiver, &params)?;
        if produced.len() != 1 {
            return Err(WireError::FactoryArity {
                method: self.name.clone(),
                count: produced.len(),
            });
        }
        let output = produced.remove(0);

        let target = registry.instance(self.target);
        self.output
            .replace(&target, output)
            .map_err(|_| WireError::FactoryOutput {
                method: self.name.clone(),
                expected: self.output.name().to_string(),
            })?;
        tracing::debug!(
            "Result of {} set into {}",
            self.name,
            registry.slot(self.target).label()
        );
        Ok(())
    }
}

impl std::fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("params", &self.params)
            .field("target", &self.target)
            .field("sources", &self.sources)
            .finish()
    }
}
