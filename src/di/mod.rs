mod builder;
mod container;
mod definition;
mod extractor;
mod factory;
mod handle;
mod registry;

pub use container::{Container, EntityType, EntityTypes, ReloadSummary};
pub use definition::{Bean, Tag, TypeDef, TypeInfo};
pub use extractor::{HasContainer, Inject};
pub use factory::{Factory, FactoryId, FactorySpec, Produced};
pub use handle::{Autowired, ErasedBean, Shared, Value};
pub use registry::{BeanId, BeanRef};

pub(crate) use handle::{lock, read_lock, write_lock};
