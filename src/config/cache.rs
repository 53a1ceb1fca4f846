use super::store::{ConfigStore, parse_literal};
use super::value_bean::ValueBean;
use crate::di::FactoryId;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

type CacheKey = (String, Option<String>);

/// Outcome of pushing a new document through the cache.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Propagation {
    pub changed: Vec<String>,
    pub recall: BTreeSet<FactoryId>,
}

/// One [`ValueBean`] per distinct `(key, default)` pair.
#[derive(Debug, Default)]
pub struct ValueBeanCache {
    beans: DashMap<CacheKey, Arc<ValueBean>>,
}

impl ValueBeanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared bean for `key`, resolved against `store` on first request.
    pub fn get_or_create(
        &self,
        store: &ConfigStore,
        key: &str,
        default: Option<&str>,
    ) -> Arc<ValueBean> {
        let cache_key = (key.to_string(), default.map(str::to_string));
        self.beans
            .entry(cache_key)
            .or_insert_with(|| {
                let default = default.map(parse_literal);
                let raw = store.get(key, default.as_ref());
                Arc::new(ValueBean::new(key, default, raw))
            })
            .value()
            .clone()
    }

    pub fn get(&self, key: &str, default: Option<&str>) -> Option<Arc<ValueBean>> {
        let cache_key = (key.to_string(), default.map(str::to_string));
        self.beans.get(&cache_key).map(|bean| bean.value().clone())
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// Re-resolve every cached key against the store's current document.
    pub(crate) fn propagate(&self, store: &ConfigStore) -> Propagation {
        let beans: Vec<Arc<ValueBean>> = self.beans.iter().map(|e| e.value().clone()).collect();
        let mut propagation = Propagation::default();
        for bean in beans {
            let next = store.get(bean.key(), bean.default_value());
            if bean.update(next) {
                propagation.changed.push(bean.key().to_string());
                propagation.recall.extend(bean.subscribers());
            }
        }
        propagation.changed.sort();
        propagation.changed.dedup();
        propagation
    }
}
