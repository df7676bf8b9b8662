//! Field selector to property metadata resolution.
//!
//! Resolution results are memoized process-wide, keyed by the declaring
//! type and the property name. Concurrent callers may race to populate an
//! entry; the cache keeps the first one.

use std::any::{TypeId, type_name};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::trace;

/// Stable description of a model property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMeta {
	/// Property (and column) name
	pub name: &'static str,
	pub declaring_type: &'static str,
	pub value_type: &'static str,
	pub value_type_id: TypeId,
}

impl PropertyMeta {
	/// Whether the property's declared value type is `T`.
	pub fn is<T: 'static>(&self) -> bool {
		self.value_type_id == TypeId::of::<T>()
	}
}

static PROPERTIES: Lazy<DashMap<(TypeId, &'static str), Arc<PropertyMeta>>> =
	Lazy::new(DashMap::new);

/// Resolve the property `name` declared on `M` with value type `T`.
pub fn resolve<M: 'static, T: 'static>(name: &'static str) -> Arc<PropertyMeta> {
	PROPERTIES
		.entry((TypeId::of::<M>(), name))
		.or_insert_with(|| {
			trace!(
				declaring_type = type_name::<M>(),
				property = name,
				"caching property metadata"
			);
			Arc::new(PropertyMeta {
				name,
				declaring_type: type_name::<M>(),
				value_type: type_name::<T>(),
				value_type_id: TypeId::of::<T>(),
			})
		})
		.value()
		.clone()
}

/// Whether metadata for `M::name` has been cached.
pub fn is_cached<M: 'static>(name: &'static str) -> bool {
	PROPERTIES.contains_key(&(TypeId::of::<M>(), name))
}
