use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A shared, mutex-guarded handle. Runtime containers are aliased by
/// assignment, so every clone points at the same underlying data.
#[derive(Debug, Default)]
pub struct ArcLock<T> {
	inner: Arc<Mutex<T>>,
}

impl<T> Clone for ArcLock<T> {
	fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<T> ArcLock<T> {
	pub fn new(value: T) -> Self { Self { inner: Arc::new(Mutex::new(value)) } }

	/// Locks the handle. A poisoned lock is recovered: container operations
	/// never leave the data structurally broken mid-update.
	pub fn lock(&self) -> MutexGuard<'_, T> { self.inner.lock().unwrap_or_else(PoisonError::into_inner) }
}

impl<T> From<T> for ArcLock<T> {
	fn from(value: T) -> Self { Self::new(value) }
}
