use anyhow::Result;
use crate::tree::class::ClassInfo;

/// The classfile provider collaborator.
///
/// Answers "what does the classfile of X declare?". The provider owns
/// resolution and may parse lazily; the engine only ever reads the returned
/// metadata. Returning `Ok(None)` means the name does not resolve; whether
/// that is fatal depends on the caller (a scanned type's own classfile must
/// resolve, a speculative lookup may miss).
pub trait ClassProvider {
	fn get(&self, name: &str) -> Result<Option<&ClassInfo>>;
}

impl<P: ClassProvider + ?Sized> ClassProvider for &P {
	fn get(&self, name: &str) -> Result<Option<&ClassInfo>> {
		(**self).get(name)
	}
}
