//! # Profile Registry
//!
//! Process-lifetime table of profiles. Populated at startup, read on every
//! request, changed only by administrative registration or removal.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{ProfileError, Result};
use crate::profile::Profile;

#[derive(Default)]
pub struct ProfileRegistry {
    profiles: RwLock<BTreeMap<String, Arc<Profile>>>,
}

impl ProfileRegistry {
    /// An empty registry with no default.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the generic profile, flagged default.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        let generic = Arc::new(Profile::generic().as_default(true));
        registry
            .profiles
            .write()
            .insert(crate::GENERIC_PROFILE_ID.to_string(), generic);
        registry
    }

    /// Adds a profile.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::EmptyId`] for an empty id
    /// - [`ProfileError::AlreadyRegistered`] if the id is taken
    /// - [`ProfileError::DuplicateDefault`] if the profile is flagged default
    ///   and another default already exists
    pub fn register(&self, profile: Profile) -> Result<Arc<Profile>> {
        if profile.id().is_empty() {
            return Err(ProfileError::EmptyId);
        }

        let mut profiles = self.profiles.write();
        if profiles.contains_key(profile.id()) {
            return Err(ProfileError::AlreadyRegistered(profile.id().to_string()));
        }
        if profile.is_default() {
            if let Some(existing) = profiles.values().find(|p| p.is_default()) {
                return Err(ProfileError::DuplicateDefault {
                    existing: existing.id().to_string(),
                    offered: profile.id().to_string(),
                });
            }
        }

        info!(profile = profile.id(), default = profile.is_default(), "registered profile");
        let profile = Arc::new(profile);
        profiles.insert(profile.id().to_string(), Arc::clone(&profile));
        Ok(profile)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<Profile>> {
        self.profiles.read().get(id).cloned()
    }

    /// The profile flagged default. `None` if no profile carries the flag;
    /// no other profile is picked in its place.
    pub fn get_default(&self) -> Option<Arc<Profile>> {
        self.profiles.read().values().find(|p| p.is_default()).cloned()
    }

    /// Unregisters a profile.
    ///
    /// Contexts already built on it keep their handle.
    ///
    /// # Errors
    ///
    /// `ProfileError::NotFound` if no profile has this id.
    pub fn remove(&self, id: &str) -> Result<Arc<Profile>> {
        let removed = self
            .profiles
            .write()
            .remove(id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        info!(profile = id, "removed profile");
        Ok(removed)
    }

    /// Snapshot ordered by id.
    pub fn all(&self) -> Vec<Arc<Profile>> {
        self.profiles.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl std::fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileRegistry")
            .field("profiles", &self.profiles.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GENERIC_PROFILE_ID;

    #[test]
    fn test_builtin_has_generic_default() {
        let registry = ProfileRegistry::with_builtin();
        let default = registry.get_default().unwrap();
        assert_eq!(default.id(), GENERIC_PROFILE_ID);
        assert!(registry.get_by_id(GENERIC_PROFILE_ID).is_some());
    }

    #[test]
    fn test_no_default_when_none_flagged() {
        let registry = ProfileRegistry::new();
        registry.register(Profile::generic().with_id("a")).unwrap();
        registry.register(Profile::generic().with_id("b")).unwrap();
        assert!(registry.get_default().is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let registry = ProfileRegistry::with_builtin();
        let err = registry.register(Profile::generic()).unwrap_err();
        assert_eq!(err, ProfileError::AlreadyRegistered(GENERIC_PROFILE_ID.to_string()));

        let err = registry
            .register(Profile::generic().with_id("other").as_default(true))
            .unwrap_err();
        assert!(matches!(err, ProfileError::DuplicateDefault { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_empty_id() {
        let registry = ProfileRegistry::new();
        assert_eq!(
            registry.register(Profile::generic().with_id("")).unwrap_err(),
            ProfileError::EmptyId
        );
    }

    #[test]
    fn test_remove_default_leaves_no_default() {
        let registry = ProfileRegistry::with_builtin();
        registry.register(Profile::generic().with_id("extra")).unwrap();
        assert!(registry.remove(GENERIC_PROFILE_ID).is_ok());
        assert!(registry.get_default().is_none());
        assert_eq!(
            registry.remove(GENERIC_PROFILE_ID).unwrap_err(),
            ProfileError::NotFound(GENERIC_PROFILE_ID.to_string())
        );
        assert_eq!(registry.all().len(), 1);
    }
}
