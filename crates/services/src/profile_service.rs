use std::sync::Arc;

use storage::records::{ProfileRecord, decode, decode_theme, encode};
use storage::repository::{KeyValueStore, StoreKey};
use tracker_core::model::{Theme, UserProfile};

use crate::error::ProfileServiceError;

/// Stores the signed-in profile and the theme preference.
///
/// The profile comes from an external identity provider and is kept as-is.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored profile, if anyone is signed in.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the store cannot be read or
    /// the stored profile is malformed.
    pub async fn current(&self) -> Result<Option<UserProfile>, ProfileServiceError> {
        let Some(raw) = self.store.get(StoreKey::User).await? else {
            return Ok(None);
        };
        let record: ProfileRecord = decode(&raw)?;
        Ok(Some(record.into()))
    }

    /// Record `profile` as the signed-in user, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the profile cannot be written.
    pub async fn sign_in(&self, profile: UserProfile) -> Result<UserProfile, ProfileServiceError> {
        let raw = encode(&ProfileRecord::from(&profile))?;
        self.store.put(StoreKey::User, &raw).await?;
        tracing::info!(uid = %profile.uid, anonymous = profile.is_anonymous, "signed in");
        Ok(profile)
    }

    /// Forget the signed-in profile. Tracker data is kept.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the store cannot be written.
    pub async fn sign_out(&self) -> Result<(), ProfileServiceError> {
        self.store.remove(StoreKey::User).await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Change display name and photo of the signed-in profile. `None` keeps
    /// the current value.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::SignedOut` if nobody is signed in, or
    /// `ProfileServiceError::Storage` on store failures.
    pub async fn update_profile(
        &self,
        display_name: Option<String>,
        photo_url: Option<String>,
    ) -> Result<UserProfile, ProfileServiceError> {
        let mut profile = self
            .current()
            .await?
            .ok_or(ProfileServiceError::SignedOut)?;
        if let Some(name) = display_name {
            profile.display_name = Some(name);
        }
        if let Some(url) = photo_url {
            profile.photo_url = Some(url);
        }
        let raw = encode(&ProfileRecord::from(&profile))?;
        self.store.put(StoreKey::User, &raw).await?;
        Ok(profile)
    }

    /// The stored theme, light when none was chosen.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the store cannot be read.
    pub async fn theme(&self) -> Result<Theme, ProfileServiceError> {
        let theme = self
            .store
            .get(StoreKey::Theme)
            .await?
            .map(|raw| decode_theme(&raw))
            .unwrap_or_default();
        Ok(theme)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the store cannot be written.
    pub async fn set_theme(&self, theme: Theme) -> Result<(), ProfileServiceError> {
        self.store.put(StoreKey::Theme, theme.as_str()).await?;
        Ok(())
    }

    /// Switch between light and dark and return the new theme.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on store failures.
    pub async fn toggle_theme(&self) -> Result<Theme, ProfileServiceError> {
        let next = self.theme().await?.toggled();
        self.set_theme(next).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryStore;

    fn service() -> ProfileService {
        ProfileService::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn sign_in_update_and_sign_out() {
        let service = service();
        assert!(service.current().await.unwrap().is_none());

        service.sign_in(UserProfile::guest()).await.unwrap();
        let updated = service
            .update_profile(Some("Sam".into()), None)
            .await
            .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Sam"));
        assert_eq!(service.current().await.unwrap(), Some(updated));

        service.sign_out().await.unwrap();
        assert!(service.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_requires_profile() {
        let err = service().update_profile(None, None).await.unwrap_err();
        assert!(matches!(err, ProfileServiceError::SignedOut));
    }

    #[tokio::test]
    async fn theme_defaults_to_light_and_toggles() {
        let service = service();
        assert_eq!(service.theme().await.unwrap(), Theme::Light);
        assert_eq!(service.toggle_theme().await.unwrap(), Theme::Dark);
        assert_eq!(service.theme().await.unwrap(), Theme::Dark);
        assert_eq!(service.toggle_theme().await.unwrap(), Theme::Light);
    }
}
