//! Profile use cases.
//!
//! # Invariants
//! - One profile per authenticated user id.
//! - Usernames are generated; a username collision retries with a new suffix.

use super::{begin_immediate, ServiceError, ServiceResult};
use crate::model::ikigai::IkigaiMap;
use crate::model::profile::{generate_username, NewProfile, Profile, ProfileId};
use crate::model::ValidationError;
use crate::repo::ikigai_repo::{IkigaiRepository, SqliteIkigaiRepository};
use crate::repo::profile_repo::{ProfileInsert, ProfileRepository, SqliteProfileRepository};
use crate::repo::RepoError;
use log::info;
use rusqlite::Connection;
use serde::Serialize;

const USERNAME_ATTEMPTS: usize = 3;

/// Profile as other members see it: no email, ikigai map attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: ProfileId,
    pub user_id: String,
    pub username: String,
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub ikigai_map: Option<IkigaiMap>,
}

impl PublicProfile {
    fn new(profile: Profile, ikigai_map: Option<IkigaiMap>) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            username: profile.username,
            slug: profile.slug,
            name: profile.name,
            image_url: profile.image_url,
            created_at: profile.created_at,
            ikigai_map,
        }
    }
}

pub struct ProfileService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ProfileService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates the profile for `user_id`.
    ///
    /// # Errors
    /// - `Validation` for a blank user id or name.
    /// - `Conflict` when the user already has a profile.
    pub fn create_profile(
        &mut self,
        user_id: &str,
        request: &NewProfile,
    ) -> ServiceResult<Profile> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ValidationError::Required("userId").into());
        }
        let name = request.validate()?;
        let email = trimmed(request.email.as_deref());
        let image_url = trimmed(request.image_url.as_deref());

        let tx = begin_immediate(self.conn)?;
        let repo = SqliteProfileRepository::new(&tx);
        if repo.find_by_user_id(user_id)?.is_some() {
            return Err(ServiceError::conflict("Profile already exists"));
        }

        let mut attempt = 0;
        let profile = loop {
            attempt += 1;
            let username = generate_username(&name);
            let insert = ProfileInsert {
                user_id,
                username: &username,
                name: &name,
                email,
                image_url,
            };
            match repo.create_profile(&insert) {
                Ok(profile) => break profile,
                Err(RepoError::Conflict { .. }) if attempt < USERNAME_ATTEMPTS => continue,
                Err(err) => return Err(err.into()),
            }
        };
        tx.commit()?;

        info!(
            "event=profile_create module=profile status=ok profile_id={} username={}",
            profile.id, profile.username
        );
        Ok(profile)
    }

    /// Resolves the profile of an authenticated user.
    pub fn profile_for_user(&self, user_id: &str) -> ServiceResult<Profile> {
        require_profile(&*self.conn, user_id)
    }

    /// Looks up another member by user id.
    ///
    /// # Errors
    /// - `NotFound` when that user has no profile.
    pub fn public_profile(&self, user_id: &str) -> ServiceResult<PublicProfile> {
        let profile = require_profile(&*self.conn, user_id)?;
        let map = SqliteIkigaiRepository::new(&*self.conn).get_map(profile.id)?;
        Ok(PublicProfile::new(profile, map))
    }

    pub fn rename_profile(&mut self, profile_id: ProfileId, name: &str) -> ServiceResult<Profile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("name").into());
        }

        let tx = begin_immediate(self.conn)?;
        let repo = SqliteProfileRepository::new(&tx);
        repo.rename_profile(profile_id, name)?;
        let profile = repo
            .get_profile(profile_id)?
            .ok_or_else(|| RepoError::not_found("profile", profile_id))?;
        tx.commit()?;
        Ok(profile)
    }
}

/// Looks up a profile by user id; `NotFound` when the user has none yet.
pub fn require_profile(conn: &Connection, user_id: &str) -> ServiceResult<Profile> {
    SqliteProfileRepository::new(conn)
        .find_by_user_id(user_id)?
        .ok_or_else(|| ServiceError::NotFound {
            entity: "profile",
            id: user_id.to_string(),
        })
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
