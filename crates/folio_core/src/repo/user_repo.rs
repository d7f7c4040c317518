//! User directory backed by a JSON snapshot file.
//!
//! # Responsibility
//! - Load the externally provisioned user list for credential checks.
//! - Offer a provisioning helper for admin tooling.
//!
//! # Invariants
//! - Credential checks only ever read the directory.
//! - Usernames are unique after `upsert_user`.

use crate::model::user::User;
use crate::storage::{SnapshotFile, StorageResult};
use log::info;
use std::path::PathBuf;

/// Read access to provisioned users.
pub trait UserDirectory: Send + Sync {
    fn load_users(&self) -> StorageResult<Vec<User>>;
}

/// User directory stored as one JSON array of `{username, password}`.
pub struct JsonUserDirectory {
    file: SnapshotFile,
}

impl JsonUserDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: SnapshotFile::new(path),
        }
    }

    /// Inserts `user` or replaces the existing record with the same username.
    ///
    /// A missing directory file is treated as empty. Returns `true` when an
    /// existing record was replaced. Holds the file's writer lock and lock
    /// file for the whole read -> modify -> write cycle.
    ///
    /// # Errors
    /// - `StorageError::Locked` when another provisioning run is in progress.
    pub fn upsert_user(&self, user: User) -> StorageResult<bool> {
        let write_lock = self.file.write_lock();
        let _guard = write_lock.lock();
        let _lock_file = self.file.lock_exclusive()?;
        let mut users = if self.file.exists() {
            self.load_users()?
        } else {
            Vec::new()
        };

        let replaced = match users
            .iter_mut()
            .find(|existing| existing.username == user.username)
        {
            Some(existing) => {
                *existing = user;
                true
            }
            None => {
                users.push(user);
                false
            }
        };

        self.file.save(&users)?;
        info!(
            "event=user_upsert module=repo status=ok replaced={} users={}",
            replaced,
            users.len()
        );
        Ok(replaced)
    }
}

impl UserDirectory for JsonUserDirectory {
    fn load_users(&self) -> StorageResult<Vec<User>> {
        self.file.load()
    }
}
