//! Tracked friends.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A player whose progress is compared against the operator's.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friend {
    /// Player id on the ranking site
    pub pid: String,

    /// Display name as last resolved
    #[serde(default = "unknown_name")]
    pub name: String,

    /// Friend's dashboard sheet, if they have one
    #[serde(default)]
    pub sheet_id: String,

    /// Cleared maps at the last refresh
    #[serde(default)]
    pub clear_count: usize,
}

fn unknown_name() -> String {
    "Unknown".into()
}

/// The friend list file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FriendList {
    #[serde(default, rename = "friend")]
    pub friends: Vec<Friend>,
}

impl FriendList {
    /// Load the friend list; a missing file is an empty list.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get(&self, pid: &str) -> Option<&Friend> {
        self.friends.iter().find(|f| f.pid == pid)
    }

    pub fn get_mut(&mut self, pid: &str) -> Option<&mut Friend> {
        self.friends.iter_mut().find(|f| f.pid == pid)
    }

    pub fn contains(&self, pid: &str) -> bool {
        self.get(pid).is_some()
    }

    /// Add a friend, rejecting a pid that is already tracked.
    pub fn add(&mut self, friend: Friend) -> Result<()> {
        if self.contains(&friend.pid) {
            return Err(AppError::friend(format!(
                "pid {} is already on the friend list",
                friend.pid
            )));
        }
        self.friends.push(friend);
        Ok(())
    }

    /// Remove a friend by pid, returning the removed entry.
    pub fn remove(&mut self, pid: &str) -> Result<Friend> {
        let index = self
            .friends
            .iter()
            .position(|f| f.pid == pid)
            .ok_or_else(|| AppError::friend(format!("pid {pid} is not on the friend list")))?;
        Ok(self.friends.remove(index))
    }
}
