//! Version series and the check-out lifecycle.
//!
//! A [`VersionSeries`] owns the ordered, committed history of one
//! versioned document plus its current [`LifecycleState`]. The machine has
//! two states and no terminal state:
//!
//! ```text
//!            check_out(owner)
//!   Released ----------------> CheckedOut(owner)
//!      ^                            |
//!      +---- check_in(owner) -------+
//!      +---- cancel_check_out ------+
//! ```
//!
//! The private working copy (PWC) id lives inside `CheckedOut`, so "checked
//! out" and "a PWC exists" cannot disagree. Callers serialize transitions
//! per series; the in-memory store keeps each series behind its own mutex.

use serde::{Deserialize, Serialize};
use tracing::debug;

use cmr_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// Check-out state of a version series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LifecycleState {
    /// No private working copy exists.
    Released,
    /// `owner` holds the private working copy `pwc_id`.
    CheckedOut { owner: String, pwc_id: ObjectId },
}

impl LifecycleState {
    pub fn is_checked_out(&self) -> bool {
        matches!(self, Self::CheckedOut { .. })
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::CheckedOut { owner, .. } => Some(owner),
            Self::Released => None,
        }
    }

    pub fn pwc_id(&self) -> Option<&ObjectId> {
        match self {
            Self::CheckedOut { pwc_id, .. } => Some(pwc_id),
            Self::Released => None,
        }
    }

    /// Whether `caller` holds the checkout. Anonymous callers never do.
    pub fn is_held_by(&self, caller: Option<&str>) -> bool {
        match (self, caller) {
            (Self::CheckedOut { owner, .. }, Some(caller)) => owner == caller,
            _ => false,
        }
    }
}

/// Which label component a commit advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionIncrement {
    Major,
    Minor,
}

/// One committed version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: ObjectId,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionSeries {
    id: ObjectId,
    versions: Vec<VersionEntry>,
    state: LifecycleState,
}

impl VersionSeries {
    /// A released series whose first committed version is `version_id`.
    pub fn with_initial(id: ObjectId, version_id: ObjectId, increment: VersionIncrement) -> Self {
        let mut series = Self::empty(id);
        let label = series.next_label(increment);
        series.versions.push(VersionEntry {
            id: version_id,
            label,
        });
        series
    }

    /// A series created checked out: no committed version yet, and
    /// `pwc_id` is the working copy held by `owner`.
    pub fn checked_out_initially(id: ObjectId, owner: &str, pwc_id: ObjectId) -> Self {
        let mut series = Self::empty(id);
        series.state = LifecycleState::CheckedOut {
            owner: owner.to_string(),
            pwc_id,
        };
        series
    }

    fn empty(id: ObjectId) -> Self {
        Self {
            id,
            versions: Vec::new(),
            state: LifecycleState::Released,
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    /// Committed versions, oldest first.
    pub fn versions(&self) -> &[VersionEntry] {
        &self.versions
    }

    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.last()
    }

    pub fn contains(&self, version_id: &ObjectId) -> bool {
        self.versions.iter().any(|v| &v.id == version_id)
            || self.state.pwc_id() == Some(version_id)
    }

    /// The label the next commit with `increment` would receive.
    pub fn next_label(&self, increment: VersionIncrement) -> String {
        let (major, minor) = self
            .latest()
            .and_then(|v| parse_label(&v.label))
            .unwrap_or((0, 0));
        match increment {
            VersionIncrement::Major => format!("{}.0", major + 1),
            VersionIncrement::Minor => format!("{major}.{}", minor + 1),
        }
    }

    /// `Released -> CheckedOut(owner)`. Fails with `CheckedOut` if a PWC
    /// already exists.
    pub fn check_out(&mut self, owner: &str, pwc_id: ObjectId) -> StoreResult<()> {
        if let LifecycleState::CheckedOut { owner: holder, .. } = &self.state {
            return Err(StoreError::CheckedOut {
                id: self.id.clone(),
                owner: holder.clone(),
            });
        }
        debug!(series = %self.id, owner, pwc = %pwc_id, "series checked out");
        self.state = LifecycleState::CheckedOut {
            owner: owner.to_string(),
            pwc_id,
        };
        Ok(())
    }

    /// `CheckedOut(caller) -> Released`, committing the PWC as the newest
    /// version. Returns the committed entry.
    pub fn check_in(
        &mut self,
        caller: Option<&str>,
        increment: VersionIncrement,
    ) -> StoreResult<VersionEntry> {
        let pwc_id = self.require_holder(caller)?;
        let entry = VersionEntry {
            id: pwc_id,
            label: self.next_label(increment),
        };
        debug!(series = %self.id, version = %entry.id, label = %entry.label, "series checked in");
        self.versions.push(entry.clone());
        self.state = LifecycleState::Released;
        Ok(entry)
    }

    /// `CheckedOut(caller) -> Released`, discarding the PWC. Returns the id
    /// of the discarded working copy.
    pub fn cancel_check_out(&mut self, caller: Option<&str>) -> StoreResult<ObjectId> {
        let pwc_id = self.require_holder(caller)?;
        debug!(series = %self.id, pwc = %pwc_id, "check-out cancelled");
        self.state = LifecycleState::Released;
        Ok(pwc_id)
    }

    fn require_holder(&self, caller: Option<&str>) -> StoreResult<ObjectId> {
        match &self.state {
            LifecycleState::Released => Err(StoreError::NotCheckedOut(self.id.clone())),
            LifecycleState::CheckedOut { owner, pwc_id } => {
                if !self.state.is_held_by(caller) {
                    return Err(StoreError::NotCheckoutOwner {
                        id: self.id.clone(),
                        owner: owner.clone(),
                        caller: caller.map(str::to_string),
                    });
                }
                Ok(pwc_id.clone())
            }
        }
    }
}

fn parse_label(label: &str) -> Option<(u32, u32)> {
    let (major, minor) = label.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}
