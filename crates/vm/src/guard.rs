//! Frame-scoped mutation restrictions.
//!
//! Every frame carries a [`FrameGuard`]: where its restriction came from and
//! the permissions currently in force. A child frame receives a copy of its
//! parent's guard through [`FrameGuard::child`], and only `Restrict` changes
//! a guard after that.
//!
//! | origin      | child       | disable   | enable with `set`                  |
//! |-------------|-------------|-----------|------------------------------------|
//! | `None`      | `None`      | `None`    | `Local`, permissions = `set`       |
//! | `Local`     | `Inherited` | `None`    | `Local`, permissions = `set`       |
//! | `Inherited` | `Inherited` | no effect | `Inherited`, permissions ∩= `set` |

use crate::permission::PermissionSet;
use serde::{Deserialize, Serialize};

/// Where a frame's restriction was established.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum GuardOrigin {
    /// No restriction is active.
    #[default]
    None,
    /// The restriction was established by this frame.
    Local,
    /// The restriction was received from a parent frame.
    Inherited,
}

/// The restriction in force for a frame.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FrameGuard {
    origin: GuardOrigin,
    permissions: PermissionSet,
}

impl FrameGuard {
    /// A guard as received from a restricted parent.
    pub fn inherited(permissions: PermissionSet) -> Self {
        Self {
            origin: GuardOrigin::Inherited,
            permissions,
        }
    }

    /// Where the restriction came from.
    pub fn origin(&self) -> GuardOrigin {
        self.origin
    }

    /// The permissions in force. Only meaningful while [`is_active`][Self::is_active].
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Whether mutations are being restricted.
    pub fn is_active(&self) -> bool {
        self.origin != GuardOrigin::None
    }

    /// The guard handed to a child frame.
    pub fn child(&self) -> Self {
        let origin = match self.origin {
            GuardOrigin::None => GuardOrigin::None,
            GuardOrigin::Local | GuardOrigin::Inherited => GuardOrigin::Inherited,
        };
        Self {
            origin,
            permissions: self.permissions.clone(),
        }
    }

    /// Release a restriction established by this frame.
    ///
    /// A restriction inherited from a parent cannot be released.
    pub fn disable(&mut self) {
        match self.origin {
            GuardOrigin::None | GuardOrigin::Local => *self = Self::default(),
            GuardOrigin::Inherited => (),
        }
    }

    /// Restrict mutations to the declared permissions.
    ///
    /// Without an inherited restriction the declared set replaces the current
    /// one. Under an inherited restriction the declared set can only narrow
    /// what the parent allowed.
    pub fn enable(&mut self, declared: PermissionSet) {
        match self.origin {
            GuardOrigin::None | GuardOrigin::Local => {
                self.origin = GuardOrigin::Local;
                self.permissions = declared;
            }
            GuardOrigin::Inherited => {
                self.permissions = self.permissions.intersect(&declared);
            }
        }
    }
}
