use serde::{Deserialize, Serialize};

/// Lifecycle of a single capability (read or download) granted by an owner
/// to a subscriber. A capability becomes `Pending` when the subscriber asks
/// for it and `Granted` once the owner approves the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityState {
    #[default]
    None,
    Pending,
    Granted,
}

impl CapabilityState {
    /// Subscriber asks for the capability. Re-requesting while pending
    /// stays pending; an already granted capability is left untouched.
    pub fn request(self) -> Self {
        match self {
            Self::Granted => Self::Granted,
            _ => Self::Pending,
        }
    }

    /// Owner approves the request. Granting with nothing pending is a
    /// no-op, a second grant leaves the state unchanged.
    pub fn grant(self) -> Self {
        match self {
            Self::None => Self::None,
            _ => Self::Granted,
        }
    }

    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }

    /// Decodes the stored (access, request) flag pair. The pair
    /// access=false ∧ request=true is never written by any transition and
    /// collapses to `None`.
    pub fn from_flags(access: bool, request: bool) -> Self {
        match (access, request) {
            (true, true) => Self::Pending,
            (true, false) => Self::Granted,
            (false, _) => Self::None,
        }
    }

    pub fn flags(self) -> (bool, bool) {
        match self {
            Self::None => (false, false),
            Self::Pending => (true, true),
            Self::Granted => (true, false),
        }
    }
}

/// Permission record between a file owner and a subscriber. At most one
/// record exists per ordered (owner, subscriber) pair; it is created lazily
/// on the first request and never deleted afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Access {
    pub owner_id: i32,
    pub subscriber_id: i32,
    /// Optimistic concurrency counter maintained by the store.
    #[serde(skip_serializing)]
    pub version: i32,
    pub read: CapabilityState,
    pub download: CapabilityState,
}

impl Access {
    pub fn new(owner_id: i32, subscriber_id: i32) -> Self {
        Self {
            owner_id,
            subscriber_id,
            version: 0,
            read: CapabilityState::None,
            download: CapabilityState::None,
        }
    }

    /// True while the owner still has to act on at least one request.
    pub fn has_pending_request(&self) -> bool {
        self.read.is_pending() || self.download.is_pending()
    }
}
