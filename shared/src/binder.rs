//! Mesh binding
//!
//! Scans a loaded scene graph once and records which mesh plays which role on the clock.
//! The scene keeps ownership of its nodes; bindings only hold copyable handles.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hands::Hand;

/// Role a mesh plays on the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshRole {
    Second,
    Minute,
    /// Redundant minute hand, rotated identically to the primary
    MinuteTwin,
    Hour,
    /// Redundant hour hand, rotated identically to the primary
    HourTwin,
    /// Day-of-month dial
    Dial,
    /// Decorative spinner, held at identity
    Spinner,
}

/// Mesh names for each role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshNames {
    pub second: String,
    pub minute: String,
    pub minute_twin: String,
    pub hour: String,
    pub hour_twin: String,
    pub dial: String,
    pub spinner: String,
}

impl Default for MeshNames {
    /// Node names exported in the Putnik model
    fn default() -> Self {
        Self {
            second: "Cylinder001".to_string(),
            minute: "Hand_Min001_1".to_string(),
            minute_twin: "Hand_Min001".to_string(),
            hour: "Hand_Hour001_1".to_string(),
            hour_twin: "Hand_Hour001".to_string(),
            dial: "Cylinder003".to_string(),
            spinner: "Cylinder004".to_string(),
        }
    }
}

impl MeshNames {
    /// Role of a mesh with the given name, if any
    pub fn role_of(&self, name: &str) -> Option<MeshRole> {
        [
            (&self.second, MeshRole::Second),
            (&self.minute, MeshRole::Minute),
            (&self.minute_twin, MeshRole::MinuteTwin),
            (&self.hour, MeshRole::Hour),
            (&self.hour_twin, MeshRole::HourTwin),
            (&self.dial, MeshRole::Dial),
            (&self.spinner, MeshRole::Spinner),
        ]
        .into_iter()
        .find(|(candidate, _)| candidate.as_str() == name)
        .map(|(_, role)| role)
    }
}

/// A scene graph the binder can walk.
///
/// Implementations visit every mesh node (and only mesh nodes) exactly once, passing its
/// name and a handle that stays valid for the lifetime of the scene.
pub trait SceneGraph {
    type Handle: Copy;

    fn traverse_meshes(&self, visit: &mut dyn FnMut(&str, Self::Handle));
}

/// Result of one binding pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandBindings<H> {
    pub second: Option<H>,
    pub minute: Option<H>,
    pub minute_twin: Option<H>,
    pub hour: Option<H>,
    pub hour_twin: Option<H>,
    pub dial: Option<H>,
    pub spinner: Option<H>,
}

impl<H> Default for HandBindings<H> {
    fn default() -> Self {
        Self {
            second: None,
            minute: None,
            minute_twin: None,
            hour: None,
            hour_twin: None,
            dial: None,
            spinner: None,
        }
    }
}

impl<H: Copy> HandBindings<H> {
    /// True when all three primary hands are bound
    pub fn hands_ready(&self) -> bool {
        self.second.is_some() && self.minute.is_some() && self.hour.is_some()
    }

    fn slot_mut(&mut self, role: MeshRole) -> &mut Option<H> {
        match role {
            MeshRole::Second => &mut self.second,
            MeshRole::Minute => &mut self.minute,
            MeshRole::MinuteTwin => &mut self.minute_twin,
            MeshRole::Hour => &mut self.hour,
            MeshRole::HourTwin => &mut self.hour_twin,
            MeshRole::Dial => &mut self.dial,
            MeshRole::Spinner => &mut self.spinner,
        }
    }

    /// Every bound target for a logical hand, primary first
    pub fn targets(&self, hand: Hand) -> impl Iterator<Item = H> {
        let (primary, twin) = match hand {
            Hand::Second => (self.second, None),
            Hand::Minute => (self.minute, self.minute_twin),
            Hand::Hour => (self.hour, self.hour_twin),
        };
        primary.into_iter().chain(twin)
    }

    /// Number of roles that found a mesh
    pub fn bound_count(&self) -> usize {
        [
            self.second,
            self.minute,
            self.minute_twin,
            self.hour,
            self.hour_twin,
            self.dial,
            self.spinner,
        ]
        .iter()
        .filter(|slot| slot.is_some())
        .count()
    }
}

/// Walk a scene once and bind meshes to roles.
///
/// The first mesh carrying a role's name wins; later duplicates are ignored.
pub fn bind<S: SceneGraph>(scene: &S, names: &MeshNames) -> HandBindings<S::Handle> {
    let mut bindings = HandBindings::default();

    scene.traverse_meshes(&mut |name, handle| {
        let Some(role) = names.role_of(name) else {
            return;
        };
        let slot = bindings.slot_mut(role);
        if slot.is_some() {
            debug!(mesh = name, ?role, "duplicate mesh name ignored");
            return;
        }
        *slot = Some(handle);
    });

    debug!(
        bound = bindings.bound_count(),
        hands_ready = bindings.hands_ready(),
        "mesh binding finished"
    );
    bindings
}
