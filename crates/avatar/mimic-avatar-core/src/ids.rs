//! Identifiers for scene nodes handed to the core by adapters.

use serde::{Deserialize, Serialize};

/// Opaque handle for one node of the host scene graph.
///
/// Adapters pick the encoding (Bevy uses entity bits, the wasm surface uses
/// whatever integer the JS side supplies). The core only compares handles.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub u64);
