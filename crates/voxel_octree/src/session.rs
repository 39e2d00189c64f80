//! Render session messages.
//!
//! A display client opens a session with a [`SetupMessage`] and then sends
//! one [`UpdateMessage`] per frame it wants; each update is answered with
//! one frame as tightly packed RGBA8 bytes, top row first. Messages are
//! JSON; how they travel is up to the caller.
//!
//! ```text
//!   client                          RenderSession
//!     │  {"width","height",           │
//!     │   "field_of_view","tree"} ───►│ load tree, allocate buffers
//!     │  {"camera":{...}} ───────────►│ trace + wait
//!     │◄──────────── width*height*4 B │
//! ```

use std::path::{Component, Path};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::trace::{Camera, FlatOctree, RenderConfig, Raytracer};

/// Opens a session. `field_of_view` is in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetupMessage {
  pub width: u32,
  pub height: u32,
  pub field_of_view: f32,
  pub tree: String,
}

impl SetupMessage {
  pub fn from_json(text: &str) -> Result<Self, SessionError> {
    Ok(serde_json::from_str(text)?)
  }

  fn validate(&self) -> Result<(), SessionError> {
    if self.width == 0 || self.height == 0 {
      return Err(SessionError::InvalidSetup(format!(
        "image size {}x{} is empty",
        self.width, self.height
      )));
    }
    if !(self.field_of_view > 0.0 && self.field_of_view < 180.0) {
      return Err(SessionError::InvalidSetup(format!(
        "field of view {} is outside (0, 180) degrees",
        self.field_of_view
      )));
    }
    // The tree name is resolved under the session root and may not leave it.
    let tree = Path::new(&self.tree);
    let contained = tree.components().all(|c| matches!(c, Component::Normal(_)));
    if self.tree.is_empty() || tree.is_absolute() || !contained {
      return Err(SessionError::InvalidSetup(format!(
        "tree '{}' is not a relative path inside the session root",
        self.tree
      )));
    }
    Ok(())
  }
}

/// Requests one frame from `camera`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateMessage {
  pub camera: Camera,
}

impl UpdateMessage {
  pub fn from_json(text: &str) -> Result<Self, SessionError> {
    Ok(serde_json::from_str(text)?)
  }
}

#[derive(Debug)]
pub struct RenderSession {
  setup: SetupMessage,
  tracer: Raytracer,
}

impl RenderSession {
  /// Load the tree named in `setup` from disk, relative to `root`.
  pub fn open(setup: SetupMessage, root: impl AsRef<Path>) -> Result<Self, SessionError> {
    setup.validate()?;
    let path = root.as_ref().join(&setup.tree);
    let tree = FlatOctree::load_file(&path)?;
    tracing::info!(tree = %path.display(), nodes = tree.len(), "render session opened");
    Self::with_tree(setup, Arc::new(tree), RenderConfig::default())
  }

  /// Start a session over an already loaded tree. Placement and jitter come
  /// from `base`; image size and field of view from `setup`.
  pub fn with_tree(
    setup: SetupMessage,
    tree: Arc<FlatOctree>,
    base: RenderConfig,
  ) -> Result<Self, SessionError> {
    setup.validate()?;
    let config = RenderConfig {
      field_of_view: setup.field_of_view.to_radians(),
      width: setup.width,
      height: setup.height,
      ..base
    };
    Ok(Self {
      setup,
      tracer: Raytracer::new(config, tree),
    })
  }

  pub fn setup(&self) -> &SetupMessage {
    &self.setup
  }

  /// Render one frame and return its bytes.
  pub fn render(&mut self, update: &UpdateMessage) -> Vec<u8> {
    self.tracer.render(&update.camera).to_rgba_bytes()
  }

  /// Decode a JSON update and render it.
  pub fn handle_json(&mut self, text: &str) -> Result<Vec<u8>, SessionError> {
    let update = UpdateMessage::from_json(text)?;
    Ok(self.render(&update))
  }

  /// Frames rendered so far.
  pub fn frames(&self) -> u64 {
    self.tracer.frame()
  }
}

#[cfg(test)]
mod tests {
  use glam::Vec3;

  use super::*;
  use crate::trace::FlatNode;
  use crate::types::Rgba8;

  fn setup(width: u32, height: u32) -> SetupMessage {
    SetupMessage {
      width,
      height,
      field_of_view: 90.0,
      tree: "test.oct".into(),
    }
  }

  fn voxel() -> Arc<FlatOctree> {
    Arc::new(FlatOctree::new(vec![FlatNode::leaf(Rgba8([10, 20, 30, 255]))]).unwrap())
  }

  #[test]
  fn test_setup_parses_client_json() {
    let msg = SetupMessage::from_json(
      r#"{"width":640,"height":360,"field_of_view":45,"tree":"test.oct"}"#,
    )
    .unwrap();
    assert_eq!(msg.width, 640);
    assert_eq!(msg.height, 360);
    assert_eq!(msg.field_of_view, 45.0);
    assert_eq!(msg.tree, "test.oct");
  }

  #[test]
  fn test_update_parses_camera() {
    let msg = UpdateMessage::from_json(
      r#"{"camera":{"position":[0,0,0],"look_at":[0,0,-1],"up":[0,1,0]}}"#,
    )
    .unwrap();
    assert_eq!(msg.camera.look_at, Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(msg.camera.up, Vec3::Y);
  }

  #[test]
  fn test_empty_image_rejected() {
    let err = RenderSession::with_tree(setup(0, 4), voxel(), RenderConfig::default()).unwrap_err();
    assert!(matches!(err, SessionError::InvalidSetup(_)));
  }

  #[test]
  fn test_frame_size_and_content() {
    let mut session = RenderSession::with_tree(setup(3, 3), voxel(), RenderConfig::default()).unwrap();
    let frame = session
      .handle_json(r#"{"camera":{"position":[0.5,0.5,-2],"look_at":[0.5,0.5,0.5],"up":[0,1,0]}}"#)
      .unwrap();

    assert_eq!(frame.len(), 3 * 3 * 4);
    // Middle pixel sees the voxel.
    assert_eq!(frame[16..20], [10, 20, 30, 255]);
    assert_eq!(session.frames(), 1);
  }

  #[test]
  fn test_bad_update_is_an_error() {
    let mut session = RenderSession::with_tree(setup(2, 2), voxel(), RenderConfig::default()).unwrap();
    assert!(matches!(
      session.handle_json("{\"camera\":null}"),
      Err(SessionError::Json(_))
    ));
  }

  #[test]
  fn test_missing_tree_file() {
    let err = RenderSession::open(setup(2, 2), "/nonexistent-octree-dir").unwrap_err();
    assert!(matches!(err, SessionError::Codec(_)));
  }

  #[test]
  fn test_tree_outside_root_rejected() {
    let outside = std::env::temp_dir().join("outside.oct");
    let names = [
      outside.to_string_lossy().into_owned(),
      "../outside.oct".to_string(),
      "trees/../../outside.oct".to_string(),
      "./test.oct".to_string(),
      String::new(),
    ];
    for tree in names {
      let msg = SetupMessage {
        tree: tree.clone(),
        ..setup(2, 2)
      };
      let err = RenderSession::open(msg, "/nonexistent-octree-dir").unwrap_err();
      assert!(matches!(err, SessionError::InvalidSetup(_)), "{tree:?}");
    }
  }

  #[test]
  fn test_nested_tree_name_accepted() {
    let msg = SetupMessage {
      tree: "trees/sphere.oct".into(),
      ..setup(2, 2)
    };
    // Passes validation, then fails on the missing file.
    let err = RenderSession::open(msg, "/nonexistent-octree-dir").unwrap_err();
    assert!(matches!(err, SessionError::Codec(_)));
  }
}
