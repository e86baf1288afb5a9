use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::{RenderConfig, SceneRecord};

/// JSON document handed over by the script/asset producer.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ScriptManifest {
    pub config: RenderConfig,
    pub scenes: Vec<SceneRecord>,
}

impl ScriptManifest {
    /// Load a manifest and resolve relative asset paths against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open script manifest '{}'", path.display()))?;
        let mut manifest: ScriptManifest = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ReelError::validation(format!("parse script manifest: {e}")))?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.rebase(root);
        Ok(manifest)
    }

    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| ReelError::validation(format!("parse script manifest: {e}")))
    }

    /// Join every relative asset path onto `root`. Absolute paths are kept.
    pub fn rebase(&mut self, root: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        for scene in &mut self.scenes {
            join(&mut scene.audio_ref);
            if let Some(v) = scene.visual_ref.as_mut() {
                join(v);
            }
        }
        if let Some(bg) = self.config.background_track.as_mut() {
            join(&mut bg.path);
        }
        if let Some(font) = self.config.caption_font.as_mut() {
            join(font);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/manifest.rs"]
mod tests;
