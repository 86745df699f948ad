//! Filesystem-backed resource cache.
//!
//! Requests are queued and resolved one per `load()` call so a scene that
//! asks for several assets sees them become ready over consecutive frames.
//! Only image dimensions are read; the stage renderer never samples pixels.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use rails_core::host::{AudioHandle, ResourceCache, TextureInfo};

const AUDIO_EXTENSIONS: &[&str] = &["ogg", "mp3", "wav"];

pub struct FileResourceCache {
    root: PathBuf,
    queue: VecDeque<String>,
    known: HashSet<String>,
    textures: HashMap<String, TextureInfo>,
    audio: HashMap<String, AudioHandle>,
    failed: HashSet<String>,
    next_audio_handle: u64,
}

impl FileResourceCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            queue: VecDeque::new(),
            known: HashSet::new(),
            textures: HashMap::new(),
            audio: HashMap::new(),
            failed: HashSet::new(),
            next_audio_handle: 1,
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn has_failed(&self, url: &str) -> bool {
        self.failed.contains(url)
    }

    fn resolve(&mut self, url: &str) -> Result<(), String> {
        let path = self.root.join(url);
        if is_audio(&path) {
            if !path.is_file() {
                return Err(format!("Audio file not found: {}", path.display()));
            }
            let handle = AudioHandle(self.next_audio_handle);
            self.next_audio_handle += 1;
            self.audio.insert(url.to_string(), handle);
            return Ok(());
        }

        let (width, height) = image::image_dimensions(&path)
            .map_err(|e| format!("Failed to read image {}: {e}", path.display()))?;
        self.textures
            .insert(url.to_string(), TextureInfo { width, height });
        Ok(())
    }
}

impl ResourceCache for FileResourceCache {
    fn request(&mut self, url: &str) {
        if self.known.insert(url.to_string()) {
            self.queue.push_back(url.to_string());
        }
    }

    fn load(&mut self) {
        let Some(url) = self.queue.pop_front() else {
            return;
        };
        match self.resolve(&url) {
            Ok(()) => log::debug!("Resource '{}' ready", url),
            Err(e) => {
                log::warn!("{e}");
                self.failed.insert(url);
            }
        }
    }

    fn get(&self, url: &str) -> Option<TextureInfo> {
        self.textures.get(url).copied()
    }

    fn get_audio(&self, url: &str) -> Option<AudioHandle> {
        self.audio.get(url).copied()
    }

    fn current_play_time(&self, _handle: AudioHandle) -> Option<f64> {
        // No playback backend; handles exist but never start playing.
        None
    }
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "rails_resources_test_{}_{}_{}",
            name_hint,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn image_becomes_ready_after_one_load() {
        let dir = temp_dir("image");
        image::RgbaImage::new(6, 4)
            .save(dir.join("bg.png"))
            .expect("failed to write test png");

        let mut cache = FileResourceCache::new(&dir);
        cache.request("bg.png");
        assert_eq!(cache.get("bg.png"), None);

        cache.load();
        assert_eq!(
            cache.get("bg.png"),
            Some(TextureInfo {
                width: 6,
                height: 4
            })
        );

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn requests_resolve_one_per_load_and_dedupe() {
        let dir = temp_dir("queue");
        for name in ["a.png", "b.png"] {
            image::RgbaImage::new(2, 2)
                .save(dir.join(name))
                .expect("failed to write test png");
        }

        let mut cache = FileResourceCache::new(&dir);
        cache.request("a.png");
        cache.request("b.png");
        cache.request("a.png");
        assert_eq!(cache.pending(), 2);

        cache.load();
        assert!(cache.get("a.png").is_some());
        assert!(cache.get("b.png").is_none());
        cache.load();
        assert!(cache.get("b.png").is_some());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_files_fail_without_becoming_ready() {
        let dir = temp_dir("missing");
        let mut cache = FileResourceCache::new(&dir);
        cache.request("nope.png");
        cache.request("song.ogg");
        cache.load();
        cache.load();

        assert!(cache.has_failed("nope.png"));
        assert!(cache.has_failed("song.ogg"));
        assert_eq!(cache.get("nope.png"), None);
        assert_eq!(cache.get_audio("song.ogg"), None);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn audio_files_get_handles_without_play_time() {
        let dir = temp_dir("audio");
        fs::write(dir.join("song.OGG"), b"not really audio").expect("failed to write audio");

        let mut cache = FileResourceCache::new(&dir);
        cache.request("song.OGG");
        cache.load();

        let handle = cache.get_audio("song.OGG").expect("audio handle");
        assert_eq!(cache.current_play_time(handle), None);

        let _ = fs::remove_dir_all(dir);
    }
}
