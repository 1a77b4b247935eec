//! Fixed topic map shared by both nodes and the backend.
//!
//! All topics live under a configured prefix so several deployments can
//! share a public broker without colliding.

/// Builds and parses the topic set for one deployment.
#[derive(Debug, Clone)]
pub struct TopicMap {
    prefix: String,
    wake_device_id: String,
}

/// Which part of a chunked image transfer a topic addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePart {
    Start,
    Chunk(u32),
    End,
}

impl TopicMap {
    pub fn new(prefix: &str, wake_device_id: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            wake_device_id: wake_device_id.to_string(),
        }
    }

    /// Wake-word signal topic (wake node → all).
    pub fn signal(&self) -> String {
        format!("{}/device/{}/signal", self.prefix, self.wake_device_id)
    }

    /// Server command topic (backend → camera node).
    pub fn command(&self) -> String {
        format!("{}/camera/command", self.prefix)
    }

    /// Per-device activity log topic.
    pub fn logs(&self, device_id: &str) -> String {
        format!("{}/logs/{}", self.prefix, device_id)
    }

    /// Image transfer start topic for one image id.
    pub fn image_start(&self, image_id: u32) -> String {
        format!("{}/camera/image/{}/start", self.prefix, image_id)
    }

    /// Image chunk topic; the suffix carries image id and chunk index.
    pub fn image_chunk(&self, image_id: u32, index: u32) -> String {
        format!("{}/camera/image/{}/chunk/{}", self.prefix, image_id, index)
    }

    /// Image transfer end topic for one image id.
    pub fn image_end(&self, image_id: u32) -> String {
        format!("{}/camera/image/{}/end", self.prefix, image_id)
    }

    /// Wildcard subscription covering every image transfer topic.
    pub fn image_wildcard(&self) -> String {
        format!("{}/camera/image/#", self.prefix)
    }

    /// Parses an inbound image topic back into `(image_id, part)`.
    ///
    /// Returns `None` for topics outside the image namespace or with a
    /// malformed suffix.
    pub fn parse_image(&self, topic: &str) -> Option<(u32, ImagePart)> {
        let base = format!("{}/camera/image/", self.prefix);
        let suffix = topic.strip_prefix(&base)?;
        let mut parts = suffix.split('/');
        let image_id: u32 = parts.next()?.parse().ok()?;
        let part = match parts.next()? {
            "start" => ImagePart::Start,
            "end" => ImagePart::End,
            "chunk" => ImagePart::Chunk(parts.next()?.parse().ok()?),
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some((image_id, part))
    }
}
