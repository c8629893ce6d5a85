use sha2::{Digest, Sha256};

/// SHA-256 accumulator producing lowercase hex digests.
#[derive(Default)]
pub(crate) struct MessageDigest {
    hasher: Sha256,
}

impl MessageDigest {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update(&mut self, msg: &str) {
        self.hasher.update(msg.as_bytes());
    }

    pub(crate) fn digest(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}
