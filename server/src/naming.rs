use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_EXTENSION_LEN: usize = 16;

/// Derives collision-resistant on-disk file names.
///
/// A stored name is `{unix_nanos}_{seq}` plus the sanitized extension of the
/// original name. The sequence counter makes two uploads landing in the same
/// clock tick resolve to distinct names even under concurrent calls; a
/// collision would silently overwrite another blob's bytes while its
/// metadata row kept pointing at the wrong content.
///
/// The client-supplied name contributes nothing but the extension, so it
/// cannot influence the directory path.
pub struct StoredNameGenerator {
    seq: AtomicU64,
}

impl StoredNameGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
        }
    }

    pub fn next(&self, original_name: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        let ext = Self::extension(original_name);
        if ext.is_empty() {
            format!("{nanos}_{seq}")
        } else {
            format!("{nanos}_{seq}.{ext}")
        }
    }

    /// Extension of the last path component, reduced to ASCII alphanumerics.
    fn extension(original_name: &str) -> String {
        let name = match original_name.rfind(['\\', '/']) {
            Some(ix) => &original_name[ix + 1..],
            None => original_name,
        };

        let ext = match name.rfind('.') {
            Some(ix) => &name[ix + 1..],
            None => "",
        };

        ext.chars()
            .filter(char::is_ascii_alphanumeric)
            .take(MAX_EXTENSION_LEN)
            .collect()
    }
}

impl Default for StoredNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}
