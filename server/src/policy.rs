use crate::error::BlobError;

/// Upload acceptance policy, fixed at service startup.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub size_limit: u64,
    /// Exact content types accepted; empty means any type is accepted.
    pub allowed_types: Vec<String>,
}

impl UploadPolicy {
    #[must_use]
    pub fn new(size_limit: u64, allowed_types: Vec<String>) -> Self {
        Self {
            size_limit,
            allowed_types,
        }
    }

    /// Checks an upload against the policy. Pure, must run before any disk
    /// or database write.
    pub fn validate(&self, size: u64, mime_type: &str) -> Result<(), BlobError> {
        if size > self.size_limit {
            return Err(BlobError::TooLarge {
                actual: size,
                limit: self.size_limit,
            });
        }

        if !self.allowed_types.is_empty()
            && !self.allowed_types.iter().any(|t| t == mime_type)
        {
            return Err(BlobError::TypeNotAllowed(mime_type.to_owned()));
        }

        Ok(())
    }
}
