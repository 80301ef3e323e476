//! Per-request verification context.
//!
//! Every component call receives the context explicitly. It names the tenant
//! and the request, and those two values alone decide the staging directory,
//! so the request id is restricted to characters that cannot escape it.

/// Error building a [`VerificationContext`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("request id must be non-empty and use only [A-Za-z0-9_.-], got {request_id:?}")]
    InvalidRequestId { request_id: String },
}

/// Identity of one verification job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationContext {
    tenant: u32,
    request_id: String,
}

impl VerificationContext {
    /// Build a context.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::InvalidRequestId`] if `request_id` is empty,
    /// is `.` or `..`, or contains a character outside `[A-Za-z0-9_.-]`.
    pub fn new(tenant: u32, request_id: impl Into<String>) -> Result<Self, ContextError> {
        let request_id = request_id.into();
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
        if request_id.is_empty()
            || request_id == "."
            || request_id == ".."
            || !request_id.chars().all(allowed)
        {
            return Err(ContextError::InvalidRequestId { request_id });
        }
        Ok(Self { tenant, request_id })
    }

    #[must_use]
    pub fn tenant(&self) -> u32 {
        self.tenant
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Directory name of this job's staging area: `<tenant>_<request_id>`.
    #[must_use]
    pub fn staging_dir_name(&self) -> String {
        format!("{}_{}", self.tenant, self.request_id)
    }
}
