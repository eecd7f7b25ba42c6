use dashgate_core::RequestId;

use crate::credentials::Credential;

/// Per-request context, inserted by the request middleware.
///
/// Immutable once built; handlers only read it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    credential: Option<Credential>,
}

impl RequestContext {
    pub fn new(request_id: RequestId, credential: Option<Credential>) -> Self {
        Self {
            request_id,
            credential,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Session credential from the inbound cookie, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}
