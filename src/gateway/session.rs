/// Resume state for a gateway session.
///
/// `READY` provides the session ID and resume URL; every dispatch frame
/// advances the sequence. Both together allow resuming after a drop.
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    session_id: Option<String>,
    resume_gateway_url: Option<String>,
    sequence: Option<u64>,
}

impl SessionInfo {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            session_id: None,
            resume_gateway_url: None,
            sequence: None,
        }
    }

    pub fn set_session(&mut self, session_id: String, resume_url: Option<String>) {
        self.session_id = Some(session_id);
        self.resume_gateway_url = resume_url;
    }

    pub const fn update_sequence(&mut self, sequence: Option<u64>) {
        if let Some(seq) = sequence {
            self.sequence = Some(seq);
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn resume_gateway_url(&self) -> Option<&str> {
        self.resume_gateway_url.as_deref()
    }

    #[must_use]
    pub const fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    #[must_use]
    pub const fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    pub fn clear(&mut self) {
        self.session_id = None;
        self.resume_gateway_url = None;
        self.sequence = None;
    }
}
