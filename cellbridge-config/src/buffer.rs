use std::fmt;

use crate::error::ResourceError;

enum State {
    Held(String),
    Released,
    Null,
}

/// Scoped handle over text owned by an external codec.
///
/// The release hook runs exactly once: either through an explicit
/// [`release`](Self::release) or when the handle is dropped while still
/// held. A null handle (the codec returned nothing) never runs it.
pub struct ExternalBuffer {
    state: State,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ExternalBuffer {
    /// Wraps external text together with the hook that frees it.
    pub fn new(text: String, release: impl FnOnce() + Send + 'static) -> Self {
        ExternalBuffer {
            state: State::Held(text),
            release: Some(Box::new(release)),
        }
    }

    /// Wraps text that needs no external release.
    pub fn owned(text: impl Into<String>) -> Self {
        ExternalBuffer {
            state: State::Held(text.into()),
            release: None,
        }
    }

    /// A handle that was never acquired.
    pub fn null() -> Self {
        ExternalBuffer {
            state: State::Null,
            release: None,
        }
    }

    pub fn as_str(&self) -> Result<&str, ResourceError> {
        match &self.state {
            State::Held(text) => Ok(text),
            State::Released => Err(ResourceError::AlreadyReleased),
            State::Null => Err(ResourceError::NotAcquired),
        }
    }

    pub fn is_held(&self) -> bool {
        matches!(self.state, State::Held(_))
    }

    /// Frees the buffer now instead of at drop.
    pub fn release(&mut self) -> Result<(), ResourceError> {
        match self.state {
            State::Held(_) => {
                self.state = State::Released;
                if let Some(hook) = self.release.take() {
                    hook();
                }
                Ok(())
            }
            State::Released => Err(ResourceError::AlreadyReleased),
            State::Null => Err(ResourceError::NotAcquired),
        }
    }
}

impl Drop for ExternalBuffer {
    fn drop(&mut self) {
        if self.is_held() {
            let _ = self.release();
        }
    }
}

impl fmt::Debug for ExternalBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Held(text) => format!("Held({} bytes)", text.len()),
            State::Released => "Released".to_string(),
            State::Null => "Null".to_string(),
        };
        f.debug_struct("ExternalBuffer").field("state", &state).finish()
    }
}
