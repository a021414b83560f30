/*!
    Cooperative session shutdown.

    One token is shared by everything attached to a session: the HTTP
    request task, the peer-connection state watcher and the ingest loop.
    The loop polls [`Shutdown::is_fired`] at each iteration boundary;
    async collaborators await [`Shutdown::subscribe`].
*/

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::Error;

/**
    A cloneable cancellation token with an optional fatal cause.

    Firing with [`Shutdown::cancel`] is cooperative: the session ends
    cleanly and no error surfaces. Firing with [`Shutdown::abort`] records
    a cause the session reports through its error sink before closing.
*/
#[derive(Clone, Debug)]
pub struct Shutdown {
    fired: Arc<watch::Sender<bool>>,
    cause: Arc<Mutex<Option<Error>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            fired: Arc::new(tx),
            cause: Arc::new(Mutex::new(None)),
        }
    }

    /**
        Fire the token cooperatively.
    */
    pub fn cancel(&self) {
        self.fired.send_replace(true);
    }

    /**
        Fire the token with a fatal cause.

        The first recorded cause wins; later causes are dropped.
    */
    pub fn abort(&self, cause: Error) {
        {
            let mut slot = self.cause.lock().expect("shutdown cause lock poisoned");
            slot.get_or_insert(cause);
        }
        self.fired.send_replace(true);
    }

    /**
        True once the token has fired.
    */
    pub fn is_fired(&self) -> bool {
        *self.fired.borrow()
    }

    /**
        The fatal cause, if the token was fired with one.
    */
    pub fn cause(&self) -> Option<Error> {
        self.cause
            .lock()
            .expect("shutdown cause lock poisoned")
            .clone()
    }

    /**
        A receiver async collaborators can await.
    */
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.fired.subscribe()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unfired_without_cause() {
        let token = Shutdown::new();
        assert!(!token.is_fired());
        assert!(token.cause().is_none());
    }

    #[test]
    fn cancel_is_cooperative() {
        let token = Shutdown::new();
        token.cancel();
        assert!(token.is_fired());
        assert!(token.cause().is_none());
    }

    #[test]
    fn abort_records_first_cause_only() {
        let token = Shutdown::new();
        token.abort(Error::ReadFrameFailed("reset by peer".into()));
        token.abort(Error::EncodeFailed("late".into()));
        assert!(token.is_fired());
        assert!(matches!(token.cause(), Some(Error::ReadFrameFailed(_))));
    }

    #[test]
    fn clones_observe_the_same_token() {
        let token = Shutdown::new();
        let peer = token.clone();
        token.cancel();
        assert!(peer.is_fired());
    }
}
