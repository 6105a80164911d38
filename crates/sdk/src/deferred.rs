//! Single-fulfillment results for calls made without a callback.

use crate::error::{Result, SdkError};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

type SuccessFn = Box<dyn FnOnce(Value) + Send>;
type ErrorFn = Box<dyn FnOnce(SdkError) + Send>;

/// Observable state of a [`Deferred`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    Pending,
    Fulfilled,
    Rejected,
}

enum Outcome {
    Pending,
    Settled(Result<Value>),
    /// Delivered to a continuation or to `wait`
    Taken(DeferredState),
}

struct Inner {
    outcome: Outcome,
    on_success: Option<SuccessFn>,
    on_error: Option<ErrorFn>,
    /// Set on first registration, whether the continuation fired or not
    success_registered: bool,
    error_registered: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A result that settles exactly once.
///
/// At most one success and one error continuation may be registered.
/// A continuation registered after settlement fires immediately.
pub struct Deferred {
    shared: Arc<Shared>,
}

/// Settling half of a [`Deferred`]
pub struct Resolver {
    shared: Arc<Shared>,
}

impl Deferred {
    pub fn pending() -> (Deferred, Resolver) {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                outcome: Outcome::Pending,
                on_success: None,
                on_error: None,
                success_registered: false,
                error_registered: false,
            }),
            notify: Notify::new(),
        });
        (
            Deferred {
                shared: shared.clone(),
            },
            Resolver { shared },
        )
    }

    pub fn settled(outcome: Result<Value>) -> Deferred {
        let (deferred, resolver) = Deferred::pending();
        resolver.settle(outcome);
        deferred
    }

    pub fn state(&self) -> DeferredState {
        match &self.shared.lock().outcome {
            Outcome::Pending => DeferredState::Pending,
            Outcome::Settled(Ok(_)) => DeferredState::Fulfilled,
            Outcome::Settled(Err(_)) => DeferredState::Rejected,
            Outcome::Taken(state) => *state,
        }
    }

    pub fn on_success(&self, f: impl FnOnce(Value) + Send + 'static) -> Result<&Self> {
        let mut inner = self.shared.lock();
        if inner.success_registered {
            return Err(SdkError::AlreadyRegistered("success"));
        }
        inner.success_registered = true;
        match std::mem::replace(&mut inner.outcome, Outcome::Pending) {
            Outcome::Settled(Ok(value)) => {
                inner.outcome = Outcome::Taken(DeferredState::Fulfilled);
                drop(inner);
                f(value);
            }
            other => {
                inner.outcome = other;
                inner.on_success = Some(Box::new(f));
            }
        }
        Ok(self)
    }

    pub fn on_error(&self, f: impl FnOnce(SdkError) + Send + 'static) -> Result<&Self> {
        let mut inner = self.shared.lock();
        if inner.error_registered {
            return Err(SdkError::AlreadyRegistered("error"));
        }
        inner.error_registered = true;
        match std::mem::replace(&mut inner.outcome, Outcome::Pending) {
            Outcome::Settled(Err(err)) => {
                inner.outcome = Outcome::Taken(DeferredState::Rejected);
                drop(inner);
                f(err);
            }
            other => {
                inner.outcome = other;
                inner.on_error = Some(Box::new(f));
            }
        }
        Ok(self)
    }

    /// Wait for settlement. Fails with [`SdkError::Consumed`] if a
    /// continuation already took the outcome.
    pub async fn wait(self) -> Result<Value> {
        loop {
            let notified = self.shared.notify.notified();
            {
                let mut inner = self.shared.lock();
                match std::mem::replace(&mut inner.outcome, Outcome::Pending) {
                    Outcome::Pending => {}
                    Outcome::Settled(outcome) => {
                        let state = match outcome {
                            Ok(_) => DeferredState::Fulfilled,
                            Err(_) => DeferredState::Rejected,
                        };
                        inner.outcome = Outcome::Taken(state);
                        return outcome;
                    }
                    taken @ Outcome::Taken(_) => {
                        inner.outcome = taken;
                        return Err(SdkError::Consumed);
                    }
                }
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.state())
            .finish()
    }
}

impl Resolver {
    pub fn settle(self, outcome: Result<Value>) {
        let mut inner = self.shared.lock();
        match outcome {
            Ok(value) => match inner.on_success.take() {
                Some(f) => {
                    inner.outcome = Outcome::Taken(DeferredState::Fulfilled);
                    drop(inner);
                    f(value);
                }
                None => inner.outcome = Outcome::Settled(Ok(value)),
            },
            Err(err) => match inner.on_error.take() {
                Some(f) => {
                    inner.outcome = Outcome::Taken(DeferredState::Rejected);
                    drop(inner);
                    f(err);
                }
                None => inner.outcome = Outcome::Settled(Err(err)),
            },
        }
        self.shared.notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_wait_after_settle() {
        let (deferred, resolver) = Deferred::pending();
        assert_eq!(deferred.state(), DeferredState::Pending);

        resolver.settle(Ok(json!(7)));
        assert_eq!(deferred.state(), DeferredState::Fulfilled);
        assert_eq!(tokio_test::block_on(deferred.wait()).unwrap(), json!(7));
    }

    #[tokio::test]
    async fn test_wait_before_settle() {
        let (deferred, resolver) = Deferred::pending();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            resolver.settle(Err(SdkError::InterfaceNotFound("Nope".into())));
        });

        let err = deferred.wait().await.unwrap_err();
        assert!(matches!(err, SdkError::InterfaceNotFound(_)));
    }

    #[test]
    fn test_continuation_fires_once_on_settle() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (deferred, resolver) = Deferred::pending();

        let counter = hits.clone();
        deferred
            .on_success(move |v| {
                assert_eq!(v, json!("done"));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        resolver.settle(Ok(json!("done")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(deferred.state(), DeferredState::Fulfilled);
        assert!(matches!(
            tokio_test::block_on(deferred.wait()),
            Err(SdkError::Consumed)
        ));
    }

    #[test]
    fn test_late_registration_fires_immediately() {
        let deferred = Deferred::settled(Err(SdkError::ContractNotLoaded));
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        deferred.on_success(|_| panic!("not fulfilled")).unwrap();
        deferred
            .on_error(move |err| {
                assert!(matches!(err, SdkError::ContractNotLoaded));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(deferred.state(), DeferredState::Rejected);
    }

    #[test]
    fn test_second_registration_rejected() {
        let (deferred, _resolver) = Deferred::pending();
        deferred.on_error(|_| {}).unwrap();
        assert!(matches!(
            deferred.on_error(|_| {}),
            Err(SdkError::AlreadyRegistered("error"))
        ));
    }

    #[test]
    fn test_registration_stays_single_after_firing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let deferred = Deferred::settled(Ok(json!(1)));

        let counter = hits.clone();
        deferred
            .on_success(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(matches!(
            deferred.on_success(|_| panic!("fired twice")),
            Err(SdkError::AlreadyRegistered("success"))
        ));

        let (deferred, resolver) = Deferred::pending();
        let counter = hits.clone();
        deferred
            .on_error(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        resolver.settle(Err(SdkError::ContractNotLoaded));
        assert!(matches!(
            deferred.on_error(|_| panic!("fired twice")),
            Err(SdkError::AlreadyRegistered("error"))
        ));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
