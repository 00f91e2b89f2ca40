//! Lifecycle capability shared by long-lived subsystems.

use crate::base::neterror::NetError;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A long-lived subsystem whose start and close are driven externally.
pub trait Feature: Send + Sync {
    /// Short name used in logs.
    fn type_name(&self) -> &'static str;

    fn start(&self) -> Result<(), NetError>;

    /// Closes the feature. Later lookups fail with
    /// [`NetError::ResolverClosed`]. Closing twice is not an error.
    fn close(&self) -> Result<(), NetError>;
}

impl<F: Feature + ?Sized> Feature for Arc<F> {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn start(&self) -> Result<(), NetError> {
        (**self).start()
    }

    fn close(&self) -> Result<(), NetError> {
        (**self).close()
    }
}

/// Start/close flags for a [`Feature`] implementation.
#[derive(Debug, Default)]
pub struct FeatureState {
    started: AtomicBool,
    closed: AtomicBool,
}

impl FeatureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, feature: &'static str) -> Result<(), NetError> {
        if self.is_closed() {
            return Err(NetError::ResolverClosed);
        }
        if !self.started.swap(true, Ordering::AcqRel) {
            tracing::debug!(feature, "started");
        }
        Ok(())
    }

    pub fn close(&self, feature: &'static str) -> Result<(), NetError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(feature, "closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Fails with [`NetError::ResolverClosed`] once closed.
    #[inline]
    pub fn ensure_open(&self) -> Result<(), NetError> {
        if self.is_closed() {
            Err(NetError::ResolverClosed)
        } else {
            Ok(())
        }
    }
}
