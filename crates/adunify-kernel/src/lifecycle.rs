//! Init/deinit state machine shared by adapters, providers and the service.
//!
//! The machine is strictly linear:
//! `Uninitialized -> Initialized -> Uninitialized`. Both transitions are
//! idempotent: asking for the state you are already in does nothing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MediationResult;

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Constructed or torn down; every query answers "not available"
    #[default]
    Uninitialized,
    /// Setup has run; the entity may serve requests
    Initialized,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Initialized => write!(f, "initialized"),
        }
    }
}

/// Guards entity-specific setup and teardown so each runs once per transition.
#[derive(Debug, Default)]
pub struct LifecycleGuard {
    state: LifecycleState,
}

impl LifecycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Initialized
    }

    /// Run `setup` and move to [`LifecycleState::Initialized`].
    ///
    /// Returns `Ok(false)` without calling `setup` when already initialized.
    /// A failing `setup` leaves the guard uninitialized.
    pub fn initialize_with<E>(
        &mut self,
        setup: impl FnOnce() -> Result<(), E>,
    ) -> Result<bool, E> {
        if self.is_initialized() {
            return Ok(false);
        }
        setup()?;
        self.state = LifecycleState::Initialized;
        Ok(true)
    }

    /// Run `teardown` and move back to [`LifecycleState::Uninitialized`].
    ///
    /// Returns `false` without calling `teardown` when not initialized.
    pub fn deinitialize_with(&mut self, teardown: impl FnOnce()) -> bool {
        if !self.is_initialized() {
            return false;
        }
        teardown();
        self.state = LifecycleState::Uninitialized;
        true
    }
}

/// Common lifecycle surface of adapters, providers and the service.
pub trait Lifecycle {
    fn is_initialized(&self) -> bool;

    /// Bring the entity up. Calling it again is a no-op.
    fn initialize(&mut self) -> MediationResult<()>;

    /// Tear the entity down. Calling it while uninitialized is a no-op.
    fn deinitialize(&mut self);
}

impl<T: Lifecycle + ?Sized> Lifecycle for Box<T> {
    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn initialize(&mut self) -> MediationResult<()> {
        (**self).initialize()
    }

    fn deinitialize(&mut self) {
        (**self).deinitialize()
    }
}
