//! # Signal Kit
//!
//! A small reactive core for binding UI controls to application state.
//!
//! ## Features
//!
//! - **Replaying values**: `SignalValue` hands its current value to every new observer
//! - **Pluggable locking**: every critical section goes through an injected `Lock`
//! - **Disposable subscriptions**: observers are removed through `Disposable` tokens,
//!   optionally collected in a `DisposableBag`
//! - **Queue dispatch**: `send_on` delivers values later on a `SchedulerQueue`
//!   without keeping the signal alive
//!
//! ## Example
//!
//! ```rust,no_run
//! use signal_kit::prelude::*;
//!
//! let bag = DisposableBag::new();
//! let count = SignalValue::atomic(0);
//!
//! count
//!     .next(|count| println!("count is {count}"))
//!     .dispose_with(&bag);
//!
//! count.send(1);
//! ```

mod disposable;
mod error;
mod event;
mod lock;
mod observable;
mod scheduler;
mod signal;
mod storage;

pub use disposable::{Disposable, DisposableBag};
pub use error::SchedulerError;
pub use event::{Event, SenderEvent};
pub use lock::{Lock, LockGuard, MockLock, MutexLock};
pub use observable::Observable;
pub use scheduler::{MainLoop, QueueBuilder, Scheduler, SchedulerQueue};
pub use signal::{Signal, SignalValue, WeakSignal, WeakSignalValue};
pub use storage::ObserverId;

// Re-export the prelude
pub mod prelude {
    pub use crate::{
        Disposable, DisposableBag, Event, Observable, Scheduler, SchedulerQueue, SenderEvent,
        Signal, SignalValue,
    };
}
