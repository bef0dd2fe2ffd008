//! Events raised by UI controls.
//!
//! An event carries nothing but the control that raised it. Toolkit glue
//! sends events into a [`Signal`](crate::Signal) and maps them onto values.

/// Something that happened to a sender.
pub trait Event {
    type Sender;

    fn sender(&self) -> &Self::Sender;
}

/// An [`Event`] holding only its sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderEvent<S> {
    sender: S,
}

impl<S> SenderEvent<S> {
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    pub fn into_sender(self) -> S {
        self.sender
    }
}

impl<S> Event for SenderEvent<S> {
    type Sender = S;

    fn sender(&self) -> &S {
        &self.sender
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Observable, Signal, SignalValue};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Switch {
        on: bool,
    }

    #[test]
    fn test_sender_event() {
        let event = SenderEvent::new("button");
        assert_eq!(*event.sender(), "button");
        assert_eq!(event.into_sender(), "button");
    }

    #[test]
    fn test_events_drive_signal_value() {
        let events: Signal<SenderEvent<Arc<Switch>>> = Signal::new();
        let is_on = SignalValue::new(false);

        let target = is_on.clone();
        let _ = events.add_observer(move |event| target.send(event.sender().on));

        events.send(SenderEvent::new(Arc::new(Switch { on: true })));
        assert!(is_on.value());

        events.send(SenderEvent::new(Arc::new(Switch { on: false })));
        assert!(!is_on.value());
    }

    mod through_prelude {
        use crate::prelude::*;

        #[test]
        fn test_prelude_reads_event_sender() {
            let taps: Signal<SenderEvent<&'static str>> = Signal::new();
            let last = SignalValue::new("");
            let target = last.clone();
            let _ = taps.next(move |tap| target.send(*tap.sender()));

            taps.send(SenderEvent::new("+1"));
            assert_eq!(last.value(), "+1");
        }
    }
}
