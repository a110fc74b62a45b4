//! Quiescence debouncing for text-search filters.
//!
//! Every keystroke is published through a `Debouncer`; the paired
//! `Debounced` receiver only yields once the value has stopped changing for
//! the configured window, so a burst of edits costs one fetch.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::trace;

/// Input side: publish the latest raw value.
#[derive(Debug)]
pub struct Debouncer<T> {
    tx: watch::Sender<T>,
    window: Duration,
}

/// Output side: yields settled values.
#[derive(Debug)]
pub struct Debounced<T> {
    rx: watch::Receiver<T>,
    window: Duration,
}

impl<T: Clone> Debouncer<T> {
    pub fn new(initial: T, window: Duration) -> (Self, Debounced<T>) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx, window }, Debounced { rx, window })
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// The latest raw value, settled or not.
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Another receiver that starts from the current value.
    pub fn subscribe(&self) -> Debounced<T> {
        Debounced {
            rx: self.tx.subscribe(),
            window: self.window,
        }
    }
}

impl<T: Clone> Debounced<T> {
    /// Wait for the next change, then for `window` without further changes.
    ///
    /// Returns `None` once the `Debouncer` is dropped and nothing is pending.
    /// A value set just before the drop is still delivered.
    pub async fn settled(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        loop {
            match timeout(self.window, self.rx.changed()).await {
                Ok(Ok(())) => trace!("Debounce window restarted"),
                Ok(Err(_)) | Err(_) => break,
            }
        }
        Some(self.rx.borrow_and_update().clone())
    }

    /// Value most recently seen by this receiver.
    pub fn latest(&self) -> T {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::sleep;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_yields_one_value() {
        let (input, mut output) = Debouncer::new(String::new(), Duration::from_millis(300));
        let fetched = Arc::new(Mutex::new(Vec::new()));

        let sink = fetched.clone();
        let consumer = tokio::spawn(async move {
            while let Some(search) = output.settled().await {
                sink.lock().expect("sink").push(search);
            }
        });

        input.set("a".to_string());
        sleep(Duration::from_millis(100)).await;
        input.set("ab".to_string());
        sleep(Duration::from_millis(100)).await;
        input.set("abc".to_string());
        sleep(Duration::from_millis(400)).await;

        drop(input);
        consumer.await.expect("consumer");

        assert_eq!(*fetched.lock().expect("fetched"), vec!["abc".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_edits_settle_separately() {
        let (input, mut output) = Debouncer::new(0_u32, Duration::from_millis(300));

        input.set(1);
        assert_eq!(output.settled().await, Some(1));

        input.set(2);
        assert_eq!(output.settled().await, Some(2));
        assert_eq!(output.latest(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_input_ends_stream() {
        let (input, mut output) = Debouncer::new(0_u32, Duration::from_millis(300));
        drop(input);
        assert_eq!(output.settled().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn value_set_before_drop_is_delivered() {
        let (input, mut output) = Debouncer::new(0_u32, Duration::from_millis(300));
        input.set(7);
        drop(input);
        assert_eq!(output.settled().await, Some(7));
    }
}
