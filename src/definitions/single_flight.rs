//! Collapse concurrent identical requests into one in-flight call.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{Arc, Mutex},
};

use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum FlightOutcome<V> {
    /// This caller ran the work.
    Led(V),
    /// Another caller ran the work; this one received its result.
    Joined(V),
    /// The leading caller was dropped before it produced a value.
    Abandoned,
}

type Flights<K, V> = Arc<Mutex<HashMap<K, watch::Receiver<Option<V>>>>>;

pub struct SingleFlight<K, V> {
    flights: Flights<K, V>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Removes the flight when the leader finishes or is dropped.
struct FlightGuard<K: Eq + Hash, V> {
    flights: Flights<K, V>,
    key: Option<K>,
}

impl<K: Eq + Hash, V> Drop for FlightGuard<K, V> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let mut flights = self
                .flights
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            flights.remove(&key);
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a call in progress.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    /// Run `work` unless a call for `key` is already in progress, in which
    /// case wait for that call and share its result.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> FlightOutcome<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let sender = {
            let mut flights = self.lock();
            match flights.get(&key) {
                Some(receiver) => Err(receiver.clone()),
                None => {
                    let (sender, receiver) = watch::channel(None);
                    flights.insert(key.clone(), receiver);
                    Ok(sender)
                }
            }
        };

        match sender {
            Ok(sender) => {
                let guard = FlightGuard {
                    flights: Arc::clone(&self.flights),
                    key: Some(key),
                };
                let value = work().await;
                // Free the key first so nobody can join a flight that already landed.
                drop(guard);
                sender.send_replace(Some(value.clone()));
                FlightOutcome::Led(value)
            }
            Err(mut receiver) => match receiver.wait_for(Option::is_some).await {
                Ok(value) => {
                    let value: Option<V> = (*value).clone();
                    match value {
                        Some(value) => FlightOutcome::Joined(value),
                        None => FlightOutcome::Abandoned,
                    }
                }
                Err(_) => FlightOutcome::Abandoned,
            },
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, watch::Receiver<Option<V>>>> {
        self.flights
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    #[tokio::test]
    async fn concurrent_callers_share_one_call() {
        let flights = Arc::new(SingleFlight::<&'static str, u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let flights = Arc::clone(&flights);
            let calls = Arc::clone(&calls);
            let release = Arc::clone(&release);
            handles.push(tokio::spawn(async move {
                flights
                    .run("bank", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        release.notified().await;
                        42
                    })
                    .await
            }));
        }

        timeout(Duration::from_secs(2), async {
            while calls.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        release.notify_one();

        let mut led = 0;
        for handle in handles {
            match handle.await.unwrap() {
                FlightOutcome::Led(v) => {
                    led += 1;
                    assert_eq!(v, 42);
                }
                FlightOutcome::Joined(v) => assert_eq!(v, 42),
                FlightOutcome::Abandoned => panic!("leader was not dropped"),
            }
        }
        assert_eq!(led, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn sequential_calls_run_again() {
        let flights = SingleFlight::<u8, u8>::new();
        assert_eq!(flights.run(1, || async { 1 }).await, FlightOutcome::Led(1));
        assert_eq!(flights.run(1, || async { 2 }).await, FlightOutcome::Led(2));
    }

    #[tokio::test]
    async fn dropped_leader_abandons_followers_and_clears_key() {
        let flights = Arc::new(SingleFlight::<u8, u8>::new());

        let leader = {
            let flights = Arc::clone(&flights);
            tokio::spawn(async move {
                flights
                    .run(7, || async {
                        std::future::pending::<()>().await;
                        0
                    })
                    .await
            })
        };
        timeout(Duration::from_secs(2), async {
            while flights.in_flight() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let follower = {
            let flights = Arc::clone(&flights);
            tokio::spawn(async move { flights.run(7, || async { 9 }).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        leader.abort();

        assert_eq!(follower.await.unwrap(), FlightOutcome::Abandoned);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn key_is_released_before_result_is_published() {
        let flights = Arc::new(SingleFlight::<u8, u8>::new());
        let release = Arc::new(Notify::new());

        let leader = {
            let flights = Arc::clone(&flights);
            let release = Arc::clone(&release);
            tokio::spawn(async move {
                flights
                    .run(3, || async move {
                        release.notified().await;
                        5
                    })
                    .await
            })
        };

        let mut receiver = timeout(Duration::from_secs(2), async {
            loop {
                let found = flights.lock().get(&3).cloned();
                if let Some(receiver) = found {
                    return receiver;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        release.notify_one();
        let published = receiver.wait_for(Option::is_some).await.is_ok();
        assert!(published);
        assert_eq!(flights.in_flight(), 0);
        assert_eq!(flights.run(3, || async { 6 }).await, FlightOutcome::Led(6));
        assert_eq!(leader.await.unwrap(), FlightOutcome::Led(5));
    }
}
