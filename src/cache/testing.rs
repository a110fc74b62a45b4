//! Scripted page source for cache unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::application::error::ApiError;
use crate::application::pagination::{Page, meta};

use super::source::PageSource;

/// Serves `last_page` pages of consecutive numbers, `per_page` per page.
pub(crate) struct ScriptedSource {
    last_page: u32,
    per_page: u32,
    requested: Mutex<Vec<u32>>,
    failures: Mutex<VecDeque<ApiError>>,
    gate: Option<watch::Sender<bool>>,
}

impl ScriptedSource {
    pub fn numbered(last_page: u32, per_page: u32) -> Self {
        Self {
            last_page,
            per_page,
            requested: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            gate: None,
        }
    }

    /// Hold every fetch until `open` is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(watch::channel(false).0);
        self
    }

    pub fn open(&self) {
        if let Some(gate) = &self.gate {
            gate.send_replace(true);
        }
    }

    pub fn fail_next(&self, err: ApiError) {
        self.failures.lock().expect("failures").push_back(err);
    }

    pub fn requested(&self) -> Vec<u32> {
        self.requested.lock().expect("requested").clone()
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().expect("requested").len()
    }
}

#[async_trait]
impl PageSource<u32> for ScriptedSource {
    async fn fetch(&self, page: u32) -> Result<Page<u32>, ApiError> {
        self.requested.lock().expect("requested").push(page);

        if let Some(gate) = &self.gate {
            let mut open = gate.subscribe();
            let _ = open.wait_for(|open| *open).await;
        }

        if let Some(err) = self.failures.lock().expect("failures").pop_front() {
            return Err(err);
        }

        let first = (page - 1) * self.per_page + 1;
        let items = (first..first + self.per_page).collect();
        let total = u64::from(self.last_page) * u64::from(self.per_page);
        Ok(Page::new(items, meta(page, self.last_page, self.per_page, total)))
    }
}
