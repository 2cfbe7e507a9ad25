//! Crawl frontier for a single breadth-first crawl
//!
//! This module handles:
//! - FIFO ordering of discovered URLs
//! - Tracking which URLs were already fetched or queued
//! - Bounding the queue relative to the page limit

use std::collections::{HashSet, VecDeque};

/// FIFO queue of URLs to fetch plus the visited set
///
/// A frontier is owned by one crawl call and dropped when the call returns
/// or is cancelled.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    capacity: usize,
}

impl Frontier {
    /// Creates a frontier seeded with `seed`
    ///
    /// The queue admits new URLs while `queued + fetched` stays below
    /// `max(page_limit * 3, page_limit + 5)`.
    pub fn new(seed: impl Into<String>, page_limit: usize) -> Self {
        let seed = seed.into();
        let mut queue = VecDeque::new();
        let mut queued = HashSet::new();
        queued.insert(seed.clone());
        queue.push_back(seed);

        Self {
            queue,
            queued,
            visited: HashSet::new(),
            capacity: page_limit.saturating_mul(3).max(page_limit.saturating_add(5)),
        }
    }

    /// Pops the next unvisited URL and marks it visited
    pub fn next(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            self.queued.remove(&url);
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    /// Enqueues a URL discovered on a fetched page
    ///
    /// Returns false when the URL was already visited or queued, or when the
    /// queue is full given `pages_fetched` pages collected so far.
    pub fn push(&mut self, url: String, pages_fetched: usize) -> bool {
        if self.queue.len() + pages_fetched >= self.capacity {
            return false;
        }
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Number of URLs popped so far, fetched successfully or not
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
