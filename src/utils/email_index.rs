use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;
const CACHE_CAPACITY: u64 = 50_000;
const CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Answers "is this email taken?" without touching the database in the
/// common cases. The cuckoo filter gives fast negatives, the cache gives
/// fast positives; everything else falls through to the users table.
pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, ()>,
}

/// Outcome of an in-memory lookup.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Lookup {
    Free,
    Taken,
    Unknown,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    pub async fn lookup(&self, email: &str) -> Lookup {
        let email = email.to_owned();
        let maybe = self
            .filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email);
        if !maybe {
            return Lookup::Free;
        }
        if self.taken.get(&email).await.is_some() {
            return Lookup::Taken;
        }
        Lookup::Unknown
    }

    pub async fn insert(&self, email: &str) {
        let email = email.to_owned();
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
        self.taken.insert(email, ()).await;
    }

    /// Called when an address is released by an update or a delete.
    pub async fn remove(&self, email: &str) {
        let email = email.to_owned();
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&email);
        self.taken.invalidate(&email).await;
    }

    /// Load every stored email, streaming rows in batches.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<usize, sqlx::Error> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row?;
            batch.push(email);
            total += 1;

            if batch.len() >= batch_size {
                self.insert_batch(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch).await;
        }

        tracing::info!(total, "Email index warmup complete");
        Ok(total)
    }

    async fn insert_batch(&self, emails: &[String]) {
        {
            let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
            for email in emails {
                filter.add(email);
            }
        }

        let inserts: Vec<_> = emails
            .iter()
            .map(|e| self.taken.insert(e.clone(), ()))
            .collect();
        futures::future::join_all(inserts).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn unseen_addresses_are_free() {
        let index = EmailIndex::new();
        assert_eq!(index.lookup("nobody@example.com").await, Lookup::Free);
    }

    #[actix_web::test]
    async fn inserted_addresses_are_taken() {
        let index = EmailIndex::new();
        index.insert("ana@example.com").await;
        assert_eq!(index.lookup("ana@example.com").await, Lookup::Taken);
    }

    #[actix_web::test]
    async fn removed_addresses_stop_reporting_taken() {
        let index = EmailIndex::new();
        index.insert("ana@example.com").await;
        index.remove("ana@example.com").await;
        assert_ne!(index.lookup("ana@example.com").await, Lookup::Taken);
    }

    #[actix_web::test]
    async fn batch_insert_marks_every_address() {
        let index = EmailIndex::new();
        index
            .insert_batch(&["a@x.io".to_string(), "b@x.io".to_string()])
            .await;
        assert_eq!(index.lookup("a@x.io").await, Lookup::Taken);
        assert_eq!(index.lookup("b@x.io").await, Lookup::Taken);
    }
}
