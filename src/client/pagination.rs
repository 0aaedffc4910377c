// Concurrent enumeration of partitioned, paged collections
use crate::config::DEFAULT_CONCURRENCY;
use crate::error::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use indexmap::IndexMap;
use std::future::Future;
use std::hash::Hash;

/// Largest page most list endpoints accept
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of a partition
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ListAllOptions {
    pub page_size: usize,
    /// Partitions fetched at the same time
    pub concurrency: usize,
}

impl Default for ListAllOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Merged, de-duplicated records plus the number of page requests issued
#[derive(Debug, Clone)]
pub struct ListAll<T> {
    pub items: Vec<T>,
    pub query_count: usize,
}

/// Fetch every record of every partition
///
/// Each partition is paged sequentially (`fetch_page(partition, offset, size)`)
/// until the server reports no more pages or returns a short page. Up to
/// `concurrency` partitions run at once. Records are merged in partition order
/// keyed by `key_of`; a later duplicate replaces the earlier value in place.
pub async fn list_all<P, T, K, F, Fut, KF>(
    partitions: Vec<P>,
    opts: ListAllOptions,
    fetch_page: F,
    key_of: KF,
) -> Result<ListAll<T>>
where
    F: Fn(P, usize, usize) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
    P: Clone,
    K: Hash + Eq,
    KF: Fn(&T) -> K,
{
    let page_size = opts.page_size.max(1);
    let fetch_page = &fetch_page;

    let partitions: Vec<(Vec<T>, usize)> = stream::iter(partitions)
        .map(move |partition| async move {
            let mut items = Vec::new();
            let mut offset = 0;
            let mut query_count = 0;

            loop {
                query_count += 1;
                let page = fetch_page(partition.clone(), offset, page_size).await?;
                let fetched = page.items.len();
                offset += fetched;
                items.extend(page.items);

                if !page.has_more || fetched < page_size {
                    break;
                }
            }

            Ok::<_, crate::error::DingTalkError>((items, query_count))
        })
        .buffered(opts.concurrency.max(1))
        .try_collect()
        .await?;

    let mut merged = IndexMap::new();
    let mut query_count = 0;
    for (items, count) in partitions {
        query_count += count;
        for item in items {
            merged.insert(key_of(&item), item);
        }
    }

    tracing::debug!(
        "Enumerated {} records with {} page requests",
        merged.len(),
        query_count
    );

    Ok(ListAll {
        items: merged.into_values().collect(),
        query_count,
    })
}
