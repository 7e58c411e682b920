//! Request-id allocation and in-flight request bookkeeping.
//!
//! Grounded on the reference's `sftp_alloc_request`/`sftp_find_request`
//! pair: ids are handed out by a first-fit scan over `[256, ..)` so that
//! low ids stay free for anything a caller wants to reserve by hand, and a
//! request is looked up by binary search once its reply arrives.
//!
//! The reference keeps requests in a `tree234`, an order-statistics tree,
//! so both the first-fit scan and the lookup run in `O(log n)`. This
//! crate keeps a sorted `Vec<u32>` of live ids instead of a balanced tree:
//! lookup is still a binary search, but insertion and removal are `O(n)`
//! shifts. In-flight request counts are bounded by the transfer window
//! (by default a few dozen at once), so the simpler structure costs
//! nothing observable in practice.

use std::collections::HashMap;

/// The lowest id this allocator will ever hand out. Ids below this are
/// reserved for anything the embedder wants to number itself (the
/// handshake's `INIT`/`VERSION` exchange has no request id at all, so this
/// is mostly headroom).
const REQUEST_ID_OFFSET: u32 = 256;

/// Bookkeeping kept per in-flight request, keyed by id.
pub(crate) struct Request {
    /// Caller-supplied correlation slot: an index into whatever side table
    /// the caller (a [`crate::transfer::Transfer`], typically) uses to
    /// remember what this request was for. `None` for requests the
    /// [`crate::session::Session`] issues and awaits synchronously, which
    /// have nothing to look up.
    pub userdata: Option<usize>,
}

/// Live request ids plus their bookkeeping.
///
/// `ids` stays sorted at all times; `requests` is the payload store keyed
/// by the same ids. The two are always in sync: every id in `ids` has an
/// entry in `requests` and vice versa.
#[derive(Default)]
pub(crate) struct Registry {
    ids: Vec<u32>,
    requests: HashMap<u32, Request>,
}

impl Registry {
    pub fn new() -> Self {
        Self { ids: Vec::new(), requests: HashMap::new() }
    }

    /// Allocate the lowest id not currently in use, starting the search at
    /// `REQUEST_ID_OFFSET`. Mirrors `sftp_alloc_request`'s walk through the
    /// tree looking for the first gap.
    ///
    /// Always scans from `REQUEST_ID_OFFSET` rather than caching the last
    /// id handed out: a cached hint only ever advances, so it would never
    /// notice a gap freed by `remove` below it.
    pub fn alloc(&mut self, userdata: Option<usize>) -> u32 {
        let mut id = REQUEST_ID_OFFSET;
        loop {
            match self.ids.binary_search(&id) {
                Ok(_) => id += 1,
                Err(pos) => {
                    self.ids.insert(pos, id);
                    self.requests.insert(id, Request { userdata });
                    return id;
                }
            }
        }
    }

    /// Remove and return the bookkeeping for `id`, as when its reply has
    /// arrived and it's no longer in flight.
    pub fn remove(&mut self, id: u32) -> Option<Request> {
        let pos = self.ids.binary_search(&id).ok()?;
        self.ids.remove(pos);
        self.requests.remove(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
