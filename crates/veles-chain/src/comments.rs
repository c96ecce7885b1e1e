use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use veles_types::{AccountName, PostId, Timepoint};

/// The view of a comment the worker subsystem needs. The comment
/// subsystem proper (bodies, votes, payouts) lives elsewhere; this store
/// is the opaque `(author, permlink) → comment` map it exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: PostId,
    pub author: AccountName,
    pub permlink: String,
    /// `None` for a top-level post, `Some(parent)` for a reply.
    pub parent_author: Option<AccountName>,
    pub created: Timepoint,
    /// `Timepoint::NEVER` once the post has left its cashout window.
    pub cashout_time: Timepoint,
    pub net_rshares: i64,
}

impl Comment {
    pub fn is_post(&self) -> bool {
        self.parent_author.is_none()
    }

    pub fn in_cashout_window(&self) -> bool {
        !self.cashout_time.is_never()
    }
}

/// In-memory comment map with lookup by `(author, permlink)` and by id.
#[derive(Debug, Default, Clone)]
pub struct CommentStore {
    by_id: BTreeMap<PostId, Comment>,
    by_author_permlink: BTreeMap<(AccountName, String), PostId>,
    next_id: u64,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host-side: record a new top-level post inside its cashout window.
    pub fn create_post(
        &mut self,
        author: AccountName,
        permlink: &str,
        created: Timepoint,
        cashout_time: Timepoint,
    ) -> PostId {
        self.insert(author, permlink, None, created, cashout_time)
    }

    /// Host-side: record a reply.
    pub fn create_reply(
        &mut self,
        author: AccountName,
        permlink: &str,
        parent_author: AccountName,
        created: Timepoint,
        cashout_time: Timepoint,
    ) -> PostId {
        self.insert(author, permlink, Some(parent_author), created, cashout_time)
    }

    fn insert(
        &mut self,
        author: AccountName,
        permlink: &str,
        parent_author: Option<AccountName>,
        created: Timepoint,
        cashout_time: Timepoint,
    ) -> PostId {
        let id = PostId(self.next_id);
        self.next_id += 1;
        let comment = Comment {
            id,
            author: author.clone(),
            permlink: permlink.to_string(),
            parent_author,
            created,
            cashout_time,
            net_rshares: 0,
        };
        debug!(%id, %author, permlink, "comment recorded");
        self.by_author_permlink
            .insert((author, permlink.to_string()), id);
        self.by_id.insert(id, comment);
        id
    }

    pub fn get(&self, author: &AccountName, permlink: &str) -> Result<&Comment> {
        self.by_author_permlink
            .get(&(author.clone(), permlink.to_string()))
            .and_then(|id| self.by_id.get(id))
            .ok_or_else(|| ChainError::MissingComment {
                author: author.clone(),
                permlink: permlink.to_string(),
            })
    }

    pub fn get_by_id(&self, id: PostId) -> Result<&Comment> {
        self.by_id.get(&id).ok_or(ChainError::MissingCommentId(id))
    }

    /// Host-side: the cashout sweep calls this when a post's window
    /// elapses (or reopens it in reorg handling).
    pub fn set_cashout_time(&mut self, id: PostId, cashout_time: Timepoint) -> Result<()> {
        let comment = self
            .by_id
            .get_mut(&id)
            .ok_or(ChainError::MissingCommentId(id))?;
        comment.cashout_time = cashout_time;
        Ok(())
    }

    pub fn set_net_rshares(&mut self, id: PostId, net_rshares: i64) -> Result<()> {
        let comment = self
            .by_id
            .get_mut(&id)
            .ok_or(ChainError::MissingCommentId(id))?;
        comment.net_rshares = net_rshares;
        Ok(())
    }
}
