//! Comment endpoints.

use crate::builder::{build_comment, data_bool, data_object};
use crate::client::ImgurClient;
use crate::dto::CommentInformation;
use crate::entities::Comment;
use crate::gallery::{check_reason, reason_payload};
use crate::types::{ReportReason, Vote};
use imgur_rest_core::route::endpoints::comment;
use imgur_rest_core::{check, CompiledRoute, RestError};
use imgur_rest_runtime::AsyncResult;

/// Comment endpoints of an [`ImgurClient`]
#[derive(Debug, Clone, Copy)]
pub struct CommentRepository<'a> {
    client: &'a ImgurClient,
}

fn id_route(route: imgur_rest_core::Route, id: i64) -> Result<CompiledRoute, RestError> {
    check::positive(id, "id")?;
    route.compile(&[&id.to_string()])
}

impl<'a> CommentRepository<'a> {
    pub(crate) const fn new(client: &'a ImgurClient) -> Self {
        Self { client }
    }

    /// Fetch a comment.
    #[must_use]
    pub fn get(&self, id: i64) -> AsyncResult<Comment> {
        self.client
            .execute(id_route(comment::GET_COMMENT, id), None, |client, response| {
                build_comment(client, &data_object(response)?)
            })
    }

    /// Fetch a comment with its replies.
    #[must_use]
    pub fn with_replies(&self, id: i64) -> AsyncResult<Comment> {
        self.client
            .execute(id_route(comment::GET_REPLIES, id), None, |client, response| {
                build_comment(client, &data_object(response)?)
            })
    }

    /// Post a comment or a reply; resolves to the new comment's id.
    #[must_use]
    pub fn post(&self, information: &CommentInformation) -> AsyncResult<i64> {
        let route = information.validate().and_then(|()| match information.parent_id() {
            Some(parent_id) => id_route(comment::REPLY, parent_id),
            None => comment::POST_COMMENT.compile(&[]),
        });
        self.client
            .execute(route, information.to_payload(), |_, response| {
                data_object(response)?.get_i64("id")
            })
    }

    /// Reply to comment `parent_id` on post `image_id`.
    #[must_use]
    pub fn reply(&self, image_id: &str, parent_id: i64, text: &str) -> AsyncResult<i64> {
        self.post(&CommentInformation::new(image_id, text).reply_to(parent_id))
    }

    /// Delete a comment.
    #[must_use]
    pub fn delete(&self, id: i64) -> AsyncResult<bool> {
        self.client
            .execute(id_route(comment::DELETE_COMMENT, id), None, |_, response| {
                data_bool(response)
            })
    }

    /// Vote on a comment.
    #[must_use]
    pub fn vote(&self, id: i64, vote: Vote) -> AsyncResult<bool> {
        let route = check::positive(id, "id")
            .and_then(|()| check::check(!vote.is_unknown(), "vote", "may not be unknown"))
            .and_then(|()| comment::VOTE.compile(&[&id.to_string(), vote.key()]));
        self.client
            .execute(route, None, |_, response| data_bool(response))
    }

    /// Report a comment, optionally giving a reason.
    #[must_use]
    pub fn report(&self, id: i64, reason: Option<ReportReason>) -> AsyncResult<bool> {
        let route = check_reason(reason).and_then(|()| id_route(comment::REPORT, id));
        self.client
            .execute(route, reason_payload(reason), |_, response| data_bool(response))
    }
}
