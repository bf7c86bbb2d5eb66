use std::sync::Arc;
use tracing::{info, warn};
use crate::controller::session_controller::SessionStore;
use crate::error::{ClientError, Result};
use crate::models::rating::{NewReview, Review, ReviewTarget};
use crate::repositories::backend_repo::BackendRepo;

/// Reviews shown for one restaurant or dish, newest first, with the backend's aggregate.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewBoard {
    pub target: ReviewTarget,
    pub target_id: String,
    pub reviews: Vec<Review>,
    pub current_rating: Option<f64>,
}

impl ReviewBoard {
    pub fn empty(target: ReviewTarget, target_id: &str) -> Self {
        Self {
            target,
            target_id: target_id.to_string(),
            reviews: Vec::new(),
            current_rating: None,
        }
    }

    /// Only the author gets a delete affordance.
    pub fn can_delete(&self, review: &Review, viewer_id: Option<&str>) -> bool {
        viewer_id.map_or(false, |id| review.is_owned_by(id))
    }
}

pub struct UserReviewController {
    backend: Arc<BackendRepo>,
    session: SessionStore,
}

impl UserReviewController {
    pub fn new(backend: Arc<BackendRepo>, session: SessionStore) -> Self {
        Self { backend, session }
    }

    pub async fn load(&self, target: ReviewTarget, target_id: &str) -> Result<ReviewBoard> {
        let listing = self.backend.reviews(target, target_id).await?;
        Ok(ReviewBoard {
            target,
            target_id: target_id.to_string(),
            reviews: listing.reviews,
            current_rating: listing.current_rating,
        })
    }

    pub fn can_delete(&self, board: &ReviewBoard, review: &Review) -> bool {
        let viewer = self.session.user();
        board.can_delete(review, viewer.as_ref().map(|u| u.id.as_str()))
    }

    /// Validated locally first; nothing is sent for a missing or out of range rating.
    pub async fn submit(&self, board: &mut ReviewBoard, rating: u8, comment: &str) -> Result<Review> {
        let new_review = NewReview {
            target_id: board.target_id.clone(),
            target_type: board.target,
            rating,
            comment: comment.trim().to_string(),
        };
        new_review.validate()?;
        self.session.require_user()?;

        let res = self.backend.create_review(&new_review).await;
        let created = self.session.observe(res).map_err(|e| {
            warn!("Something went wrong adding review for {} due to: {}", board.target_id, e);
            e
        })?;

        board.reviews.insert(0, created.review.clone());
        board.current_rating = Some(created.current_rating);
        info!(
            "Review added for {}, rating now {:.1}",
            board.target_id, created.current_rating
        );
        Ok(created.review)
    }

    pub async fn delete(&self, board: &mut ReviewBoard, review_id: &str) -> Result<()> {
        let user = self.session.require_user()?;
        let review = board
            .reviews
            .iter()
            .find(|r| r.id == review_id)
            .ok_or_else(|| ClientError::validation("Review not found"))?;
        if !review.is_owned_by(&user.id) {
            return Err(ClientError::Forbidden(
                "You can only delete your own reviews".to_string(),
            ));
        }

        let res = self.backend.delete_review(review_id).await;
        let deleted = self.session.observe(res).map_err(|e| {
            warn!("Something went wrong removing review due to: {}", e);
            e
        })?;

        board.reviews.retain(|r| r.id != review_id);
        board.current_rating = Some(deleted.current_rating);
        Ok(())
    }
}
