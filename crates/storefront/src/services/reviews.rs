//! Product reviews kept on this profile.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use neemon_core::{ProductId, ReviewId, UserId};

use crate::store::{LocalStore, StoreError, StoredList, TabId, keys};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Please provide a rating and review text.")]
    Invalid,

    #[error("review not found")]
    NotFound,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// A review written by a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    /// 1 to 5 stars.
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

pub struct Reviews {
    store: Arc<dyn LocalStore>,
    tab: TabId,
}

impl Reviews {
    pub fn new(store: Arc<dyn LocalStore>, tab: TabId) -> Self {
        Self { store, tab }
    }

    fn all(&self) -> StoredList<Review> {
        StoredList::read(self.store.as_ref(), keys::REVIEWS)
    }

    fn save(&self, all: &StoredList<Review>) -> Result<(), ReviewError> {
        all.write(self.store.as_ref(), keys::REVIEWS, self.tab)?;
        Ok(())
    }

    /// Record a review.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Invalid`] unless `rating` is 1..=5 and `text`
    /// is non-blank.
    pub fn add(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        rating: u8,
        text: &str,
    ) -> Result<Review, ReviewError> {
        let text = text.trim();
        if !(1..=5).contains(&rating) || text.is_empty() {
            return Err(ReviewError::Invalid);
        }
        let review = Review {
            id: ReviewId::generate(),
            user_id: user_id.clone(),
            product_id: product_id.clone(),
            rating,
            text: text.to_owned(),
            created_at: Utc::now(),
        };
        let mut all = self.all();
        all.items.push(review.clone());
        self.save(&all)?;
        Ok(review)
    }

    /// Reviews written by `user_id`.
    #[must_use]
    pub fn mine(&self, user_id: &UserId) -> Vec<Review> {
        self.all()
            .items
            .into_iter()
            .filter(|r| &r.user_id == user_id)
            .collect()
    }

    /// Reviews of one product.
    #[must_use]
    pub fn for_product(&self, product_id: &ProductId) -> Vec<Review> {
        self.all()
            .items
            .into_iter()
            .filter(|r| &r.product_id == product_id)
            .collect()
    }

    /// Replace a review's text. Blank text keeps the old text.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] if the user has no such review.
    pub fn edit_text(
        &self,
        user_id: &UserId,
        id: &ReviewId,
        text: &str,
    ) -> Result<Review, ReviewError> {
        let mut all = self.all();
        let review = all
            .items
            .iter_mut()
            .find(|r| &r.id == id && &r.user_id == user_id)
            .ok_or(ReviewError::NotFound)?;
        let text = text.trim();
        if !text.is_empty() {
            review.text = text.to_owned();
        }
        let updated = review.clone();
        self.save(&all)?;
        Ok(updated)
    }

    /// Delete one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] if the user has no such review.
    pub fn delete(&self, user_id: &UserId, id: &ReviewId) -> Result<(), ReviewError> {
        let mut all = self.all();
        let before = all.items.len();
        all.items.retain(|r| !(&r.id == id && &r.user_id == user_id));
        if all.items.len() == before {
            return Err(ReviewError::NotFound);
        }
        self.save(&all)
    }
}
