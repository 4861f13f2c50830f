//! JSON request bodies and their validation.
//!
//! Each body deserializes leniently and is then checked by an `into_*` or
//! `validate` method that returns Korean `400` messages.

use muhan_core::types::announcement::MAX_TITLE_CHARS;
use muhan_core::types::review::{MAX_REVIEW_IMAGES, normalize_content, normalize_tags};
use muhan_core::{
    ContactCategory, ContactStatus, Email, ReviewRating, ReviewValidationError, StoreId,
    SubRatings, UserId,
};
use serde::Deserialize;
use url::Url;

use crate::db::announcements::AnnouncementInput;
use crate::db::contacts::NewContact;
use crate::db::reviews::ReviewInput;
use crate::error::AppError;

const NICKNAME_CHARS: std::ops::RangeInclusive<usize> = 2..=20;
const MAX_NAME_CHARS: usize = 50;
const MAX_MESSAGE_CHARS: usize = 5000;
const MAX_REASON_CHARS: usize = 500;

/// Trimmed, non-empty text of at most `max` characters.
fn required_text(value: &str, field: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field}을(를) 입력해주세요.")));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field}은(는) {max}자 이하로 입력해주세요."
        )));
    }
    Ok(value.to_owned())
}

fn review_error(err: &ReviewValidationError) -> AppError {
    let message = match err {
        ReviewValidationError::RatingOutOfRange(_) => "평점은 1에서 5 사이의 정수여야 합니다.",
        ReviewValidationError::ContentTooLong => "리뷰 내용이 너무 깁니다.",
        ReviewValidationError::TooManyTags => "태그가 너무 많습니다.",
        ReviewValidationError::InvalidTag => "태그는 1~20자로 입력해주세요.",
        ReviewValidationError::TooManyImages => "이미지는 최대 5장까지 첨부할 수 있습니다.",
    };
    AppError::BadRequest(message.to_owned())
}

/// `POST /api/reviews` and `PUT /api/reviews/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    /// Required on create; ignored on update.
    pub store_id: Option<StoreId>,
    pub rating: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sub_ratings: SubRatings,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ReviewBody {
    /// Validate into repository input.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an out-of-range rating, over-long content,
    /// bad tags, or more than five images / non-HTTP image URLs.
    pub fn into_input(self) -> Result<ReviewInput, AppError> {
        let rating = ReviewRating::new(self.rating).map_err(|e| review_error(&e))?;
        let content = normalize_content(self.content.as_deref().unwrap_or_default())
            .map_err(|e| review_error(&e))?;
        let tags = normalize_tags(&self.tags).map_err(|e| review_error(&e))?;

        if self.images.len() > MAX_REVIEW_IMAGES {
            return Err(review_error(&ReviewValidationError::TooManyImages));
        }
        let images_ok = self.images.iter().all(|raw| {
            Url::parse(raw).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
        });
        if !images_ok {
            return Err(AppError::BadRequest("이미지 주소가 올바르지 않습니다.".to_owned()));
        }

        Ok(ReviewInput {
            rating,
            content,
            images: self.images,
            sub_ratings: self.sub_ratings,
            tags,
        })
    }
}

/// `POST /api/reviews/{id}/report`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportBody {
    pub reason: String,
}

impl ReportBody {
    /// # Errors
    ///
    /// Returns `BadRequest` for an empty or over-long reason.
    pub fn validate(&self) -> Result<String, AppError> {
        required_text(&self.reason, "신고 사유", MAX_REASON_CHARS)
    }
}

/// `POST /api/favorites`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteBody {
    pub store_id: StoreId,
}

/// `PATCH /api/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct NicknameBody {
    pub nickname: String,
}

impl NicknameBody {
    /// # Errors
    ///
    /// Returns `BadRequest` unless the trimmed nickname is 2 to 20 characters.
    pub fn validate(&self) -> Result<String, AppError> {
        let nickname = self.nickname.trim();
        if !NICKNAME_CHARS.contains(&nickname.chars().count()) {
            return Err(AppError::BadRequest("닉네임은 2~20자로 입력해주세요.".to_owned()));
        }
        Ok(nickname.to_owned())
    }
}

/// `POST /api/contact`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactBody {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub category: ContactCategory,
    pub title: String,
    pub message: String,
}

impl ContactBody {
    /// Validate into a new submission, attributed to `user_id` when signed in.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for missing fields or an invalid email address.
    pub fn into_new_contact(self, user_id: Option<UserId>) -> Result<NewContact, AppError> {
        let name = required_text(&self.name, "이름", MAX_NAME_CHARS)?;
        let email = Email::parse(&self.email)
            .map_err(|_| AppError::BadRequest("이메일 주소가 올바르지 않습니다.".to_owned()))?;
        let title = required_text(&self.title, "제목", MAX_TITLE_CHARS)?;
        let message = required_text(&self.message, "문의 내용", MAX_MESSAGE_CHARS)?;
        Ok(NewContact {
            user_id,
            name,
            email,
            category: self.category,
            title,
            message,
        })
    }
}

/// `PATCH /api/admin/contacts/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpdateBody {
    pub status: String,
    #[serde(default)]
    pub admin_note: Option<String>,
}

impl ContactUpdateBody {
    /// # Errors
    ///
    /// Returns `BadRequest` for an unknown status.
    pub fn status(&self) -> Result<ContactStatus, AppError> {
        self.status
            .parse()
            .map_err(|_| {
                AppError::BadRequest(format!("알 수 없는 문의 상태입니다: {}", self.status))
            })
    }
}

/// `POST /api/admin/announcements` and `PUT /api/admin/announcements/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementBody {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub is_published: bool,
}

impl AnnouncementBody {
    /// # Errors
    ///
    /// Returns `BadRequest` for an empty or over-long title, or empty content.
    pub fn into_input(self) -> Result<AnnouncementInput, AppError> {
        Ok(AnnouncementInput {
            title: required_text(&self.title, "제목", MAX_TITLE_CHARS)?,
            content: required_text(&self.content, "내용", MAX_MESSAGE_CHARS)?,
            is_important: self.is_important,
            is_published: self.is_published,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn review(value: serde_json::Value) -> ReviewBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_review_body_valid() {
        let input = review(json!({
            "storeId": 3,
            "rating": 4,
            "content": "  고기 질이 좋아요  ",
            "subRatings": {"taste": 5, "value": 4},
            "tags": ["가성비", "가성비", " "],
            "images": ["https://cdn.example.com/a.jpg"]
        }))
        .into_input()
        .unwrap();
        assert_eq!(input.rating.get(), 4);
        assert_eq!(input.content, "고기 질이 좋아요");
        assert_eq!(input.tags, vec!["가성비"]);
        assert_eq!(input.sub_ratings.taste.map(ReviewRating::get), Some(5));
        assert!(input.sub_ratings.service.is_none());
    }

    #[test]
    fn test_review_body_rejects_bad_rating() {
        let err = review(json!({"storeId": 1, "rating": 6})).into_input().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(review(json!({"storeId": 1, "rating": 0})).into_input().is_err());
    }

    #[test]
    fn test_review_body_rejects_bad_images() {
        let too_many = review(json!({
            "storeId": 1,
            "rating": 3,
            "images": vec!["https://x.test/a.png"; 6]
        }));
        assert!(too_many.into_input().is_err());

        let bad_scheme = review(json!({
            "storeId": 1,
            "rating": 3,
            "images": ["javascript:alert(1)"]
        }));
        assert!(bad_scheme.into_input().is_err());
    }

    #[test]
    fn test_sub_rating_out_of_range_fails_to_parse() {
        let parsed: Result<ReviewBody, _> =
            serde_json::from_value(json!({"storeId": 1, "rating": 3, "subRatings": {"taste": 9}}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_nickname_length() {
        let body = |n: &str| NicknameBody {
            nickname: n.to_owned(),
        };
        assert_eq!(body(" 무한 ").validate().unwrap(), "무한");
        assert!(body("무").validate().is_err());
        assert!(body(&"가".repeat(21)).validate().is_err());
        assert!(body(&"가".repeat(20)).validate().is_ok());
    }

    #[test]
    fn test_contact_body() {
        let body: ContactBody = serde_json::from_value(json!({
            "name": "홍길동",
            "email": "hong@example.com",
            "category": "store_info",
            "title": "영업시간 수정",
            "message": "일요일 휴무입니다."
        }))
        .unwrap();
        let contact = body.into_new_contact(None).unwrap();
        assert_eq!(contact.category, ContactCategory::StoreInfo);
        assert_eq!(contact.email.as_str(), "hong@example.com");

        let bad_email: ContactBody = serde_json::from_value(json!({
            "name": "홍길동", "email": "nope", "title": "t", "message": "m"
        }))
        .unwrap();
        assert!(bad_email.into_new_contact(None).is_err());

        let blank: ContactBody = serde_json::from_value(json!({
            "name": " ", "email": "a@b.co", "title": "t", "message": "m"
        }))
        .unwrap();
        assert!(blank.into_new_contact(None).is_err());
    }

    #[test]
    fn test_contact_update_status() {
        let body = ContactUpdateBody {
            status: "in_progress".to_owned(),
            admin_note: None,
        };
        assert_eq!(body.status().unwrap(), ContactStatus::InProgress);
        let bad = ContactUpdateBody {
            status: "done".to_owned(),
            admin_note: None,
        };
        assert!(matches!(bad.status(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_announcement_body_defaults() {
        let body: AnnouncementBody =
            serde_json::from_value(json!({"title": "휴무 안내", "content": "설 연휴"})).unwrap();
        let input = body.into_input().unwrap();
        assert!(!input.is_published);
        assert!(!input.is_important);

        let long: AnnouncementBody = serde_json::from_value(json!({
            "title": "a".repeat(MAX_TITLE_CHARS + 1),
            "content": "x"
        }))
        .unwrap();
        assert!(long.into_input().is_err());
    }
}
