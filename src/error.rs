use std::fmt::{Debug, Display};
use std::io::Error as IoError;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use derivative::Derivative;
use mongodb::error::Error as DatabaseError;
use serde::{Serialize, Serializer};
use serde_json::Error as JsonError;

use crate::cache::CacheError;
use crate::campaign::CampaignId;

/// The broad category of a failure, which decides how it is surfaced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    ValidationFailed,
    BusinessRuleViolation,
    RecoveryFailed,
    PersistenceFailed,
    Unavailable,
}

#[derive(Debug, Serialize, Derivative)]
#[derivative(PartialEq, Eq)]
#[serde(untagged)]
pub enum Error {
    // 400
    #[serde(serialize_with = "display")]
    InvalidJson(#[derivative(PartialEq = "ignore")] JsonPayloadError),
    #[serde(serialize_with = "display")]
    InvalidPath(#[derivative(PartialEq = "ignore")] PathError),
    #[serde(serialize_with = "display")]
    InvalidQuery(#[derivative(PartialEq = "ignore")] QueryPayloadError),
    InvalidIssueAmount {
        issue_amount: i64,
    },
    InvalidIssuanceWindow {
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    InvalidRequesterId,
    IssuanceNotStarted {
        campaign_id: CampaignId,
        issued_at: DateTime<Utc>,
    },
    IssuanceExpired {
        campaign_id: CampaignId,
        expires_at: DateTime<Utc>,
    },
    DuplicateRequester {
        campaign_id: CampaignId,
        requester_id: String,
    },
    AllIssued {
        campaign_id: CampaignId,
    },

    // 404
    PathDoesNotExist,
    CampaignDoesNotExist {
        campaign_id: CampaignId,
    },
    CampaignDataNotFound {
        campaign_id: CampaignId,
    },

    // 500
    CampaignDataMalformed {
        campaign_id: CampaignId,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: JsonError,
    },
    CampaignSaveFailed {
        campaign_id: CampaignId,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: Box<Error>,
    },
    CacheWriteFailed {
        key: String,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: CacheError,
    },
    IssuanceRecordFailed {
        campaign_id: CampaignId,
        requester_id: String,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: Box<Error>,
    },
    DataRecoveryFailed {
        campaign_id: CampaignId,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: Box<Error>,
    },
    CacheDataRecoveryFailed {
        key: String,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: CacheError,
    },
    AmountRecoveryFailed {
        campaign_id: CampaignId,
        requester_id: String,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: CacheError,
    },
    DedupeRecoveryFailed {
        campaign_id: CampaignId,
        requester_id: String,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: CacheError,
    },
    #[serde(serialize_with = "display")]
    FailedDatabaseCall(#[derivative(PartialEq = "ignore")] DatabaseError),
    #[serde(serialize_with = "display")]
    FailedToSerializeToJson(#[derivative(PartialEq = "ignore")] JsonError),
    #[serde(serialize_with = "display")]
    IoError(#[derivative(PartialEq = "ignore")] IoError),

    // 503
    CacheUnavailable {
        key: String,
        #[serde(serialize_with = "display")]
        #[derivative(PartialEq = "ignore")]
        cause: CacheError,
    },
    #[serde(serialize_with = "display")]
    CacheConnectionFailed(#[derivative(PartialEq = "ignore")] CacheError),

    // 504
    DeadlineExceeded,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidJson(_) => ErrorKind::InvalidRequest,
            Error::InvalidPath(_) => ErrorKind::InvalidRequest,
            Error::InvalidQuery(_) => ErrorKind::InvalidRequest,
            Error::InvalidIssueAmount { .. } => ErrorKind::InvalidRequest,
            Error::InvalidIssuanceWindow { .. } => ErrorKind::InvalidRequest,
            Error::InvalidRequesterId => ErrorKind::InvalidRequest,
            Error::IssuanceNotStarted { .. } => ErrorKind::BusinessRuleViolation,
            Error::IssuanceExpired { .. } => ErrorKind::BusinessRuleViolation,
            Error::DuplicateRequester { .. } => ErrorKind::BusinessRuleViolation,
            Error::AllIssued { .. } => ErrorKind::BusinessRuleViolation,
            Error::PathDoesNotExist => ErrorKind::NotFound,
            Error::CampaignDoesNotExist { .. } => ErrorKind::NotFound,
            Error::CampaignDataNotFound { .. } => ErrorKind::NotFound,
            Error::CampaignDataMalformed { .. } => ErrorKind::ValidationFailed,
            Error::CampaignSaveFailed { .. } => ErrorKind::PersistenceFailed,
            Error::CacheWriteFailed { .. } => ErrorKind::PersistenceFailed,
            Error::IssuanceRecordFailed { .. } => ErrorKind::PersistenceFailed,
            Error::DataRecoveryFailed { .. } => ErrorKind::RecoveryFailed,
            Error::CacheDataRecoveryFailed { .. } => ErrorKind::RecoveryFailed,
            Error::AmountRecoveryFailed { .. } => ErrorKind::RecoveryFailed,
            Error::DedupeRecoveryFailed { .. } => ErrorKind::RecoveryFailed,
            Error::FailedDatabaseCall(_) => ErrorKind::PersistenceFailed,
            Error::FailedToSerializeToJson(_) => ErrorKind::PersistenceFailed,
            Error::IoError(_) => ErrorKind::PersistenceFailed,
            Error::CacheUnavailable { .. } => ErrorKind::Unavailable,
            Error::CacheConnectionFailed(_) => ErrorKind::Unavailable,
            Error::DeadlineExceeded => ErrorKind::Unavailable,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "E4001000",
            Error::InvalidPath(_) => "E4001001",
            Error::InvalidQuery(_) => "E4001003",
            Error::InvalidIssueAmount { .. } => "E4001004",
            Error::InvalidIssuanceWindow { .. } => "E4001005",
            Error::InvalidRequesterId => "E4001006",
            Error::IssuanceNotStarted { .. } => "E4002000",
            Error::IssuanceExpired { .. } => "E4002001",
            Error::DuplicateRequester { .. } => "E4002002",
            Error::AllIssued { .. } => "E4002003",
            Error::PathDoesNotExist => "E4041000",
            Error::CampaignDoesNotExist { .. } => "E4041001",
            Error::CampaignDataNotFound { .. } => "E4041002",
            Error::CampaignDataMalformed { .. } => "E5001000",
            Error::CampaignSaveFailed { .. } => "E5001001",
            Error::CacheWriteFailed { .. } => "E5001002",
            Error::IssuanceRecordFailed { .. } => "E5001003",
            Error::DataRecoveryFailed { .. } => "E5002000",
            Error::CacheDataRecoveryFailed { .. } => "E5002001",
            Error::AmountRecoveryFailed { .. } => "E5002002",
            Error::DedupeRecoveryFailed { .. } => "E5002003",
            Error::FailedDatabaseCall(_) => "E5003000",
            Error::FailedToSerializeToJson(_) => "E5003001",
            Error::IoError(_) => "E5003002",
            Error::CacheUnavailable { .. } => "E5031000",
            Error::CacheConnectionFailed(_) => "E5031001",
            Error::DeadlineExceeded => "E5041000",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "The given json could not be parsed",
            Error::InvalidPath(_) => "The given path could not be parsed",
            Error::InvalidQuery(_) => "The given query could not be parsed",
            Error::InvalidIssueAmount { .. } => "The issue amount must not be negative",
            Error::InvalidIssuanceWindow { .. } => {
                "The issuance window must not end before it starts"
            }
            Error::InvalidRequesterId => "The requester id must not be empty",
            Error::IssuanceNotStarted { .. } => "Coupon issuance has not started yet",
            Error::IssuanceExpired { .. } => "The coupon issuance period has expired",
            Error::DuplicateRequester { .. } => "A coupon was already issued to this requester",
            Error::AllIssued { .. } => "All coupons have been issued",
            Error::PathDoesNotExist => "The requested path was not found",
            Error::CampaignDoesNotExist { .. } => "The requested campaign was not found",
            Error::CampaignDataNotFound { .. } => {
                "The requested campaign is not available for issuance"
            }
            Error::CampaignDataMalformed { .. } => "The cached campaign data could not be read",
            Error::CampaignSaveFailed { .. } => "The campaign could not be saved",
            Error::CacheWriteFailed { .. } => "The campaign could not be written to the cache",
            Error::IssuanceRecordFailed { .. } => "The issued coupon could not be recorded",
            Error::DataRecoveryFailed { .. } => {
                "The saved campaign could not be removed after a failure"
            }
            Error::CacheDataRecoveryFailed { .. } => {
                "The cached campaign data could not be removed after a failure"
            }
            Error::AmountRecoveryFailed { .. } => {
                "The remaining coupon amount could not be restored after a failure"
            }
            Error::DedupeRecoveryFailed { .. } => {
                "The requester could not be released after a failure"
            }
            Error::FailedDatabaseCall(_) => {
                "An error occurred when communicating with the database"
            }
            Error::FailedToSerializeToJson(_) => {
                "An error occurred when serializing an object to json"
            }
            Error::IoError(_) => "An error occurred during an I/O operation",
            Error::CacheUnavailable { .. } => {
                "An error occurred when communicating with the cache"
            }
            Error::CacheConnectionFailed(_) => "The cache could not be connected to",
            Error::DeadlineExceeded => "The request did not complete in time",
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::BusinessRuleViolation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ValidationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::RecoveryFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::PersistenceFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unavailable => match self {
                Error::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        #[derive(Serialize)]
        struct Dummy<'a> {
            error_code: &'static str,
            error_kind: ErrorKind,
            error_message: &'static str,
            error_meta: &'a Error,
        }

        HttpResponse::build(self.status_code()).json(&Dummy {
            error_code: self.error_code(),
            error_kind: self.kind(),
            error_message: self.error_message(),
            error_meta: self,
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Debug::fmt(self, f)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Error {
        Error::FailedDatabaseCall(error)
    }
}

impl From<JsonError> for Error {
    fn from(error: JsonError) -> Error {
        Error::FailedToSerializeToJson(error)
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidJson(err) => Some(err),
            Error::InvalidPath(err) => Some(err),
            Error::InvalidQuery(err) => Some(err),
            Error::CampaignDataMalformed { cause, .. } => Some(cause),
            Error::CampaignSaveFailed { cause, .. } => Some(cause.as_ref()),
            Error::CacheWriteFailed { cause, .. } => Some(cause),
            Error::IssuanceRecordFailed { cause, .. } => Some(cause.as_ref()),
            Error::DataRecoveryFailed { cause, .. } => Some(cause.as_ref()),
            Error::CacheDataRecoveryFailed { cause, .. } => Some(cause),
            Error::AmountRecoveryFailed { cause, .. } => Some(cause),
            Error::DedupeRecoveryFailed { cause, .. } => Some(cause),
            Error::FailedDatabaseCall(err) => Some(err),
            Error::FailedToSerializeToJson(err) => Some(err),
            Error::IoError(err) => Some(err),
            Error::CacheUnavailable { cause, .. } => Some(cause),
            Error::CacheConnectionFailed(err) => Some(err),
            _ => None,
        }
    }
}

fn display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn business_rule_violations_are_client_errors() {
        let campaign_id = CampaignId::new();
        let errors = vec![
            Error::IssuanceNotStarted {
                campaign_id,
                issued_at: Utc::now(),
            },
            Error::IssuanceExpired {
                campaign_id,
                expires_at: Utc::now(),
            },
            Error::DuplicateRequester {
                campaign_id,
                requester_id: "alice".into(),
            },
            Error::AllIssued { campaign_id },
        ];

        for error in errors {
            assert_eq!(error.kind(), ErrorKind::BusinessRuleViolation);
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn recovery_failures_are_internal_and_keep_their_cause() {
        let error = Error::AmountRecoveryFailed {
            campaign_id: CampaignId::new(),
            requester_id: "alice".into(),
            cause: CacheError::Unavailable("connection reset".into()),
        };

        assert_eq!(error.kind(), ErrorKind::RecoveryFailed);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error
            .source()
            .unwrap()
            .to_string()
            .contains("connection reset"));
    }

    #[test]
    fn equality_ignores_causes() {
        let campaign_id = CampaignId::new();
        let a = Error::CacheWriteFailed {
            key: "campaign:x:data".into(),
            cause: CacheError::Unavailable("one".into()),
        };
        let b = Error::CacheWriteFailed {
            key: "campaign:x:data".into(),
            cause: CacheError::Unavailable("two".into()),
        };

        assert_eq!(a, b);
        assert_ne!(a, Error::AllIssued { campaign_id });
    }

    #[test]
    fn not_found_and_timeouts_map_to_their_statuses() {
        let campaign_id = CampaignId::new();

        assert_eq!(
            Error::CampaignDataNotFound { campaign_id }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::DeadlineExceeded.status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            Error::CacheUnavailable {
                key: "k".into(),
                cause: CacheError::Unavailable("down".into()),
            }
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
