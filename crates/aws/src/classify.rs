use std::error::Error;
use std::fmt::Debug;

use aws_sdk_s3::error::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use tag_inventory_storage::{
    ErrorKind, IdentityError, IndexError, NotifyError, ObjectStoreError, QueryError, SearchError,
};

/// An SDK failure reduced to what callers match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Failure {
    pub kind: ErrorKind,
    pub code: Option<String>,
    pub message: String,
}

pub(crate) fn classify<E, R>(err: &SdkError<E, R>) -> Failure
where
    E: ProvideErrorMetadata + Error + 'static,
    R: Debug,
{
    let code = err.code().map(str::to_string);
    let kind = match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::Timeout,
        _ => kind_for_code(code.as_deref()),
    };
    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        _ => format!("{}", DisplayErrorContext(err)),
    };
    Failure {
        kind,
        code,
        message,
    }
}

/// Error kind for a service error code. Codes differ between services for the
/// same condition, so each kind lists every spelling these backends meet.
/// Error types without an expired-credentials variant fold it into access
/// denied.
pub(crate) fn kind_for_code(code: Option<&str>) -> ErrorKind {
    match code {
        Some(
            "ThrottlingException" | "Throttling" | "ThrottledException"
            | "TooManyRequestsException" | "SlowDown" | "RequestLimitExceeded",
        ) => ErrorKind::Throttled,
        Some(
            "AccessDenied" | "AccessDeniedException" | "UnauthorizedException"
            | "AuthorizationError" | "InvalidClientTokenId",
        ) => ErrorKind::AccessDenied,
        Some("ExpiredToken" | "ExpiredTokenException") => ErrorKind::ExpiredCredentials,
        Some("ConflictException") => ErrorKind::Conflict,
        Some(
            "ResourceNotFoundException" | "NotFound" | "NotFoundException" | "NoSuchKey"
            | "NoSuchBucket",
        ) => ErrorKind::NotFound,
        Some(
            "ValidationException" | "InvalidRequestException" | "InvalidParameter"
            | "InvalidParameterException",
        ) => ErrorKind::Invalid,
        _ => ErrorKind::Other,
    }
}

impl Failure {
    pub fn into_search_error(self) -> SearchError {
        match self.kind {
            ErrorKind::Throttled => SearchError::Throttled(self.message),
            ErrorKind::Timeout => SearchError::Timeout(self.message),
            ErrorKind::AccessDenied | ErrorKind::ExpiredCredentials => {
                SearchError::AccessDenied(self.message)
            }
            ErrorKind::NotFound => SearchError::NotFound(self.message),
            ErrorKind::Invalid => SearchError::Validation(self.message),
            ErrorKind::Conflict | ErrorKind::Other => SearchError::Other(self.message),
        }
    }

    pub fn into_object_error(self, bucket: &str, key: &str) -> ObjectStoreError {
        match self.kind {
            ErrorKind::NotFound => ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            ErrorKind::AccessDenied | ErrorKind::ExpiredCredentials => ObjectStoreError::AccessDenied {
                bucket: bucket.to_string(),
                message: self.message,
            },
            ErrorKind::Throttled => ObjectStoreError::Throttled(self.message),
            ErrorKind::Timeout => ObjectStoreError::Timeout(self.message),
            _ => ObjectStoreError::Other(self.message),
        }
    }

    pub fn into_query_error(self) -> QueryError {
        match self.kind {
            ErrorKind::Throttled => QueryError::Throttled(self.message),
            ErrorKind::Timeout => QueryError::Timeout(self.message),
            ErrorKind::AccessDenied | ErrorKind::ExpiredCredentials => {
                QueryError::AccessDenied(self.message)
            }
            ErrorKind::NotFound => QueryError::NotFound(self.message),
            ErrorKind::Invalid => QueryError::InvalidRequest(self.message),
            ErrorKind::Conflict | ErrorKind::Other => QueryError::Other(self.message),
        }
    }

    pub fn into_identity_error(self, role_arn: &str) -> IdentityError {
        match self.kind {
            ErrorKind::ExpiredCredentials => IdentityError::ExpiredCredentials(self.message),
            ErrorKind::AccessDenied => IdentityError::AccessDenied {
                role_arn: role_arn.to_string(),
                message: self.message,
            },
            ErrorKind::Throttled => IdentityError::Throttled(self.message),
            _ => IdentityError::Other(self.message),
        }
    }

    pub fn into_notify_error(self) -> NotifyError {
        match self.kind {
            ErrorKind::NotFound => NotifyError::TopicNotFound(self.message),
            ErrorKind::AccessDenied | ErrorKind::ExpiredCredentials => {
                NotifyError::AccessDenied(self.message)
            }
            ErrorKind::Throttled => NotifyError::Throttled(self.message),
            _ => NotifyError::Other(self.message),
        }
    }

    pub fn into_index_error(self) -> IndexError {
        match self.kind {
            ErrorKind::Conflict => IndexError::Conflict(self.message),
            ErrorKind::NotFound => IndexError::NotFound(self.message),
            ErrorKind::AccessDenied | ErrorKind::ExpiredCredentials => {
                IndexError::AccessDenied(self.message)
            }
            ErrorKind::Throttled => IndexError::Throttled(self.message),
            ErrorKind::Timeout => IndexError::Timeout(self.message),
            ErrorKind::Invalid | ErrorKind::Other => IndexError::Other(self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(kind: ErrorKind, code: &str) -> Failure {
        Failure {
            kind,
            code: Some(code.to_string()),
            message: format!("{}: boom", code),
        }
    }

    #[test]
    fn service_codes_map_to_kinds() {
        assert_eq!(kind_for_code(Some("ThrottlingException")), ErrorKind::Throttled);
        assert_eq!(kind_for_code(Some("SlowDown")), ErrorKind::Throttled);
        assert_eq!(kind_for_code(Some("ConflictException")), ErrorKind::Conflict);
        assert_eq!(kind_for_code(Some("NoSuchKey")), ErrorKind::NotFound);
        assert_eq!(kind_for_code(Some("AccessDeniedException")), ErrorKind::AccessDenied);
        assert_eq!(kind_for_code(Some("ExpiredToken")), ErrorKind::ExpiredCredentials);
        assert_eq!(kind_for_code(Some("InternalServerException")), ErrorKind::Other);
        assert_eq!(kind_for_code(None), ErrorKind::Other);
    }

    #[test]
    fn throttled_search_stays_transient() {
        let err = failure(ErrorKind::Throttled, "ThrottlingException").into_search_error();
        assert!(err.is_transient());
    }

    #[test]
    fn expired_token_is_not_an_access_grant_problem() {
        let err = failure(ErrorKind::ExpiredCredentials, "ExpiredToken").into_identity_error("arn:role");
        assert!(matches!(err, IdentityError::ExpiredCredentials(_)));
        assert_eq!(err.kind(), ErrorKind::ExpiredCredentials);

        let err = failure(ErrorKind::AccessDenied, "AccessDenied").into_identity_error("arn:role");
        assert!(matches!(err, IdentityError::AccessDenied { ref role_arn, .. } if role_arn == "arn:role"));
    }

    #[test]
    fn missing_object_keeps_its_location() {
        let err = failure(ErrorKind::NotFound, "NoSuchKey").into_object_error("b", "k");
        assert_eq!(
            err,
            ObjectStoreError::NotFound {
                bucket: "b".into(),
                key: "k".into()
            }
        );
    }

    #[test]
    fn conflict_survives_for_index_calls() {
        let err = failure(ErrorKind::Conflict, "ConflictException").into_index_error();
        assert!(err.is_conflict());
    }
}
