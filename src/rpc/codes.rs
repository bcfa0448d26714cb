//! Normalization of backend error codes.
//!
//! The backend reports failures as numeric codes with terse operator-facing
//! messages. This module maps them onto a structured taxonomy the rest of
//! the core consumes: retryable transport-class failures, the single
//! idempotent-conflict code, and terminal business errors with displayable
//! titles and hints. Codes missing from the table degrade to the backend's
//! own message under a generic title.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::envelope::RawRpcError;

/// The one code meaning "a request with this idempotency token is already
/// being processed". The idempotency manager keys its retain-token decision
/// off this code alone.
pub const IDEMPOTENCY_CONFLICT_CODE: i64 = 6001;

/// Transport-class codes the backend relays from its own upstreams.
const RETRYABLE_CODES: [i64; 3] = [502, 503, 504];

/// Normalized view of a backend error. Read-only; derived from the static
/// code table, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub code: i64,
    /// Short display title.
    pub title: String,
    /// Longer message suitable for direct display to the operator.
    pub user_message: String,
    /// Actionable follow-up suggestion.
    pub hint: String,
    pub is_retryable: bool,
    pub is_idempotent_conflict: bool,
}

struct CodeEntry {
    title: &'static str,
    message: &'static str,
    hint: &'static str,
}

static CODE_TABLE: Lazy<HashMap<i64, CodeEntry>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        1001,
        CodeEntry {
            title: "Signature rejected",
            message: "The backend could not verify the request signature.",
            hint: "Check that the saved signing key matches the thumbprint registered with the backend.",
        },
    );
    table.insert(
        1002,
        CodeEntry {
            title: "Unknown signing system",
            message: "The configured signing system id is not registered with the backend.",
            hint: "Verify the signing system id in the environment's key configuration.",
        },
    );
    table.insert(
        2001,
        CodeEntry {
            title: "Beneficiary not found",
            message: "The referenced beneficiary does not exist on the backend.",
            hint: "Refresh the beneficiary list; the record may have been removed.",
        },
    );
    table.insert(
        2002,
        CodeEntry {
            title: "Account not found",
            message: "The referenced virtual account does not exist on the backend.",
            hint: "Refresh the account list; the account may have been closed.",
        },
    );
    table.insert(
        2003,
        CodeEntry {
            title: "Insufficient funds",
            message: "The source account balance does not cover the requested amount.",
            hint: "Check the account balance and retry with a lower amount.",
        },
    );
    table.insert(
        2004,
        CodeEntry {
            title: "Duplicate beneficiary",
            message: "A beneficiary with the same identifying details already exists.",
            hint: "Search the existing beneficiaries before creating a new one.",
        },
    );
    table.insert(
        2005,
        CodeEntry {
            title: "Deal not found",
            message: "The referenced deal does not exist on the backend.",
            hint: "Refresh the deal list; the deal may have matured or been cancelled.",
        },
    );
    table.insert(
        3001,
        CodeEntry {
            title: "Payment rejected",
            message: "The payment was rejected by the backend's compliance checks.",
            hint: "Review the payment details; contact backend support for the rejection reason.",
        },
    );
    table.insert(
        4001,
        CodeEntry {
            title: "Rate limit exceeded",
            message: "The backend refused to serve this read again so soon.",
            hint: "Wait for the advertised interval before requesting the same data.",
        },
    );
    table.insert(
        502,
        CodeEntry {
            title: "Upstream unavailable",
            message: "The backend's upstream system returned an invalid response.",
            hint: "Retry shortly; the condition is usually transient.",
        },
    );
    table.insert(
        503,
        CodeEntry {
            title: "Backend unavailable",
            message: "The backend is temporarily unable to process requests.",
            hint: "Retry shortly; the condition is usually transient.",
        },
    );
    table.insert(
        504,
        CodeEntry {
            title: "Backend timeout",
            message: "The backend timed out waiting on its upstream system.",
            hint: "Retry shortly; the condition is usually transient.",
        },
    );
    table.insert(
        IDEMPOTENCY_CONFLICT_CODE,
        CodeEntry {
            title: "Request already processing",
            message: "A request with this idempotency token is already being processed.",
            hint: "Do not resubmit; the original request will complete or fail on its own.",
        },
    );
    table
});

/// Map a raw backend error onto the structured taxonomy.
pub fn normalize(raw: &RawRpcError) -> ErrorDescriptor {
    let is_retryable = RETRYABLE_CODES.contains(&raw.code);
    let is_idempotent_conflict = raw.code == IDEMPOTENCY_CONFLICT_CODE;

    match CODE_TABLE.get(&raw.code) {
        Some(entry) => ErrorDescriptor {
            code: raw.code,
            title: entry.title.to_string(),
            user_message: entry.message.to_string(),
            hint: entry.hint.to_string(),
            is_retryable,
            is_idempotent_conflict,
        },
        None => ErrorDescriptor {
            code: raw.code,
            title: "Backend error".to_string(),
            user_message: raw.message.clone(),
            hint: "Retry later or contact support if the problem persists.".to_string(),
            is_retryable,
            is_idempotent_conflict,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(code: i64) -> RawRpcError {
        RawRpcError { code, message: format!("backend message {}", code), data: None }
    }

    #[test]
    fn test_known_code_uses_table_text() {
        let descriptor = normalize(&raw(2003));
        assert_eq!(descriptor.title, "Insufficient funds");
        assert!(!descriptor.is_retryable);
        assert!(!descriptor.is_idempotent_conflict);
        assert!(!descriptor.hint.is_empty());
    }

    #[test]
    fn test_unknown_code_falls_back_to_backend_message() {
        let descriptor = normalize(&raw(9942));
        assert_eq!(descriptor.title, "Backend error");
        assert_eq!(descriptor.user_message, "backend message 9942");
        assert!(!descriptor.is_retryable);
    }

    #[test]
    fn test_transport_class_codes_are_retryable() {
        for code in [502, 503, 504] {
            let descriptor = normalize(&raw(code));
            assert!(descriptor.is_retryable, "code {} should be retryable", code);
            assert!(!descriptor.is_idempotent_conflict);
        }
    }

    #[test]
    fn test_exactly_one_conflict_code() {
        assert!(normalize(&raw(IDEMPOTENCY_CONFLICT_CODE)).is_idempotent_conflict);
        for code in [502, 503, 504, 1001, 2003, 4001, 9942] {
            assert!(!normalize(&raw(code)).is_idempotent_conflict);
        }
    }

    #[test]
    fn test_conflict_code_is_not_marked_retryable() {
        // Retrying is exactly what the conflict response asks the caller to
        // defer; the idempotency manager handles the token side.
        let descriptor = normalize(&raw(IDEMPOTENCY_CONFLICT_CODE));
        assert!(!descriptor.is_retryable);
    }
}
