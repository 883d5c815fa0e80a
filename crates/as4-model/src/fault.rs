//! ebMS3 protocol faults.
//!
//! An [`EbmsFault`] describes why an inbound message is rejected. The
//! transport layer turns it into an outbound error signal; nothing here
//! produces wire bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Failure,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Content,
    Communication,
    Unpacking,
    Processing,
}

/// The ebMS3 core and AS4 error catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EbmsErrorCode {
    ValueNotRecognized,
    FeatureNotSupported,
    ValueInconsistent,
    Other,
    ConnectionFailure,
    EmptyMessagePartitionChannel,
    MimeInconsistency,
    FeatureNotSupportedInconsistent,
    InvalidHeader,
    ProcessingModeMismatch,
    ExternalPayloadError,
    FailedAuthentication,
    FailedDecryption,
    PolicyNoncompliance,
    DysfunctionalReliability,
    DeliveryFailure,
    MissingReceipt,
    InvalidReceipt,
    DecompressionFailure,
}

impl EbmsErrorCode {
    /// The `EBMS:nnnn` code put on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Self::ValueNotRecognized => "EBMS:0001",
            Self::FeatureNotSupported => "EBMS:0002",
            Self::ValueInconsistent => "EBMS:0003",
            Self::Other => "EBMS:0004",
            Self::ConnectionFailure => "EBMS:0005",
            Self::EmptyMessagePartitionChannel => "EBMS:0006",
            Self::MimeInconsistency => "EBMS:0007",
            Self::FeatureNotSupportedInconsistent => "EBMS:0008",
            Self::InvalidHeader => "EBMS:0009",
            Self::ProcessingModeMismatch => "EBMS:0010",
            Self::ExternalPayloadError => "EBMS:0011",
            Self::FailedAuthentication => "EBMS:0101",
            Self::FailedDecryption => "EBMS:0102",
            Self::PolicyNoncompliance => "EBMS:0103",
            Self::DysfunctionalReliability => "EBMS:0201",
            Self::DeliveryFailure => "EBMS:0202",
            Self::MissingReceipt => "EBMS:0301",
            Self::InvalidReceipt => "EBMS:0302",
            Self::DecompressionFailure => "EBMS:0303",
        }
    }

    pub fn short_description(self) -> &'static str {
        match self {
            Self::ValueNotRecognized => "ValueNotRecognized",
            Self::FeatureNotSupported => "FeatureNotSupported",
            Self::ValueInconsistent => "ValueInconsistent",
            Self::Other => "Other",
            Self::ConnectionFailure => "ConnectionFailure",
            Self::EmptyMessagePartitionChannel => "EmptyMessagePartitionChannel",
            Self::MimeInconsistency => "MimeInconsistency",
            Self::FeatureNotSupportedInconsistent => "FeatureNotSupported",
            Self::InvalidHeader => "InvalidHeader",
            Self::ProcessingModeMismatch => "ProcessingModeMismatch",
            Self::ExternalPayloadError => "ExternalPayloadError",
            Self::FailedAuthentication => "FailedAuthentication",
            Self::FailedDecryption => "FailedDecryption",
            Self::PolicyNoncompliance => "PolicyNoncompliance",
            Self::DysfunctionalReliability => "DysfunctionalReliability",
            Self::DeliveryFailure => "DeliveryFailure",
            Self::MissingReceipt => "MissingReceipt",
            Self::InvalidReceipt => "InvalidReceipt",
            Self::DecompressionFailure => "DecompressionFailure",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::FeatureNotSupported
            | Self::EmptyMessagePartitionChannel
            | Self::FeatureNotSupportedInconsistent => Severity::Warning,
            _ => Severity::Failure,
        }
    }

    pub fn category(self) -> Category {
        match self {
            Self::ValueNotRecognized
            | Self::FeatureNotSupported
            | Self::ValueInconsistent
            | Self::Other
            | Self::FeatureNotSupportedInconsistent
            | Self::ProcessingModeMismatch
            | Self::ExternalPayloadError => Category::Content,
            Self::ConnectionFailure
            | Self::EmptyMessagePartitionChannel
            | Self::DeliveryFailure => {
                Category::Communication
            }
            Self::MimeInconsistency
            | Self::InvalidHeader
            | Self::DecompressionFailure => Category::Unpacking,
            Self::FailedAuthentication
            | Self::FailedDecryption
            | Self::PolicyNoncompliance
            | Self::DysfunctionalReliability
            | Self::MissingReceipt
            | Self::InvalidReceipt => Category::Processing,
        }
    }
}

impl fmt::Display for EbmsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.short_description())
    }
}

/// A rejected inbound message, ready for the transport layer to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbmsFault {
    pub code: EbmsErrorCode,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_to_message_id: Option<String>,
}

impl EbmsFault {
    pub fn new(code: EbmsErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            detail: None,
            ref_to_message_id: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn referencing(mut self, message_id: impl Into<String>) -> Self {
        self.ref_to_message_id = Some(message_id.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for EbmsFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)?;
        if let Some(detail) = &self.detail {
            write!(f, " [{detail}]")?;
        }
        if let Some(ref_id) = &self.ref_to_message_id {
            write!(f, " (ref {ref_id})")?;
        }
        Ok(())
    }
}

impl std::error::Error for EbmsFault {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_classification() {
        assert_eq!(EbmsErrorCode::ProcessingModeMismatch.code(), "EBMS:0010");
        assert_eq!(EbmsErrorCode::ProcessingModeMismatch.category(), Category::Content);
        assert_eq!(EbmsErrorCode::EmptyMessagePartitionChannel.severity(), Severity::Warning);
        assert_eq!(EbmsErrorCode::FailedDecryption.category(), Category::Processing);
    }

    #[test]
    fn test_fault_display_includes_detail_and_ref() {
        let fault = EbmsFault::new(EbmsErrorCode::InvalidHeader, "bad header")
            .with_detail("service missing")
            .referencing("msg-1");
        let text = fault.to_string();
        assert!(text.starts_with("EBMS:0009 (InvalidHeader): bad header"));
        assert!(text.contains("service missing"));
        assert!(text.contains("ref msg-1"));
    }
}
