use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::{CompanyId, PaymentOrderId};

/// A generated payment file attached to its order. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub company_id: CompanyId,
    pub order_id: PaymentOrderId,
    /// File name, e.g. "PAY0001.xml".
    pub filename: String,
    pub mimetype: String,
    pub created_at: NaiveDateTime,
    content: Vec<u8>,
    checksum: String,
}

impl Attachment {
    pub(crate) fn xml(
        company_id: CompanyId,
        order_id: PaymentOrderId,
        filename: String,
        content: Vec<u8>,
        created_at: NaiveDateTime,
    ) -> Self {
        let checksum = hex::encode(Sha256::digest(&content));
        Self {
            company_id,
            order_id,
            filename,
            mimetype: "text/xml".to_string(),
            created_at,
            content,
            checksum,
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content as UTF-8 text, if it is.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Hex SHA-256 of the content.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn checksum_is_sha256_of_content() {
        let at = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let att = Attachment::xml(
            CompanyId(1),
            PaymentOrderId(1),
            "PAY0001.xml".into(),
            b"abc".to_vec(),
            at,
        );
        assert_eq!(
            att.checksum(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(att.as_str(), Some("abc"));
        assert_eq!(att.len(), 3);
        assert_eq!(att.mimetype, "text/xml");
    }
}
