//! Key encoding utilities for `RocksDB`.

use vouchr_core::{IssuanceId, ProductKey, RedemptionCode, RequestId, TransactionId, UserId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a stock key from a product key.
#[must_use]
pub fn stock_key(product_key: &ProductKey) -> Vec<u8> {
    product_key.to_string().into_bytes()
}

/// Create a code key.
#[must_use]
pub fn code_key(code: &RedemptionCode) -> Vec<u8> {
    code.as_bytes().to_vec()
}

/// Create an owner-code index key.
///
/// Format: `owner_id (16 bytes) || issuance_id (16 bytes) || code`
///
/// Issuance ids are ULIDs, so an owner's codes sort by purchase time.
#[must_use]
pub fn owner_code_key(owner_id: &UserId, issuance_id: &IssuanceId, code: &RedemptionCode) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + code.as_bytes().len());
    key.extend_from_slice(owner_id.as_bytes());
    key.extend_from_slice(&issuance_id.to_bytes());
    key.extend_from_slice(code.as_bytes());
    key
}

/// Create a prefix for iterating all codes of an owner.
#[must_use]
pub fn owner_codes_prefix(owner_id: &UserId) -> Vec<u8> {
    owner_id.as_bytes().to_vec()
}

/// Extract the code from an owner-code index key.
///
/// Returns `None` if the key is too short or the suffix is not a valid code.
#[must_use]
pub fn extract_code_from_owner_key(key: &[u8]) -> Option<RedemptionCode> {
    let suffix = key.get(32..)?;
    std::str::from_utf8(suffix).ok()?.parse().ok()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create a user-transaction index key.
///
/// Format: `user_id (16 bytes) || transaction_id (16 bytes)`
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transactions for a user.
#[must_use]
pub fn user_transactions_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the transaction ID from a user-transaction index key.
///
/// Returns `None` if the key is not 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> Option<TransactionId> {
    let bytes: [u8; 16] = key.get(16..32)?.try_into().ok()?;
    Some(TransactionId::from_bytes(bytes))
}

/// Create a batch checkpoint key.
#[must_use]
pub fn batch_key(request_id: &RequestId) -> Vec<u8> {
    request_id.as_str().as_bytes().to_vec()
}

/// Create a batch record key.
///
/// Format: `request_id || 0x00 || batch_index (4 bytes BE)`
///
/// Request ids are printable ASCII, so the separator never occurs inside one.
#[must_use]
pub fn batch_record_key(request_id: &RequestId, batch_index: u32) -> Vec<u8> {
    let id = request_id.as_str().as_bytes();
    let mut key = Vec::with_capacity(id.len() + 5);
    key.extend_from_slice(id);
    key.push(0);
    key.extend_from_slice(&batch_index.to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_length() {
        let user_id = UserId::generate();
        assert_eq!(account_key(&user_id).len(), 16);
    }

    #[test]
    fn stock_key_is_display_form() {
        let key: ProductKey = "gsat:90d".parse().unwrap();
        assert_eq!(stock_key(&key), b"gsat:90d");
    }

    #[test]
    fn owner_code_key_roundtrip() {
        let owner = UserId::generate();
        let issuance = IssuanceId::generate();
        let code: RedemptionCode = "INVAB12CD3".parse().unwrap();
        let key = owner_code_key(&owner, &issuance, &code);

        assert_eq!(key.len(), 42);
        assert!(key.starts_with(&owner_codes_prefix(&owner)));
        assert_eq!(extract_code_from_owner_key(&key), Some(code));
        assert_eq!(extract_code_from_owner_key(&key[..20]), None);
    }

    #[test]
    fn batch_record_keys_do_not_collide() {
        let short: RequestId = "order-1".parse().unwrap();
        let long: RequestId = "order-12".parse().unwrap();

        let key = batch_record_key(&short, 3);
        assert_eq!(key.len(), 12);
        assert_eq!(&key[8..], &3u32.to_be_bytes());
        assert_ne!(batch_record_key(&short, 0), batch_record_key(&short, 1));
        assert!(!batch_record_key(&long, 0).starts_with(&batch_record_key(&short, 0)[..8]));
    }

    #[test]
    fn user_transaction_key_format() {
        let user_id = UserId::generate();
        let tx_id = TransactionId::generate();
        let key = user_transaction_key(&user_id, &tx_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(extract_transaction_id_from_user_key(&key), Some(tx_id));
    }
}
