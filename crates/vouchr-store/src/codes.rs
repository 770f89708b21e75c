//! Issued code records.

use vouchr_core::{IssuedCode, RedemptionCode};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::cf;
use crate::txn::StoreTxn;

impl StoreTxn<'_> {
    /// Insert a freshly issued code unless the value is already taken.
    ///
    /// Returns `false` on a collision, leaving the existing record alone. The
    /// key is locked either way, so no concurrent transaction can claim the
    /// same value before this one finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock times out or the record cannot be written.
    pub fn insert_code_if_absent(&self, issued: &IssuedCode) -> Result<bool> {
        let key = keys::code_key(&issued.code);
        if self.exists_for_update(cf::CODES, &key)? {
            return Ok(false);
        }

        self.put(cf::CODES, &key, issued)?;
        self.put_raw(
            cf::CODES_BY_OWNER,
            &keys::owner_code_key(&issued.owner_id, &issued.issuance_id, &issued.code),
            &[],
        )?;
        Ok(true)
    }

    /// Lock an issued code.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no code has this value.
    pub fn lock_code(&self, code: &RedemptionCode) -> Result<IssuedCode> {
        self.get_for_update(cf::CODES, &keys::code_key(code))?
            .ok_or_else(|| StoreError::NotFound {
                entity: "code",
                id: code.to_string(),
            })
    }

    /// Stage an update to an existing code.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn update_code(&self, issued: &IssuedCode) -> Result<()> {
        self.put(cf::CODES, &keys::code_key(&issued.code), issued)
    }
}
