//! Ledger operations.
//!
//! Debits and credits are check-and-apply on the locked account row, with the
//! matching [`CreditTransaction`] staged in the same transaction.

use chrono::Utc;
use rust_decimal::Decimal;

use vouchr_core::{CreditAccount, CreditTransaction, IssuanceId, TransactionType, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::cf;
use crate::txn::StoreTxn;

impl StoreTxn<'_> {
    /// Lock an account row.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock times out or the record cannot be read.
    pub fn lock_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        self.get_for_update(cf::ACCOUNTS, &keys::account_key(user_id))
    }

    /// Lock an account row that must exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no account.
    pub fn require_account(&self, user_id: &UserId) -> Result<CreditAccount> {
        self.lock_account(user_id)?.ok_or_else(|| StoreError::NotFound {
            entity: "account",
            id: user_id.to_string(),
        })
    }

    /// Stage an account write.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be encoded or written.
    pub fn put_account(&self, account: &CreditAccount) -> Result<()> {
        self.put(cf::ACCOUNTS, &keys::account_key(&account.user_id), account)
    }

    /// Debit `amount` if the balance covers it.
    ///
    /// Returns the balance after the debit. A zero amount leaves the balance
    /// alone and writes no ledger entry.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientFunds` if `balance < amount`.
    /// - `StoreError::InvalidAmount` if `amount` is negative.
    pub fn try_debit(
        &self,
        user_id: &UserId,
        amount: Decimal,
        issuance_id: IssuanceId,
        description: &str,
    ) -> Result<Decimal> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(StoreError::InvalidAmount(format!(
                "debit must not be negative: {amount}"
            )));
        }

        let mut account = self.require_account(user_id)?;
        if !account.has_sufficient_credits(amount) {
            return Err(StoreError::InsufficientFunds {
                balance: account.balance,
                required: amount,
            });
        }
        if amount.is_zero() {
            return Ok(account.balance);
        }

        account.balance -= amount;
        account.lifetime_spent += amount;
        account.updated_at = Utc::now();
        self.put_account(&account)?;

        let entry = CreditTransaction::issuance(
            *user_id,
            amount,
            account.balance,
            issuance_id,
            description.to_string(),
        );
        self.put_ledger_entry(&entry)?;

        Ok(account.balance)
    }

    /// Add `amount` to the balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InvalidAmount` if `amount` is not positive or the
    ///   balance would overflow.
    pub fn credit(
        &self,
        user_id: &UserId,
        amount: Decimal,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<CreditTransaction> {
        if amount <= Decimal::ZERO {
            return Err(StoreError::InvalidAmount(format!(
                "credit must be positive: {amount}"
            )));
        }
        if !transaction_type.is_credit() {
            return Err(StoreError::InvalidAmount(format!(
                "{transaction_type:?} is not a credit"
            )));
        }

        let mut account = self.require_account(user_id)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::InvalidAmount("balance overflow".into()))?;
        account.lifetime_credited += amount;
        account.updated_at = Utc::now();
        self.put_account(&account)?;

        let entry = CreditTransaction::credit(
            *user_id,
            amount,
            account.balance,
            transaction_type,
            description.to_string(),
        );
        self.put_ledger_entry(&entry)?;

        Ok(entry)
    }

    /// Mark the account as activated.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    pub fn activate_account(&self, user_id: &UserId) -> Result<()> {
        let mut account = self.require_account(user_id)?;
        if !account.activated {
            account.activated = true;
            account.updated_at = Utc::now();
            self.put_account(&account)?;
        }
        Ok(())
    }

    /// Stage a ledger entry and its user index.
    fn put_ledger_entry(&self, entry: &CreditTransaction) -> Result<()> {
        self.put(cf::TRANSACTIONS, &keys::transaction_key(&entry.id), entry)?;
        self.put_raw(
            cf::TRANSACTIONS_BY_USER,
            &keys::user_transaction_key(&entry.user_id, &entry.id),
            &[],
        )
    }
}
