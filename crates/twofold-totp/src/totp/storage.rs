//! In-memory account list.
//!
//! Owns the ordered `Vec<Account>` for a session: manual creation,
//! update/delete by id, and merging of imported batches. Ids are unique and
//! every stored secret has passed Base32 validation. Persistence is the
//! caller's concern (see [`AccountStore`](crate::totp::service::AccountStore)).

use std::collections::HashSet;

use crate::totp::base32::validate_secret;
use crate::totp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Account list
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountList {
    accounts: Vec<Account>,
}

impl AccountList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted records, dropping any that break the list
    /// invariants (invalid secret, blank name, duplicate id).
    pub fn from_accounts(records: Vec<Account>) -> Self {
        let mut list = Self::new();
        list.merge(records);
        list
    }

    // ── CRUD ─────────────────────────────────────────────────────

    /// Create and append an account from user input. Returns the new account.
    pub fn add(&mut self, name: &str, issuer: &str, raw_secret: &str) -> Result<Account, TotpError> {
        let account = Account::create(name, issuer, raw_secret)?;
        self.accounts.push(account.clone());
        Ok(account)
    }

    /// Get an account by id.
    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Change name and issuer. The secret is immutable after creation.
    pub fn update(&mut self, id: &str, name: &str, issuer: &str) -> Result<&Account, TotpError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TotpError::new(
                TotpErrorKind::InvalidInput,
                "Account name is required",
            ));
        }
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;
        account.name = name.to_string();
        account.issuer = issuer.trim().to_string();
        Ok(&*account)
    }

    /// Remove an account by id, returning it.
    pub fn remove(&mut self, id: &str) -> Result<Account, TotpError> {
        let pos = self
            .accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok(self.accounts.remove(pos))
    }

    /// Append accounts, skipping ids already present and records with a
    /// blank name or an invalid secret. Secrets are stored canonical.
    /// Returns the number appended.
    pub fn merge(&mut self, imported: Vec<Account>) -> usize {
        let mut seen: HashSet<String> = self.accounts.iter().map(|a| a.id.clone()).collect();
        let mut added = 0;
        for mut account in imported {
            match validate_secret(&account.secret) {
                Ok(secret) if !account.name.trim().is_empty() => account.secret = secret,
                _ => {
                    log::warn!("account list: dropping invalid record {}", account.id);
                    continue;
                }
            }
            if !seen.insert(account.id.clone()) {
                log::warn!("account list: dropping duplicate id {}", account.id);
                continue;
            }
            self.accounts.push(account);
            added += 1;
        }
        added
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Accounts in insertion order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn into_vec(self) -> Vec<Account> {
        self.accounts
    }
}

fn not_found(id: &str) -> TotpError {
    TotpError::new(TotpErrorKind::NotFound, format!("Account {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "JBSWY3DPEHPK3PXP";

    fn stored(id: &str, name: &str, secret: &str) -> Account {
        Account {
            id: id.into(),
            name: name.into(),
            issuer: String::new(),
            secret: secret.into(),
        }
    }

    // ── add ──────────────────────────────────────────────────────

    #[test]
    fn add_appends_in_order() {
        let mut list = AccountList::new();
        let a = list.add("first", "", SECRET).unwrap();
        let b = list.add("second", "X", "jbsw y3dp ehpk 3pxp").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.accounts()[0].id, a.id);
        assert_eq!(list.accounts()[1].id, b.id);
        assert_eq!(b.secret, SECRET);
    }

    #[test]
    fn add_rejects_invalid_without_mutating() {
        let mut list = AccountList::new();
        assert!(list.add("", "", SECRET).is_err());
        let err = list.add("x", "", "BAD").unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidSecret);
        assert!(list.is_empty());
    }

    // ── update ───────────────────────────────────────────────────

    #[test]
    fn update_changes_name_and_issuer_only() {
        let mut list = AccountList::new();
        let a = list.add("old", "OldCo", SECRET).unwrap();
        let updated = list.update(&a.id, "  new  ", " NewCo ").unwrap().clone();
        assert_eq!(updated.name, "new");
        assert_eq!(updated.issuer, "NewCo");
        assert_eq!(updated.secret, a.secret);
        assert_eq!(updated.id, a.id);
    }

    #[test]
    fn update_unknown_id() {
        let mut list = AccountList::new();
        let err = list.update("nope", "n", "").unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::NotFound);
    }

    #[test]
    fn update_rejects_blank_name() {
        let mut list = AccountList::new();
        let a = list.add("keep", "", SECRET).unwrap();
        assert!(list.update(&a.id, "   ", "").is_err());
        assert_eq!(list.get(&a.id).unwrap().name, "keep");
    }

    // ── remove ───────────────────────────────────────────────────

    #[test]
    fn remove_by_id() {
        let mut list = AccountList::new();
        let a = list.add("a", "", SECRET).unwrap();
        let b = list.add("b", "", SECRET).unwrap();
        assert_eq!(list.remove(&a.id).unwrap().id, a.id);
        assert_eq!(list.len(), 1);
        assert_eq!(list.accounts()[0].id, b.id);
        assert_eq!(list.remove(&a.id).unwrap_err().kind, TotpErrorKind::NotFound);
    }

    // ── merge ────────────────────────────────────────────────────

    #[test]
    fn merge_skips_existing_ids() {
        let mut list = AccountList::from_accounts(vec![stored("1", "a", SECRET)]);
        let added = list.merge(vec![
            stored("1", "dup", SECRET),
            stored("2", "b", SECRET),
            stored("2", "b again", SECRET),
        ]);
        assert_eq!(added, 1);
        let ids: Vec<&str> = list.accounts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn merge_drops_invalid_records() {
        let mut list = AccountList::from_accounts(vec![stored("1", "a", SECRET)]);
        let added = list.merge(vec![
            stored("2", "", "NOT-BASE32!"),
            stored("3", "bad secret", "NOT-BASE32!"),
            stored("4", "   ", SECRET),
            stored("5", "ok", "jbsw y3dp ehpk 3pxp"),
        ]);
        assert_eq!(added, 1);
        let ids: Vec<&str> = list.accounts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
        assert_eq!(list.get("5").unwrap().secret, SECRET);
        assert!(crate::totp::core::codes_for_accounts_at(list.accounts(), 59).is_ok());
    }

    #[test]
    fn merge_keeps_every_secret_valid() {
        let mut list = AccountList::new();
        list.merge(vec![
            stored("1", "a", SECRET),
            stored("2", "b", "1111"),
            stored("3", "c", "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"),
        ]);
        let ids: Vec<&str> = list.accounts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(list
            .accounts()
            .iter()
            .all(|a| crate::totp::base32::is_valid_secret(&a.secret)));
    }

    // ── from_accounts ────────────────────────────────────────────

    #[test]
    fn from_accounts_drops_broken_records() {
        let list = AccountList::from_accounts(vec![
            stored("1", "ok", SECRET),
            stored("2", "bad secret", "NOTBASE32!!"),
            stored("1", "dup id", SECRET),
            stored("3", "  ", SECRET),
            stored("4", "also ok", "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"),
        ]);
        let ids: Vec<&str> = list.accounts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn into_vec_preserves_order() {
        let records = vec![stored("b", "b", SECRET), stored("a", "a", SECRET)];
        assert_eq!(AccountList::from_accounts(records.clone()).into_vec(), records);
    }
}
