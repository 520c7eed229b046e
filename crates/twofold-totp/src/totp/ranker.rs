//! Site relevance: surface the accounts that belong to the site the user is on.
//!
//! Matching is plain case-insensitive substring containment against the
//! account's issuer and name. Two needles are tried: the full domain and
//! its "main domain" label (`accounts.google.com` → `google`).

use crate::totp::types::Account;

/// Second-to-last dot-separated label, or the whole domain when there is
/// no such non-empty label.
pub fn main_domain(domain: &str) -> &str {
    let labels: Vec<&str> = domain.split('.').collect();
    match labels.len().checked_sub(2).map(|i| labels[i]) {
        Some(label) if !label.is_empty() => label,
        _ => domain,
    }
}

/// `true` if the account looks like it belongs to `domain`.
/// Always `false` for an empty domain.
pub fn is_match(account: &Account, domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    let domain = domain.to_lowercase();
    let main = main_domain(&domain);
    let issuer = account.issuer.to_lowercase();
    let name = account.name.to_lowercase();

    issuer.contains(main) || name.contains(main) || issuer.contains(&domain) || name.contains(&domain)
}

/// Stable partition: matching accounts first, each side in input order.
/// Identity for an empty domain.
pub fn rank(accounts: &[Account], domain: &str) -> Vec<Account> {
    let (mut matched, unmatched): (Vec<Account>, Vec<Account>) = accounts
        .iter()
        .cloned()
        .partition(|a| is_match(a, domain));
    matched.extend(unmatched);
    matched
}

/// Case-insensitive substring search over name and issuer.
/// An empty query matches everything.
pub fn matches_query(account: &Account, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    account.name.to_lowercase().contains(&query) || account.issuer.to_lowercase().contains(&query)
}

/// The list as shown to the user: filtered by `query`, then ranked for `domain`.
pub fn visible_accounts(accounts: &[Account], query: &str, domain: &str) -> Vec<Account> {
    let filtered: Vec<Account> = accounts
        .iter()
        .filter(|a| matches_query(a, query))
        .cloned()
        .collect();
    rank(&filtered, domain)
}

/// Host name of a page URL with a leading `www.` removed.
/// Empty when the URL does not parse or has no host.
pub fn site_domain(page_url: &str) -> String {
    match url::Url::parse(page_url) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("");
            host.strip_prefix("www.").unwrap_or(host).to_string()
        }
        Err(e) => {
            log::debug!("site_domain: unparseable page URL: {}", e);
            String::new()
        }
    }
}
