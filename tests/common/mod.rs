//! Shared helpers for integration tests

#![allow(dead_code)]

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

use simplebank::ledger::models::MAX_PAGE_SIZE;
use simplebank::ledger::{
    Account, CreateAccountParams, LedgerStore, ListEntriesParams, UnitOfWork, execute_tx,
};

const CURRENCIES: [&str; 3] = ["USD", "EUR", "CAD"];

pub fn random_int(min: i64, max: i64) -> i64 {
    rand::thread_rng().gen_range(min..=max)
}

pub fn random_string(n: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(n)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

pub fn random_owner() -> String {
    random_string(6)
}

pub fn random_money() -> i64 {
    random_int(0, 1000)
}

pub fn random_currency() -> String {
    CURRENCIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("USD")
        .to_string()
}

pub fn random_account_params() -> CreateAccountParams {
    CreateAccountParams {
        owner: random_owner(),
        balance: random_money(),
        currency: random_currency(),
    }
}

/// Commit a new account
pub async fn create_account<U: UnitOfWork>(store: &U, params: CreateAccountParams) -> Account {
    execute_tx(store, |tx| {
        Box::pin(async move { tx.create_account(&params).await })
    })
    .await
    .expect("create account")
}

pub async fn create_random_account<U: UnitOfWork>(store: &U) -> Account {
    create_account(store, random_account_params()).await
}

/// Commit a new account with a fixed balance and currency
pub async fn create_funded_account<U: UnitOfWork>(store: &U, balance: i64, currency: &str) -> Account {
    create_account(
        store,
        CreateAccountParams {
            owner: random_owner(),
            balance,
            currency: currency.to_string(),
        },
    )
    .await
}

/// Committed state of one account
pub async fn load_account<U: UnitOfWork>(store: &U, id: i64) -> Account {
    execute_tx(store, |tx| tx.get_account(id))
        .await
        .expect("load account")
}

/// Sum of the committed entry amounts of one account
pub async fn entry_total<U: UnitOfWork>(store: &U, id: i64) -> i64 {
    let entries = execute_tx(store, |tx| {
        Box::pin(async move {
            tx.list_entries(&ListEntriesParams {
                account_id: id,
                limit: MAX_PAGE_SIZE,
                offset: 0,
            })
            .await
        })
    })
    .await
    .expect("list entries");
    entries.iter().map(|e| e.amount).sum()
}

/// Committed balance equals the opening balance plus every committed entry
pub async fn assert_balance_matches_entries<U: UnitOfWork>(store: &U, opened: &Account) {
    let balance = load_account(store, opened.id).await.balance;
    let total = entry_total(store, opened.id).await;
    assert_eq!(
        balance,
        opened.balance + total,
        "account {} balance drifted from its entries",
        opened.id
    );
}
