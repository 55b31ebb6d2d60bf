//! End-to-end ledger behavior over the full service stack, backed by the
//! in-memory store.

use std::sync::Arc;

use paylink_core::adapters::MemoryLedgerStore;
use paylink_core::domain::{Account, PayType};
use paylink_core::error::LedgerError;
use paylink_core::ports::{AccountStore, HistoryFilter, HistoryReader, PageRequest};
use paylink_core::services::{AccountService, HistoryService, LedgerService};

struct TestLedger {
    store: Arc<MemoryLedgerStore>,
    accounts: AccountService,
    ledger: LedgerService,
    history: HistoryService,
}

fn setup() -> TestLedger {
    let store = Arc::new(MemoryLedgerStore::new());
    TestLedger {
        store: store.clone(),
        accounts: AccountService::new(store.clone()),
        ledger: LedgerService::new(store.clone()),
        history: HistoryService::new(store),
    }
}

impl TestLedger {
    async fn balance_of(&self, account: &Account) -> i64 {
        self.store
            .find_by_id(account.id)
            .await
            .unwrap()
            .unwrap()
            .balance
    }
}

#[tokio::test]
async fn charge_then_transfer_then_overdraw_scenario() {
    let t = setup();
    let a = t.accounts.create_account(1, "088").await.unwrap();
    let b = t.accounts.create_account(2, "090").await.unwrap();

    // A starts at 1000.
    t.ledger.charge_balance(&a.account_number, 1000).await.unwrap();

    // Charge 500 -> 1500, one CHARGE record on top.
    let charge = t.ledger.charge_balance(&a.account_number, 500).await.unwrap();
    assert_eq!(charge.pay_type, PayType::Charge);
    assert_eq!(charge.amount, 500);
    assert_eq!(charge.balance_after, 1500);
    assert_eq!(t.balance_of(&a).await, 1500);

    // Transfer 700 -> A at 800, B at 700.
    let out = t
        .ledger
        .send_money(&a.account_number, "gift", &b.account_number, 700)
        .await
        .unwrap();
    assert_eq!(out.pay_type, PayType::TransferOut);
    assert_eq!(out.balance_after, 800);
    assert_eq!(t.balance_of(&a).await, 800);
    assert_eq!(t.balance_of(&b).await, 700);

    // Overdraw fails and changes nothing.
    let err = t
        .ledger
        .send_money(&a.account_number, "x", &b.account_number, 10_000)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(t.balance_of(&a).await, 800);
    assert_eq!(t.balance_of(&b).await, 700);
}

#[tokio::test]
async fn transfer_writes_two_linked_legs_with_shared_timestamp() {
    let t = setup();
    let a = t.accounts.create_account(1, "088").await.unwrap();
    let b = t.accounts.create_account(2, "090").await.unwrap();
    t.ledger.charge_balance(&a.account_number, 1000).await.unwrap();

    t.ledger
        .send_money(&a.account_number, "rent", &b.account_number, 400)
        .await
        .unwrap();

    let a_page = t
        .history
        .find_pay_history(&a.account_number, None, None, Some(PayType::TransferOut), 1, 10)
        .await
        .unwrap();
    let b_page = t
        .history
        .find_pay_history(&b.account_number, None, None, Some(PayType::TransferIn), 1, 10)
        .await
        .unwrap();

    assert_eq!(a_page.total_items, 1);
    assert_eq!(b_page.total_items, 1);

    let out = &a_page.data[0];
    let incoming = &b_page.data[0];
    assert_eq!(out.amount, 400);
    assert_eq!(incoming.amount, 400);
    assert_eq!(out.created_at, incoming.created_at);
    assert_eq!(out.counterparty_number, b.account_number);
    assert_eq!(incoming.counterparty_number, a.account_number);
    assert_eq!(out.description, "rent");
    assert_eq!(incoming.description, "rent");
    assert_eq!(out.balance_after, 600);
    assert_eq!(incoming.balance_after, 400);
}

#[tokio::test]
async fn most_recent_record_after_charge_reflects_new_balance() {
    let t = setup();
    let a = t.accounts.create_account(1, "088").await.unwrap();

    t.ledger.charge_balance(&a.account_number, 250).await.unwrap();
    t.ledger.charge_balance(&a.account_number, 750).await.unwrap();

    let page = t
        .history
        .find_pay_history(&a.account_number, None, None, None, 1, 1)
        .await
        .unwrap();
    let newest = &page.data[0];
    assert_eq!(newest.pay_type, PayType::Charge);
    assert_eq!(newest.amount, 750);
    assert_eq!(newest.balance_after, t.balance_of(&a).await);
}

#[tokio::test]
async fn transfers_conserve_total_balance() {
    let t = setup();
    let a = t.accounts.create_account(1, "088").await.unwrap();
    let b = t.accounts.create_account(2, "090").await.unwrap();
    let c = t.accounts.create_account(3, "004").await.unwrap();

    let mut charged_total = 0;
    for (account, amount) in [(&a, 5_000), (&b, 1_200), (&c, 300)] {
        t.ledger
            .charge_balance(&account.account_number, amount)
            .await
            .unwrap();
        charged_total += amount;
    }

    let transfers = [
        (&a, &b, 700),
        (&b, &c, 900),
        (&c, &a, 450),
        (&a, &c, 1),
        (&b, &a, 1_399),
    ];
    for (from, to, amount) in transfers {
        t.ledger
            .send_money(&from.account_number, "shuffle", &to.account_number, amount)
            .await
            .unwrap();
    }

    let total = t.balance_of(&a).await + t.balance_of(&b).await + t.balance_of(&c).await;
    assert_eq!(total, charged_total);
    assert!(t.balance_of(&a).await >= 0);
    assert!(t.balance_of(&b).await >= 0);
    assert!(t.balance_of(&c).await >= 0);
}

#[tokio::test]
async fn failed_posting_leaves_neither_transfer_leg_applied() {
    let t = setup();
    let a = t.accounts.create_account(1, "088").await.unwrap();
    let b = t.accounts.create_account(2, "090").await.unwrap();
    t.ledger.charge_balance(&a.account_number, 1000).await.unwrap();

    t.store.fail_next_posting();
    let err = t
        .ledger
        .send_money(&a.account_number, "doomed", &b.account_number, 300)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StorageUnavailable(_)));

    assert_eq!(t.balance_of(&a).await, 1000);
    assert_eq!(t.balance_of(&b).await, 0);
    for account in [&a, &b] {
        let page = t
            .store
            .find_history(
                account.id,
                &HistoryFilter::default(),
                PageRequest { page: 1, size: 10 },
            )
            .await
            .unwrap();
        let transfer_legs = page
            .data
            .iter()
            .filter(|h| h.pay_type != PayType::Charge)
            .count();
        assert_eq!(transfer_legs, 0);
    }

    // A fresh call succeeds; the failure was transient and left clean state.
    t.ledger
        .send_money(&a.account_number, "retry", &b.account_number, 300)
        .await
        .unwrap();
    assert_eq!(t.balance_of(&a).await, 700);
    assert_eq!(t.balance_of(&b).await, 300);
}

#[tokio::test]
async fn concurrent_opposite_transfers_settle_consistently() {
    let t = setup();
    let a = t.accounts.create_account(1, "088").await.unwrap();
    let b = t.accounts.create_account(2, "090").await.unwrap();
    t.ledger.charge_balance(&a.account_number, 10_000).await.unwrap();
    t.ledger.charge_balance(&b.account_number, 10_000).await.unwrap();

    let ledger = Arc::new(LedgerService::new(t.store.clone()));
    let mut tasks = Vec::new();
    for i in 0..50 {
        let ledger = ledger.clone();
        let (from, to) = if i % 2 == 0 {
            (a.account_number.clone(), b.account_number.clone())
        } else {
            (b.account_number.clone(), a.account_number.clone())
        };
        tasks.push(tokio::spawn(async move {
            ledger.send_money(&from, "ping-pong", &to, 100).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let total = t.balance_of(&a).await + t.balance_of(&b).await;
    assert_eq!(total, 20_000);
    // 25 transfers each way at equal amounts cancel out.
    assert_eq!(t.balance_of(&a).await, 10_000);
    assert_eq!(t.balance_of(&b).await, 10_000);
}
