mod common;

use catchbot::error::DomainError;
use catchbot::models::types::UserId;
use common::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_never_break_the_floor() {
    let h = harness(game_settings());
    let ledger = h.registry.services.ledger.clone();
    let user = UserId(7);
    ledger.credit(user, 1000).await.unwrap();

    let mut debits = Vec::new();
    for _ in 0..50 {
        let ledger = ledger.clone();
        debits.push(tokio::spawn(async move { ledger.debit(user, 30).await }));
    }
    let mut credits = Vec::new();
    for _ in 0..20 {
        let ledger = ledger.clone();
        credits.push(tokio::spawn(async move { ledger.credit(user, 10).await }));
    }

    let mut ok_debits = 0i64;
    for d in debits {
        match d.await.unwrap() {
            Ok(balance) => {
                assert!(balance.amount >= 0);
                ok_debits += 1;
            }
            Err(DomainError::InsufficientBalance { have, need }) => {
                assert_eq!(need, 30);
                assert!(have < 30);
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    for c in credits {
        c.await.unwrap().unwrap();
    }

    let final_balance = ledger.get(user).await.unwrap();
    assert_eq!(final_balance, 1000 + 20 * 10 - 30 * ok_debits);
    assert!(final_balance >= 0);
    assert!(ok_debits >= 33, "at least the initial 1000 coins worth of debits go through");
}

#[tokio::test]
async fn custom_floor_allows_debt() {
    let mut game = game_settings();
    game.balance_floor = -100;
    let h = harness(game);
    let ledger = &h.registry.services.ledger;

    let balance = ledger.debit(UserId(3), 80).await.unwrap();
    assert_eq!(balance.amount, -80);
    assert!(matches!(
        ledger.debit(UserId(3), 30).await,
        Err(DomainError::InsufficientBalance { have: -80, need: 30 })
    ));
}

#[tokio::test]
async fn failed_transfer_leaves_both_balances_alone() {
    let h = harness(game_settings());
    let ledger = &h.registry.services.ledger;
    ledger.credit(ALICE, 20).await.unwrap();

    assert!(ledger.transfer(ALICE, BOB, 50).await.is_err());
    assert_eq!(ledger.get(ALICE).await.unwrap(), 20);
    assert_eq!(ledger.get(BOB).await.unwrap(), 0);
}
