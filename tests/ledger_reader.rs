mod common;

use alloy_primitives::{Bytes, U256};
use common::*;
use earnfinity::chain::ChainError;
use earnfinity::core::constants::functions;
use earnfinity::core::{CallView, EntryKind, EntryStatus};
use earnfinity::ledger::{LedgerError, LedgerReader, LedgerSummary};

fn purchase_input(cents: u64) -> Bytes {
    call_data(
        functions::REWARD_PURCHASE,
        &[alloy_dyn_abi::DynSolValue::Address(wallet()), uint(U256::from(cents))],
    )
}

fn wallet_id() -> String {
    wallet().to_string().to_lowercase()
}

#[tokio::test]
async fn test_no_relevant_transactions_is_empty_not_error() {
    let node = FakeNode::with_empty_chain(30);
    node.push_block(
        12,
        vec![transaction(1, stranger(), Some(stranger()), Bytes::new())],
    );
    let contract = contract();

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    assert!(outcome.entries.is_empty());
    assert!(outcome.is_complete());
    assert_eq!(outcome.blocks_scanned, 31);
}

#[tokio::test]
async fn test_entries_are_most_recent_first_and_capped() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    for n in 1..=12u8 {
        node.put_transaction(
            n as u64,
            transaction(n, wallet(), Some(contract.address()), purchase_input(1000)),
            40_000,
        );
    }

    let outcome = LedgerReader::new(&node, &contract).recent_entries(&wallet_id(), 5).await;

    assert_eq!(outcome.entries.len(), 5);
    let blocks: Vec<u64> = outcome.entries.iter().map(|e| e.block_number).collect();
    assert_eq!(blocks, vec![12, 11, 10, 9, 8]);
    assert!(outcome.entries.windows(2).all(|w| w[0].block_number >= w[1].block_number));
    // Stops as soon as the limit is reached
    assert_eq!(node.block_requests(), vec![12, 11, 10, 9, 8]);
}

#[tokio::test]
async fn test_default_limit_is_ten() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    for n in 1..=15u8 {
        node.put_transaction(
            n as u64,
            transaction(n, wallet(), Some(contract.address()), purchase_input(500)),
            40_000,
        );
    }

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;
    assert_eq!(outcome.entries.len(), 10);
    assert_eq!(outcome.entries[0].block_number, 15);
}

#[tokio::test]
async fn test_relevance_by_sender_or_contract() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    // Unrelated transfer between strangers
    node.put_transaction(4, transaction(4, stranger(), Some(stranger()), Bytes::new()), 21_000);
    // Stranger calling the contract
    node.put_transaction(3, transaction(3, stranger(), Some(contract.address()), purchase_input(2000)), 45_000);
    // Wallet sending elsewhere
    node.put_transaction(2, transaction(2, wallet(), Some(stranger()), Bytes::new()), 21_000);

    let outcome = LedgerReader::new(&node, &contract)
        .recent_entries(&wallet().to_string().to_uppercase().replace("0X", "0x"), 10)
        .await;

    let hashes: Vec<_> = outcome.entries.iter().map(|e| e.transaction_hash).collect();
    assert_eq!(hashes, vec![tx_hash(3), tx_hash(2)]);
    assert_eq!(outcome.entries[0].kind, EntryKind::Earned);
    assert_eq!(outcome.entries[1].kind, EntryKind::Unknown);
    assert_eq!(outcome.entries[1].amount, 0.0);
}

#[tokio::test]
async fn test_connectivity_failure_keeps_collected_entries() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    node.put_transaction(10, transaction(10, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);
    node.put_transaction(9, transaction(9, wallet(), Some(contract.address()), purchase_input(2000)), 40_000);
    for number in 0..=8 {
        node.push_block(number, Vec::new());
    }
    node.put_transaction(5, transaction(5, wallet(), Some(contract.address()), purchase_input(3000)), 40_000);
    node.fail_block(8, unreachable_node());

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.entries[0].block_number, 10);
    assert_eq!(outcome.entries[1].block_number, 9);
    assert!(!outcome.is_complete());
    assert!(matches!(outcome.interrupted, Some(ChainError::Connectivity(_))));
    assert_eq!(outcome.blocks_scanned, 2);
}

#[tokio::test]
async fn test_receipt_failure_mid_scan_is_partial() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    node.put_transaction(6, transaction(6, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);
    node.put_transaction(5, transaction(5, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);
    node.fail_receipt(tx_hash(5), unreachable_node());

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].gas_used, Some(40_000));
    assert!(outcome.interrupted.is_some());
}

#[tokio::test]
async fn test_malformed_block_is_skipped_not_fatal() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    for number in 0..=10 {
        node.push_block(number, Vec::new());
    }
    node.put_transaction(10, transaction(10, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);
    node.put_transaction(5, transaction(5, wallet(), Some(contract.address()), purchase_input(2000)), 40_000);
    node.fail_block(
        8,
        ChainError::InvalidResponse("eth_getBlockByNumber: unknown field".to_string()),
    );

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    let blocks: Vec<u64> = outcome.entries.iter().map(|e| e.block_number).collect();
    assert_eq!(blocks, vec![10, 5]);
    assert!(outcome.is_complete());
    assert_eq!(outcome.blocks_scanned, 11);
}

#[tokio::test]
async fn test_node_error_on_block_is_skipped() {
    let node = FakeNode::with_empty_chain(4);
    let contract = contract();
    node.put_transaction(2, transaction(2, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);
    node.fail_block(
        3,
        ChainError::Rpc {
            code: -32000,
            message: "header not found".to_string(),
        },
    );

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].block_number, 2);
    assert!(outcome.interrupted.is_none());
}

#[tokio::test]
async fn test_receipt_node_error_only_drops_gas() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    node.put_transaction(6, transaction(6, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);
    node.put_transaction(5, transaction(5, wallet(), Some(contract.address()), purchase_input(1000)), 41_000);
    node.fail_receipt(
        tx_hash(6),
        ChainError::Rpc {
            code: -32000,
            message: "unknown transaction".to_string(),
        },
    );

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.entries[0].transaction_hash, tx_hash(6));
    assert_eq!(outcome.entries[0].gas_used, None);
    assert_eq!(outcome.entries[0].kind, EntryKind::Earned);
    assert_eq!(outcome.entries[1].gas_used, Some(41_000));
}

#[tokio::test]
async fn test_missing_block_is_skipped() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    for number in 0..=6 {
        node.push_block(number, Vec::new());
    }
    node.put_transaction(6, transaction(6, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);
    node.put_transaction(2, transaction(2, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);
    node.remove_block(4);

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    let blocks: Vec<u64> = outcome.entries.iter().map(|e| e.block_number).collect();
    assert_eq!(blocks, vec![6, 2]);
    assert!(outcome.is_complete());
    assert_eq!(outcome.blocks_scanned, 7);
    assert!(node.block_requests().contains(&4));
}

#[tokio::test]
async fn test_head_unavailable_reports_once() {
    let node = FakeNode::with_empty_chain(5);
    node.state.lock().unwrap().head_unavailable = true;
    let contract = contract();

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    assert!(outcome.entries.is_empty());
    assert!(outcome.interrupted.is_some());
    assert!(node.block_requests().is_empty());
}

#[tokio::test]
async fn test_lookback_window_bounds_the_scan() {
    let node = FakeNode::with_empty_chain(20);
    let contract = contract();
    node.put_transaction(15, transaction(15, wallet(), Some(contract.address()), purchase_input(1000)), 40_000);

    let outcome = LedgerReader::new(&node, &contract)
        .with_lookback(5)
        .recent_history(&wallet_id())
        .await;

    assert!(outcome.entries.is_empty());
    assert_eq!(node.block_requests(), vec![20, 19, 18, 17, 16]);
}

#[tokio::test]
async fn test_short_chain_includes_genesis() {
    let node = FakeNode::with_empty_chain(3);
    let contract = contract();

    LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;

    assert_eq!(node.block_requests(), vec![3, 2, 1, 0]);
}

#[tokio::test]
async fn test_classifies_each_contract_function() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    let to = Some(contract.address());

    node.put_transaction(
        6,
        transaction(6, wallet(), to, purchase_input(1000)),
        50_000,
    );
    node.put_transaction(
        5,
        transaction(
            5,
            wallet(),
            to,
            call_data(functions::BURN, &[uint(tokens(750)), text("VIP Event Pass")]),
        ),
        35_000,
    );
    node.put_transaction(
        4,
        transaction(
            4,
            wallet(),
            to,
            call_data(
                functions::REDEEM_PARTNER_REWARD,
                &[
                    alloy_dyn_abi::DynSolValue::Address(wallet()),
                    uint(tokens(500)),
                    text("Xbox"),
                ],
            ),
        ),
        38_000,
    );
    node.put_transaction(
        3,
        transaction(
            3,
            wallet(),
            to,
            call_data(functions::DONATE, &[uint(tokens(25)), text("Health Research")]),
        ),
        36_000,
    );
    node.put_transaction(
        2,
        transaction(2, wallet(), to, Bytes::from(vec![0xde, 0xad, 0xbe, 0xef, 0x00])),
        21_000,
    );

    let outcome = LedgerReader::new(&node, &contract).recent_history(&wallet_id()).await;
    assert!(outcome.is_complete());
    assert_eq!(outcome.entries.len(), 5);

    let purchase = &outcome.entries[0];
    assert_eq!(purchase.kind, EntryKind::Earned);
    assert_eq!(purchase.description, "Purchase Reward");
    assert!((purchase.amount - 9.259259259).abs() < 1e-6);
    assert_eq!(purchase.status, EntryStatus::Confirmed);
    assert_eq!(purchase.gas_used, Some(50_000));
    assert_eq!(purchase.date(), "2024-03-13");

    let burn = &outcome.entries[1];
    assert_eq!(burn.kind, EntryKind::Spent);
    assert_eq!(burn.description, "VIP Event Pass");
    assert_eq!(burn.amount, -750.0);

    let partner = &outcome.entries[2];
    assert_eq!(partner.kind, EntryKind::Spent);
    assert_eq!(partner.description, "Partner Redemption: Xbox");
    assert_eq!(partner.amount, -500.0);
    assert_eq!(partner.partner_name.as_deref(), Some("Xbox"));

    let donation = &outcome.entries[3];
    assert_eq!(donation.kind, EntryKind::Donated);
    assert_eq!(donation.description, "Donation: Health Research");
    assert_eq!(donation.amount, -25.0);

    let unknown = &outcome.entries[4];
    assert_eq!(unknown.kind, EntryKind::Unknown);
    assert_eq!(unknown.description, "Blockchain Transaction");
    assert_eq!(unknown.amount, 0.0);

    let summary = LedgerSummary::from_entries(&outcome.entries, 0.54);
    assert!((summary.total_earned - 9.259259259).abs() < 1e-6);
    assert_eq!(summary.total_spent, 1250.0);
    assert_eq!(summary.total_donated, 25.0);
}

#[tokio::test]
async fn test_transaction_detail_decodes_call() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    node.put_transaction(
        7,
        transaction(
            7,
            wallet(),
            Some(contract.address()),
            call_data(functions::DONATE, &[uint(tokens(10)), text("Education")]),
        ),
        36_500,
    );

    let detail = LedgerReader::new(&node, &contract)
        .transaction_detail(tx_hash(7))
        .await
        .unwrap();

    assert_eq!(detail.block_number, 7);
    assert_eq!(detail.from, wallet());
    assert_eq!(detail.to, Some(contract.address()));
    assert_eq!(detail.gas_used, Some(36_500));
    assert_eq!(detail.gas_price_gwei, Some(20.0));
    assert_eq!(detail.success, Some(true));
    assert_eq!(detail.value_ether, 0.0);
    assert_eq!(
        detail.block_time.map(|t| t.timestamp() as u64),
        Some(GENESIS_TIME + 7 * 15)
    );
    match detail.call {
        CallView::Decoded { function, arguments } => {
            assert_eq!(function, "donate");
            assert_eq!(arguments["cause"], "Education");
            assert_eq!(arguments["amount"], tokens(10).to_string());
        }
        other => panic!("expected decoded call, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transaction_detail_raw_and_missing() {
    let node = FakeNode::with_empty_chain(0);
    let contract = contract();
    node.put_transaction(
        3,
        transaction(3, wallet(), Some(contract.address()), Bytes::from(vec![0x01, 0x02])),
        21_000,
    );
    let reader = LedgerReader::new(&node, &contract);

    let detail = reader.transaction_detail(tx_hash(3)).await.unwrap();
    assert_eq!(detail.call, CallView::Raw("0x0102".to_string()));

    let missing = reader.transaction_detail(tx_hash(99)).await;
    assert!(matches!(missing, Err(LedgerError::TransactionNotFound(hash)) if hash == tx_hash(99)));
}
