use std::{
    fs,
    panic::{self, AssertUnwindSafe},
    path::Path,
};

use alloy_primitives::{Address, B256, U256};
use t8n_chaintsn::{
    process_block, trace::trace_file_name, TransitionOutput, TransitionParams, TsnError,
};
use t8n_exec::{
    BlockEnv, Budgets, RewardFinalizer, SystemCallError, TransferApplier, TxApplier, TxOutcome,
};
use t8n_primitives::prelude::*;
use t8n_state::{Account, WorldState};
use tracing::*;

const SENDER: Address = Address::repeat_byte(0x51);
const RECIPIENT: Address = Address::repeat_byte(0x52);
const COINBASE: Address = Address::repeat_byte(0xcb);

fn pre_state() -> WorldState {
    let mut state = WorldState::default();
    state.insert(
        SENDER,
        Account {
            balance: U256::from(1_000_000_000_000_000_000u64),
            ..Default::default()
        },
    );
    state
}

fn pre_merge_block() -> BlockInfo {
    BlockInfo {
        number: 1,
        timestamp: 1_000,
        gas_limit: 10_000_000,
        coinbase: COINBASE,
        base_fee: 7,
        parent_difficulty: U256::from(0x20000),
        parent_timestamp: 990,
        ..Default::default()
    }
}

fn transfer(nonce: u64) -> Transaction {
    Transaction {
        kind: TxType::Legacy,
        chain_id: 1,
        nonce,
        sender: SENDER,
        to: Some(RECIPIENT),
        value: U256::from(1_000),
        gas_limit: 21_000,
        max_gas_price: U256::from(10),
        max_priority_gas_price: U256::from(10),
        v: U256::from(27),
        r: U256::from(1),
        s: U256::from(1),
        ..Default::default()
    }
}

fn params(rev: Revision, trace_dir: Option<&Path>) -> TransitionParams<'_> {
    TransitionParams {
        rev,
        chain_id: 1,
        reward: Some(2_000_000_000_000_000_000),
        trace_dir,
    }
}

fn run(
    state: &mut WorldState,
    txs: Option<Vec<TxEntry>>,
    params: &TransitionParams<'_>,
) -> Result<TransitionOutput, TsnError> {
    let mut block = pre_merge_block();
    process_block(
        state,
        &mut block,
        &BlockHashes::default(),
        txs,
        params,
        &mut TransferApplier,
        &RewardFinalizer,
    )
}

#[test]
fn test_pre_merge_value_transfer() {
    let tx = transfer(0);
    let hash = tx.hash().unwrap();
    let mut state = pre_state();
    let pre_root = state.state_root();

    let out = run(
        &mut state,
        Some(vec![TxEntry::new(tx, Some(hash))]),
        &params(Revision::London, None),
    )
    .unwrap();
    let result = &out.result;

    let receipts = result.receipts.as_ref().unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].transaction_hash, hash);
    assert!(receipts[0].gas_used > 0);
    assert_eq!(receipts[0].cumulative_gas_used, receipts[0].gas_used);
    assert_eq!(result.rejected.as_deref(), Some(&[][..]));
    assert!(!result.current_difficulty.is_zero());
    assert_ne!(result.state_root, pre_root);
    assert_eq!(result.state_root, state.state_root());

    assert_eq!(state.get(&RECIPIENT).map(|a| a.balance), Some(U256::from(1_000)));
    assert_eq!(state.get(&SENDER).map(|a| a.nonce), Some(1));
}

#[test]
fn test_rejected_excluded_from_roots() {
    let good = transfer(0);
    let bad = transfer(5);

    let mut with_bad = pre_state();
    let mixed = run(
        &mut with_bad,
        Some(vec![TxEntry::new(bad.clone(), None), TxEntry::new(good.clone(), None)]),
        &params(Revision::Cancun, None),
    )
    .unwrap();

    let mut only_good = pre_state();
    let clean = run(
        &mut only_good,
        Some(vec![TxEntry::new(good, None)]),
        &params(Revision::Cancun, None),
    )
    .unwrap();

    let rejected = mixed.result.rejected.as_ref().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].index, 0);
    assert_eq!(rejected[0].hash, bad.hash().unwrap());
    assert_eq!(rejected[0].reason, "nonce too high");

    assert_eq!(mixed.result.tx_root, clean.result.tx_root);
    assert_eq!(mixed.result.receipts_root, clean.result.receipts_root);
    assert_eq!(mixed.result.logs_bloom, clean.result.logs_bloom);
    assert_eq!(mixed.result.state_root, clean.result.state_root);
    assert_eq!(mixed.encoded_body(), clean.encoded_body());
}

#[test]
fn test_gas_never_exceeds_block_limit() {
    let txs = (0..600).map(|n| TxEntry::new(transfer(n), None)).collect();
    let mut state = pre_state();
    let out = run(&mut state, Some(txs), &params(Revision::London, None)).unwrap();

    let exec = out.execution.unwrap();
    // 476 * 21000 fits in 10M, the rest is turned away
    assert_eq!(exec.accepted.len(), 476);
    assert_eq!(exec.rejected.len(), 600 - 476);
    assert!(exec.gas_used <= 10_000_000);
    assert!(exec.rejected.iter().all(|r| r.reason == "gas limit reached"));

    let mut expected = 0;
    for acc in &exec.accepted {
        expected += acc.receipt.gas_used;
        assert_eq!(acc.receipt.cumulative_gas_used, expected);
    }
}

#[test]
fn test_hash_mismatch_aborts() {
    let mut state = pre_state();
    let err = run(
        &mut state,
        Some(vec![TxEntry::new(transfer(0), Some(B256::repeat_byte(1)))]),
        &params(Revision::London, None),
    )
    .unwrap_err();
    assert!(matches!(err, TsnError::TxHashMismatch { index: 0, .. }));
    assert!(err.to_string().starts_with("transaction hash mismatched"));
}

#[test]
fn test_idempotent() {
    let txs = || Some(vec![TxEntry::new(transfer(0), None), TxEntry::new(transfer(1), None)]);

    let mut a = pre_state();
    let out_a = run(&mut a, txs(), &params(Revision::Prague, None)).unwrap();
    let mut b = pre_state();
    let out_b = run(&mut b, txs(), &params(Revision::Prague, None)).unwrap();

    assert_eq!(out_a, out_b);
    assert_eq!(
        serde_json::to_string(&out_a.result).unwrap(),
        serde_json::to_string(&out_b.result).unwrap()
    );
    assert_eq!(a, b);
}

fn blob_tx(nonce: u64, blobs: u8) -> Transaction {
    Transaction {
        kind: TxType::Blob,
        max_priority_gas_price: U256::from(1),
        max_blob_gas_price: U256::from(1),
        v: U256::ZERO,
        blob_hashes: (0..blobs)
            .map(|i| {
                let mut h = B256::repeat_byte(i + 1);
                h[0] = 0x01;
                h
            })
            .collect(),
        ..transfer(nonce)
    }
}

#[test]
fn test_blob_gas_ceiling() {
    let mut state = pre_state();
    let txs = vec![
        TxEntry::new(blob_tx(0, 4), None),
        TxEntry::new(blob_tx(1, 4), None),
    ];
    let out = run(&mut state, Some(txs), &params(Revision::Cancun, None)).unwrap();
    let exec = out.execution.as_ref().unwrap();

    assert_eq!(exec.accepted.len(), 1);
    assert_eq!(exec.accepted[0].index, 0);
    assert_eq!(exec.rejected.len(), 1);
    assert_eq!(exec.rejected[0].index, 1);
    assert_eq!(exec.rejected[0].reason, "blob gas limit exceeded");

    // only the accepted transaction drew from the blob budget
    assert_eq!(exec.budgets.blob_gas_left, 786_432 - 524_288);
    assert_eq!(out.result.blob_gas_used, Some(524_288));
    assert_eq!(state.get(&SENDER).map(|a| a.nonce), Some(1));

    let json = serde_json::to_value(&out.result).unwrap();
    assert_eq!(json["blobGasUsed"], "0x80000");
    assert_eq!(json["rejected"][0]["error"], "blob gas limit exceeded");
}

#[test]
fn test_revision_gated_fields() {
    let mut state = pre_state();
    let out = run(&mut state, Some(Vec::new()), &params(Revision::Prague, None)).unwrap();
    let json = serde_json::to_value(&out.result).unwrap();
    assert_eq!(
        json["requestsHash"],
        "0x6036c41849da9c076ed79654d434017387a88fb833c2856b32e18218b3341c5f"
    );
    assert!(json.get("withdrawalsRoot").is_some());
    assert!(json.get("blobGasUsed").is_some());

    let mut state = pre_state();
    let out = run(&mut state, Some(Vec::new()), &params(Revision::Berlin, None)).unwrap();
    let json = serde_json::to_value(&out.result).unwrap();
    assert!(json.get("withdrawalsRoot").is_none());
    assert!(json.get("requestsHash").is_none());
    assert_ne!(json["currentDifficulty"], "0x0");
}

#[test]
fn test_trace_files_written_per_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let txs = vec![TxEntry::new(transfer(0), None), TxEntry::new(transfer(7), None)];
    let hashes = txs.iter().map(|e| e.tx.hash().unwrap()).collect::<Vec<_>>();

    let mut state = pre_state();
    run(&mut state, Some(txs), &params(Revision::London, Some(dir.path()))).unwrap();

    let accepted = dir.path().join(trace_file_name(0, &hashes[0]));
    let rejected = dir.path().join(trace_file_name(1, &hashes[1]));
    let accepted_trace = fs::read_to_string(&accepted).unwrap();
    assert!(accepted_trace.lines().count() > 0);
    assert!(accepted_trace.contains("transferred value"));
    assert!(rejected.exists());

    // the stream is back to its old destination afterwards
    trace!("transferred value after the block");
    assert_eq!(fs::read_to_string(&accepted).unwrap(), accepted_trace);
}

/// Emits one trace event, then panics mid-transaction.
struct PanickingApplier;

impl TxApplier for PanickingApplier {
    fn system_call(
        &mut self,
        _state: &mut WorldState,
        _env: BlockEnv<'_>,
    ) -> Result<(), SystemCallError> {
        Ok(())
    }

    fn apply(
        &mut self,
        _state: &mut WorldState,
        _env: BlockEnv<'_>,
        _tx: &Transaction,
        _budgets: Budgets,
    ) -> TxOutcome {
        trace!("about to fail");
        panic!("applier blew up");
    }
}

#[test]
fn test_trace_restored_when_applier_panics() {
    let dir = tempfile::tempdir().unwrap();
    let tx = transfer(0);
    let path = dir.path().join(trace_file_name(0, &tx.hash().unwrap()));

    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut state = pre_state();
        let mut block = pre_merge_block();
        process_block(
            &mut state,
            &mut block,
            &BlockHashes::default(),
            Some(vec![TxEntry::new(tx, None)]),
            &params(Revision::London, Some(dir.path())),
            &mut PanickingApplier,
            &RewardFinalizer,
        )
    }));
    assert!(res.is_err());

    let before = fs::read_to_string(&path).unwrap();
    assert!(before.contains("about to fail"));
    trace!("about to fail again");
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_missing_trace_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let mut state = pre_state();
    let err = run(
        &mut state,
        Some(vec![TxEntry::new(transfer(0), None)]),
        &params(Revision::London, Some(missing.as_path())),
    )
    .unwrap_err();
    assert!(matches!(err, TsnError::Trace(..)));
}

#[test]
fn test_no_tx_list_reports_pre_state_root() {
    let mut state = pre_state();
    let pre_root = state.state_root();
    let out = run(&mut state, None, &params(Revision::London, None)).unwrap();

    assert_eq!(out.result.state_root, pre_root);
    assert!(out.result.receipts.is_none());
    assert!(out.result.logs_hash.is_none());
    assert!(!state.contains(&COINBASE));
    assert_eq!(out.encoded_body(), vec![0xc0]);
}
