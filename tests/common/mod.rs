#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;

use earnfinity::chain::{
    ChainError, ChainNode, RpcBlock, RpcReceipt, RpcTransaction, TokenContract, TransactionRequest,
};

pub const ARTIFACT: &str = include_str!("../../abi/TKNToken.json");

/// Block timestamps start here (2024-03-13T00:00:00Z) and advance 15s per block
pub const GENESIS_TIME: u64 = 1_710_288_000;

pub fn contract() -> TokenContract {
    TokenContract::from_artifact_str(ARTIFACT, None, Some("5777")).unwrap()
}

pub fn wallet() -> Address {
    Address::repeat_byte(0x11)
}

pub fn stranger() -> Address {
    Address::repeat_byte(0x22)
}

pub fn tx_hash(n: u8) -> B256 {
    B256::with_last_byte(n)
}

/// Whole tokens as 18-decimal units
pub fn tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

pub fn uint(value: U256) -> DynSolValue {
    DynSolValue::Uint(value, 256)
}

pub fn text(value: &str) -> DynSolValue {
    DynSolValue::String(value.to_string())
}

pub fn call_data(function: &str, args: &[DynSolValue]) -> Bytes {
    contract().encode_call(function, args).unwrap()
}

pub fn transaction(n: u8, from: Address, to: Option<Address>, input: Bytes) -> RpcTransaction {
    RpcTransaction {
        hash: tx_hash(n),
        block_number: None,
        from,
        to,
        value: U256::ZERO,
        gas_price: Some(U256::from(20_000_000_000u64)),
        nonce: U64::from(n),
        input,
        transaction_index: Some(U64::ZERO),
    }
}

pub fn receipt(hash: B256, gas_used: u64, status: u64) -> RpcReceipt {
    RpcReceipt {
        transaction_hash: hash,
        transaction_index: Some(U64::ZERO),
        block_number: None,
        gas_used: Some(U256::from(gas_used)),
        contract_address: None,
        status: Some(U64::from(status)),
    }
}

#[derive(Default)]
pub struct ChainState {
    pub blocks: BTreeMap<u64, RpcBlock>,
    pub receipts: HashMap<B256, RpcReceipt>,
    pub balances: HashMap<Address, U256>,
    pub accounts: Vec<Address>,
    /// Explicit head; defaults to the highest block
    pub head: Option<u64>,
    /// Blocks whose fetch fails, with the error returned
    pub failing_blocks: HashMap<u64, ChainError>,
    /// Receipts whose fetch fails, with the error returned
    pub failing_receipts: HashMap<B256, ChainError>,
    pub head_unavailable: bool,
    pub send_fails: bool,
    /// Submitted transactions never get a receipt
    pub withhold_receipts: bool,
    /// Receipt status for submitted transactions
    pub submitted_status: u64,
    /// Balance of the sender once a submitted transaction confirms
    pub balance_after_send: Option<U256>,
    pub sent: Vec<TransactionRequest>,
    pub block_requests: Vec<u64>,
    pub receipt_requests: usize,
}

/// In-memory chain node
pub struct FakeNode {
    pub state: Mutex<ChainState>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                submitted_status: 1,
                ..ChainState::default()
            }),
        }
    }

    /// Empty blocks 0..=head
    pub fn with_empty_chain(head: u64) -> Self {
        let node = Self::new();
        for number in 0..=head {
            node.push_block(number, Vec::new());
        }
        node
    }

    pub fn push_block(&self, number: u64, transactions: Vec<RpcTransaction>) {
        let transactions = transactions
            .into_iter()
            .map(|mut tx| {
                tx.block_number = Some(U64::from(number));
                tx
            })
            .collect();
        let block = RpcBlock {
            number: U64::from(number),
            hash: Some(B256::with_last_byte(number as u8)),
            timestamp: U64::from(GENESIS_TIME + number * 15),
            transactions,
        };
        self.state.lock().unwrap().blocks.insert(number, block);
    }

    /// Put `tx` into block `number`, replacing that block's transactions,
    /// with a successful receipt
    pub fn put_transaction(&self, number: u64, tx: RpcTransaction, gas_used: u64) {
        let hash = tx.hash;
        self.push_block(number, vec![tx]);
        let mut mined = receipt(hash, gas_used, 1);
        mined.block_number = Some(U64::from(number));
        self.state.lock().unwrap().receipts.insert(hash, mined);
    }

    pub fn set_balance(&self, owner: Address, amount: U256) {
        self.state.lock().unwrap().balances.insert(owner, amount);
    }

    pub fn fail_block(&self, number: u64, error: ChainError) {
        self.state.lock().unwrap().failing_blocks.insert(number, error);
    }

    pub fn fail_receipt(&self, hash: B256, error: ChainError) {
        self.state.lock().unwrap().failing_receipts.insert(hash, error);
    }

    pub fn remove_block(&self, number: u64) {
        self.state.lock().unwrap().blocks.remove(&number);
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn block_requests(&self) -> Vec<u64> {
        self.state.lock().unwrap().block_requests.clone()
    }
}

pub fn unreachable_node() -> ChainError {
    ChainError::Connectivity("connection refused".to_string())
}

#[async_trait]
impl ChainNode for FakeNode {
    async fn block_number(&self) -> Result<u64, ChainError> {
        let state = self.state.lock().unwrap();
        if state.head_unavailable {
            return Err(unreachable_node());
        }
        Ok(state
            .head
            .or_else(|| state.blocks.keys().next_back().copied())
            .unwrap_or_default())
    }

    async fn block_with_transactions(&self, number: u64) -> Result<Option<RpcBlock>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.block_requests.push(number);
        if let Some(error) = state.failing_blocks.get(&number) {
            return Err(error.clone());
        }
        Ok(state.blocks.get(&number).cloned())
    }

    async fn transaction(&self, hash: B256) -> Result<Option<RpcTransaction>, ChainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .blocks
            .values()
            .flat_map(|block| block.transactions.iter())
            .find(|tx| tx.hash == hash)
            .cloned())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<RpcReceipt>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.receipt_requests += 1;
        if let Some(error) = state.failing_receipts.get(&hash) {
            return Err(error.clone());
        }
        Ok(state.receipts.get(&hash).cloned())
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        // Only balanceOf(address): selector plus one left-padded address word
        if data.len() != 36 {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            });
        }
        let owner = Address::from_slice(&data[16..36]);
        let state = self.state.lock().unwrap();
        let balance = state.balances.get(&owner).copied().unwrap_or_default();
        Ok(Bytes::from(balance.to_be_bytes::<32>().to_vec()))
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, ChainError> {
        let mut state = self.state.lock().unwrap();
        if state.send_fails {
            return Err(unreachable_node());
        }
        state.sent.push(request.clone());

        let mut bytes = [0xee; 32];
        bytes[31] = state.sent.len() as u8;
        let hash = B256::from(bytes);

        if !state.withhold_receipts {
            let status = state.submitted_status;
            state.receipts.insert(hash, receipt(hash, 52_000, status));
            if status == 1 {
                if let Some(balance) = state.balance_after_send {
                    state.balances.insert(request.from, balance);
                }
            }
        }
        Ok(hash)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn network_id(&self) -> Result<String, ChainError> {
        Ok("5777".to_string())
    }
}
