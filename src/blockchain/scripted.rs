//! In-process transport that plays back a fixed script.
//!
//! Backs `stitch-cli submit --dry-run` and the test suites. The chain head
//! advances by one block on every head or finalized-head query. The node
//! reports no finalized head unless [`ScriptedTransport::finalized_lag`]
//! is set.

use std::collections::VecDeque;
use std::sync::Mutex;

use alloy::primitives::{keccak256, Address, Bytes, TxHash, B256, U256};
use async_trait::async_trait;

use crate::blockchain::signer::TransactionSigner;
use crate::blockchain::transport::ChainTransport;
use crate::blockchain::types::{
    BlockRef, ChainError, ChainResult, DispatchFailure, Inclusion, NodeHealth, NodeInfo,
    RemarkEvent,
};

/// Chain ID reported by the scripted node.
pub const SCRIPTED_CHAIN_ID: u64 = 420_420_421;

/// Deterministic block reference for block `number`.
pub fn block_ref(number: u64) -> BlockRef {
    BlockRef {
        hash: B256::left_padding_from(&number.to_be_bytes()),
        number,
    }
}

#[derive(Debug, Clone)]
enum Step {
    Pending(usize),
    Included(u64),
    Failed(u64, DispatchFailure),
}

#[derive(Debug)]
struct Script {
    syncing: bool,
    balance: U256,
    reject: Option<String>,
    reject_once: Option<String>,
    head: u64,
    /// Finalized head trails the best head by this many blocks.
    finalized_lag: Option<u64>,
    steps: VecDeque<Step>,
    /// Outcome of the last step, repeated once the script runs out.
    last: Option<Inclusion>,
    broadcasts: Vec<Broadcast>,
}

#[derive(Debug, Clone)]
struct Broadcast {
    nonce: u64,
    event: RemarkEvent,
}

/// A [`ChainTransport`] whose answers are set up in advance.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// A synced, funded node at block 1 that never includes anything.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                syncing: false,
                balance: U256::from(10u64).pow(U256::from(18u64)),
                reject: None,
                reject_once: None,
                head: 1,
                finalized_lag: None,
                steps: VecDeque::new(),
                last: None,
                broadcasts: Vec::new(),
            }),
        }
    }

    /// Happy path: pending for one poll, then included in the next block.
    pub fn happy_path() -> Self {
        Self::new().head_at(100).then_pending(1).then_included(101)
    }

    pub fn syncing(self, syncing: bool) -> Self {
        self.edit(|s| s.syncing = syncing)
    }

    pub fn balance(self, balance: U256) -> Self {
        self.edit(|s| s.balance = balance)
    }

    /// Refuse every broadcast with `reason`.
    pub fn reject_broadcast(self, reason: &str) -> Self {
        let reason = reason.to_string();
        self.edit(|s| s.reject = Some(reason))
    }

    /// Refuse only the next broadcast with `reason`.
    pub fn reject_next(self, reason: &str) -> Self {
        let reason = reason.to_string();
        self.edit(|s| s.reject_once = Some(reason))
    }

    /// Report a finalized head `lag` blocks behind the best head.
    pub fn finalized_lag(self, lag: u64) -> Self {
        self.edit(|s| s.finalized_lag = Some(lag))
    }

    pub fn head_at(self, head: u64) -> Self {
        self.edit(|s| s.head = head)
    }

    /// Report "not included" for `polls` inclusion queries.
    pub fn then_pending(self, polls: usize) -> Self {
        self.edit(|s| s.steps.push_back(Step::Pending(polls)))
    }

    pub fn then_included(self, block: u64) -> Self {
        self.edit(|s| s.steps.push_back(Step::Included(block)))
    }

    pub fn then_failed(self, block: u64, failure: DispatchFailure) -> Self {
        self.edit(|s| s.steps.push_back(Step::Failed(block, failure)))
    }

    /// Remarks broadcast so far, oldest first.
    pub fn broadcasts(&self) -> Vec<RemarkEvent> {
        self.lock().broadcasts.iter().map(|b| b.event.clone()).collect()
    }

    /// Nonces of the accepted broadcasts, oldest first.
    pub fn nonces(&self) -> Vec<u64> {
        self.lock().broadcasts.iter().map(|b| b.nonce).collect()
    }

    fn edit(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.lock());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // a panicking test thread must not hide the script from the others
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Script {
    fn advance_head(&mut self) -> u64 {
        let head = self.head;
        self.head += 1;
        head
    }

    fn next_inclusion(&mut self) -> Option<Inclusion> {
        loop {
            match self.steps.front_mut() {
                None => return self.last.clone(),
                Some(Step::Pending(0)) => {
                    self.steps.pop_front();
                }
                Some(Step::Pending(n)) => {
                    *n -= 1;
                    return None;
                }
                Some(_) => {
                    let inclusion = match self.steps.pop_front() {
                        Some(Step::Included(number)) => Inclusion {
                            block: block_ref(number),
                            index: 0,
                            failure: None,
                        },
                        Some(Step::Failed(number, failure)) => Inclusion {
                            block: block_ref(number),
                            index: 0,
                            failure: Some(failure),
                        },
                        _ => return None,
                    };
                    self.last = Some(inclusion.clone());
                    return Some(inclusion);
                }
            }
        }
    }
}

#[async_trait]
impl ChainTransport for ScriptedTransport {
    fn endpoint(&self) -> &str {
        "scripted://local"
    }

    async fn node_health(&self) -> ChainResult<NodeHealth> {
        Ok(NodeHealth {
            syncing: self.lock().syncing,
        })
    }

    async fn node_info(&self) -> ChainResult<NodeInfo> {
        let script = self.lock();
        Ok(NodeInfo {
            chain_id: SCRIPTED_CHAIN_ID,
            client_version: "scripted/0.1".to_string(),
            best_block: script.head,
            syncing: script.syncing,
        })
    }

    async fn free_balance(&self, _account: Address) -> ChainResult<U256> {
        Ok(self.lock().balance)
    }

    async fn broadcast(&self, remark: Bytes, signer: &dyn TransactionSigner) -> ChainResult<TxHash> {
        let mut script = self.lock();
        // pending count of the node: every accepted broadcast so far
        let expected = script.broadcasts.len() as u64;
        let nonce = signer.next_nonce(expected);

        let rejection = match script.reject_once.take() {
            Some(reason) => Some(reason),
            None => script.reject.clone(),
        };
        let rejection = rejection.or_else(|| {
            (nonce != expected).then(|| format!("nonce gap: expected {}, got {}", expected, nonce))
        });
        if let Some(reason) = rejection {
            signer.release_nonce(nonce);
            return Err(ChainError::Rejected(reason));
        }

        let mut preimage = remark.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let tx_hash = keccak256(&preimage);
        script.broadcasts.push(Broadcast {
            nonce,
            event: RemarkEvent {
                sender: signer.address(),
                data: remark,
            },
        });
        Ok(tx_hash)
    }

    async fn inclusion(&self, _tx_hash: TxHash) -> ChainResult<Option<Inclusion>> {
        Ok(self.lock().next_inclusion())
    }

    async fn best_block_number(&self) -> ChainResult<u64> {
        Ok(self.lock().advance_head())
    }

    async fn finalized_block_number(&self) -> ChainResult<Option<u64>> {
        let mut script = self.lock();
        let Some(lag) = script.finalized_lag else {
            return Ok(None);
        };
        Ok(Some(script.advance_head().saturating_sub(lag)))
    }

    async fn remark_at(&self, _block: &BlockRef, index: u64) -> ChainResult<Option<RemarkEvent>> {
        let script = self.lock();
        Ok(script
            .broadcasts
            .last()
            .filter(|_| index == 0)
            .map(|b| b.event.clone()))
    }
}
