//! Wire models exchanged with an Algorand node.
//!
//! Only the subset of the algod REST surface that the composer consumes is
//! modelled here. Field names follow the node's kebab-case JSON convention.

use crate::transact::SignedTransaction;
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as, skip_serializing_none};

/// Suggested parameters for constructing a new transaction.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransactionParams {
    pub consensus_version: String,
    /// Suggested fee in µALGO per byte.
    pub fee: u64,
    /// The last round seen by the node.
    pub last_round: u64,
    pub genesis_id: String,
    #[serde_as(as = "Base64")]
    pub genesis_hash: Vec<u8>,
    /// The minimum fee in µALGO required for any transaction.
    pub min_fee: u64,
}

/// Subset of the node status used to drive confirmation polling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    pub last_round: u64,
}

/// Details about a pending or confirmed transaction.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransactionResponse {
    pub txn: SignedTransaction,
    /// The round in which the transaction was confirmed, if confirmed.
    pub confirmed_round: Option<u64>,
    /// Indicates the transaction was kicked out of this node's pool.
    #[serde(default)]
    pub pool_error: String,
    #[serde_as(as = "Option<Vec<Base64>>")]
    pub logs: Option<Vec<Vec<u8>>>,
    /// Inner transactions spawned by this transaction, if any.
    pub inner_txns: Option<Vec<PendingTransactionResponse>>,
}

/// Execution trace detail toggles for simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateTraceConfig {
    pub enable: bool,
    pub scratch_change: bool,
    pub stack_change: bool,
    pub state_change: bool,
}

impl SimulateTraceConfig {
    /// A trace config with every capture toggle enabled.
    pub fn all() -> Self {
        Self {
            enable: true,
            scratch_change: true,
            stack_change: true,
            state_change: true,
        }
    }
}

/// A transaction group to simulate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateRequestTransactionGroup {
    pub txns: Vec<SignedTransaction>,
}

/// Request to the node's simulate endpoint.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateRequest {
    pub txn_groups: Vec<SimulateRequestTransactionGroup>,
    /// Simulate as if the group was submitted at this round.
    pub round: Option<u64>,
    pub allow_empty_signatures: Option<bool>,
    pub allow_more_logging: Option<bool>,
    pub allow_unnamed_resources: Option<bool>,
    pub fix_signers: Option<bool>,
    pub exec_trace_config: Option<SimulateTraceConfig>,
}

/// A box reference reported by simulation.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateBoxReference {
    pub app: u64,
    #[serde_as(as = "Base64")]
    pub name: Vec<u8>,
}

/// An (account, asset) holding pair accessed during simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetHoldingReference {
    pub account: String,
    pub asset: u64,
}

/// An (account, app) local state pair accessed during simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationLocalReference {
    pub account: String,
    pub app: u64,
}

/// Resources accessed by a simulated execution that were not declared in the
/// submitted transactions.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateUnnamedResourcesAccessed {
    pub accounts: Option<Vec<String>>,
    pub apps: Option<Vec<u64>>,
    pub assets: Option<Vec<u64>>,
    pub boxes: Option<Vec<SimulateBoxReference>>,
    pub extra_box_refs: Option<u64>,
    pub asset_holdings: Option<Vec<AssetHoldingReference>>,
    pub app_locals: Option<Vec<ApplicationLocalReference>>,
}

impl SimulateUnnamedResourcesAccessed {
    /// Sort every resource category so downstream assignment is
    /// order-independent and reproducible.
    pub fn normalize(&mut self) {
        if let Some(accounts) = self.accounts.as_mut() {
            accounts.sort();
        }
        if let Some(apps) = self.apps.as_mut() {
            apps.sort_unstable();
        }
        if let Some(assets) = self.assets.as_mut() {
            assets.sort_unstable();
        }
        if let Some(boxes) = self.boxes.as_mut() {
            boxes.sort_by(|a, b| a.app.cmp(&b.app).then_with(|| a.name.cmp(&b.name)));
        }
        if let Some(holdings) = self.asset_holdings.as_mut() {
            holdings.sort_by(|a, b| a.asset.cmp(&b.asset).then_with(|| a.account.cmp(&b.account)));
        }
        if let Some(locals) = self.app_locals.as_mut() {
            locals.sort_by(|a, b| a.app.cmp(&b.app).then_with(|| a.account.cmp(&b.account)));
        }
    }
}

/// Simulation result for a single transaction.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateTransactionResult {
    pub txn_result: PendingTransactionResponse,
    pub app_budget_consumed: Option<u64>,
    pub unnamed_resources_accessed: Option<SimulateUnnamedResourcesAccessed>,
    pub exec_trace: Option<serde_json::Value>,
}

/// Simulation result for a transaction group.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateTransactionGroupResult {
    pub txn_results: Vec<SimulateTransactionResult>,
    pub failure_message: Option<String>,
    /// Path to the transaction that failed, if the group failed.
    pub failed_at: Option<Vec<u64>>,
    pub app_budget_added: Option<u64>,
    pub app_budget_consumed: Option<u64>,
    pub unnamed_resources_accessed: Option<SimulateUnnamedResourcesAccessed>,
}

/// Response from the node's simulate endpoint.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateResponse {
    pub version: u64,
    pub last_round: u64,
    pub txn_groups: Vec<SimulateTransactionGroupResult>,
    pub exec_trace_config: Option<SimulateTraceConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unnamed_resources_normalize() {
        let mut resources = SimulateUnnamedResourcesAccessed {
            accounts: Some(vec!["B".to_string(), "A".to_string()]),
            apps: Some(vec![7, 3]),
            assets: Some(vec![9, 1]),
            boxes: Some(vec![
                SimulateBoxReference {
                    app: 2,
                    name: b"b".to_vec(),
                },
                SimulateBoxReference {
                    app: 2,
                    name: b"a".to_vec(),
                },
                SimulateBoxReference {
                    app: 1,
                    name: b"z".to_vec(),
                },
            ]),
            extra_box_refs: None,
            asset_holdings: Some(vec![
                AssetHoldingReference {
                    account: "B".to_string(),
                    asset: 1,
                },
                AssetHoldingReference {
                    account: "A".to_string(),
                    asset: 1,
                },
            ]),
            app_locals: Some(vec![
                ApplicationLocalReference {
                    account: "A".to_string(),
                    app: 5,
                },
                ApplicationLocalReference {
                    account: "A".to_string(),
                    app: 2,
                },
            ]),
        };

        resources.normalize();

        assert_eq!(resources.accounts.unwrap(), vec!["A", "B"]);
        assert_eq!(resources.apps.unwrap(), vec![3, 7]);
        assert_eq!(resources.assets.unwrap(), vec![1, 9]);
        let boxes = resources.boxes.unwrap();
        assert_eq!(boxes[0].app, 1);
        assert_eq!(boxes[1].name, b"a".to_vec());
        let holdings = resources.asset_holdings.unwrap();
        assert_eq!(holdings[0].account, "A");
        let locals = resources.app_locals.unwrap();
        assert_eq!(locals[0].app, 2);
    }

    #[test]
    fn test_transaction_params_round_trip() {
        let params = TransactionParams {
            consensus_version: "future".to_string(),
            fee: 0,
            last_round: 41,
            genesis_id: "dockernet-v1".to_string(),
            genesis_hash: vec![7u8; 32],
            min_fee: 1000,
        };

        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"last-round\":41"));
        let decoded: TransactionParams = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.genesis_hash, vec![7u8; 32]);
        assert_eq!(decoded.min_fee, 1000);
    }
}
