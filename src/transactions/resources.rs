//! Translation of simulate-reported unnamed resources into app call
//! reference arrays.
//!
//! Resources reported for a specific transaction go onto that transaction.
//! Group-level resources are placed onto whichever app call in the group has
//! room, most constrained categories first.

use super::composer::ComposerError;
use crate::algod::{ApplicationLocalReference, AssetHoldingReference, SimulateBoxReference,
    SimulateUnnamedResourcesAccessed};
use crate::transact::constants::{MAX_ACCOUNT_REFERENCES, MAX_OVERALL_REFERENCES};
use crate::transact::{Address, BoxReference, Transaction};

/// Types of resources that can be populated at the group level
#[derive(Debug, Clone)]
pub(crate) enum GroupResourceType {
    Account(String),
    App(u64),
    Asset(u64),
    Box(SimulateBoxReference),
    ExtraBoxRef,
    AssetHolding(AssetHoldingReference),
    AppLocal(ApplicationLocalReference),
}

/// Populate resources reported for a single transaction onto that
/// transaction. Cross-reference resources (boxes, app locals, asset
/// holdings) are only ever reported at the group level.
pub(crate) fn populate_transaction_resources(
    transactions: &mut [Transaction],
    group_index: usize,
    resources_accessed: &SimulateUnnamedResourcesAccessed,
) -> Result<(), ComposerError> {
    let Transaction::ApplicationCall(ref mut app_call) = transactions[group_index] else {
        return Ok(());
    };

    if resources_accessed.boxes.is_some() || resources_accessed.extra_box_refs.is_some() {
        return Err(ComposerError::TransactionError {
            message: "Unexpected boxes at the transaction level".to_string(),
        });
    }
    if resources_accessed.app_locals.is_some() {
        return Err(ComposerError::TransactionError {
            message: "Unexpected app locals at the transaction level".to_string(),
        });
    }
    if resources_accessed.asset_holdings.is_some() {
        return Err(ComposerError::TransactionError {
            message: "Unexpected asset holdings at the transaction level".to_string(),
        });
    }

    let mut accounts_count = 0;
    let mut apps_count = 0;
    let mut assets_count = 0;

    if let Some(ref accessed_accounts) = resources_accessed.accounts {
        let accounts = app_call.account_references.get_or_insert_with(Vec::new);
        for account_str in accessed_accounts {
            let address =
                account_str
                    .parse::<Address>()
                    .map_err(|e| ComposerError::TransactionError {
                        message: format!("Invalid account address: {}", e),
                    })?;
            if !accounts.contains(&address) {
                accounts.push(address);
            }
        }
        accounts_count = accounts.len();
    }

    if let Some(ref accessed_apps) = resources_accessed.apps {
        let apps = app_call.app_references.get_or_insert_with(Vec::new);
        for app_id in accessed_apps {
            if !apps.contains(app_id) {
                apps.push(*app_id);
            }
        }
        apps_count = apps.len();
    }

    if let Some(ref accessed_assets) = resources_accessed.assets {
        let assets = app_call.asset_references.get_or_insert_with(Vec::new);
        for asset_id in accessed_assets {
            if !assets.contains(asset_id) {
                assets.push(*asset_id);
            }
        }
        assets_count = assets.len();
    }

    let boxes_count = app_call
        .box_references
        .as_ref()
        .map(|b| b.len())
        .unwrap_or(0);

    if accounts_count > MAX_ACCOUNT_REFERENCES {
        return Err(ComposerError::TransactionError {
            message: format!(
                "Account reference limit of {} exceeded in transaction {}",
                MAX_ACCOUNT_REFERENCES, group_index
            ),
        });
    }

    if (accounts_count + assets_count + apps_count + boxes_count) > MAX_OVERALL_REFERENCES {
        return Err(ComposerError::TransactionError {
            message: format!(
                "Resource reference limit of {} exceeded in transaction {}",
                MAX_OVERALL_REFERENCES, group_index
            ),
        });
    }

    Ok(())
}

/// Populate group-level resources for app call transactions.
pub(crate) fn populate_group_resources(
    transactions: &mut [Transaction],
    mut group_resources: SimulateUnnamedResourcesAccessed,
) -> Result<(), ComposerError> {
    // Deterministic placement regardless of the order the node reports
    // resources in
    group_resources.normalize();

    let mut remaining_accounts = group_resources.accounts.unwrap_or_default();
    let mut remaining_apps = group_resources.apps.unwrap_or_default();
    let mut remaining_assets = group_resources.assets.unwrap_or_default();
    let remaining_boxes = group_resources.boxes.unwrap_or_default();

    // Cross-reference resources first (app locals and asset holdings), as
    // they are the most restrictive to place
    if let Some(app_locals) = group_resources.app_locals {
        for app_local in app_locals {
            let app_local_app = app_local.app;
            let app_local_account = app_local.account.clone();

            populate_group_resource(transactions, &GroupResourceType::AppLocal(app_local))?;

            // Remove resources from remaining if we're adding them here
            remaining_accounts.retain(|acc| acc != &app_local_account);
            remaining_apps.retain(|app| *app != app_local_app);
        }
    }

    if let Some(asset_holdings) = group_resources.asset_holdings {
        for asset_holding in asset_holdings {
            let asset_holding_asset = asset_holding.asset;
            let asset_holding_account = asset_holding.account.clone();

            populate_group_resource(
                transactions,
                &GroupResourceType::AssetHolding(asset_holding),
            )?;

            remaining_accounts.retain(|acc| acc != &asset_holding_account);
            remaining_assets.retain(|asset| *asset != asset_holding_asset);
        }
    }

    // Accounts next because the account limit is 4
    for account in remaining_accounts {
        populate_group_resource(transactions, &GroupResourceType::Account(account))?;
    }

    for box_ref in remaining_boxes {
        let box_ref_app = box_ref.app;

        populate_group_resource(transactions, &GroupResourceType::Box(box_ref))?;

        // The box's app reference is added alongside the box
        remaining_apps.retain(|app| *app != box_ref_app);
    }

    for asset in remaining_assets {
        populate_group_resource(transactions, &GroupResourceType::Asset(asset))?;
    }

    for app in remaining_apps {
        populate_group_resource(transactions, &GroupResourceType::App(app))?;
    }

    if let Some(extra_box_refs) = group_resources.extra_box_refs {
        for _ in 0..extra_box_refs {
            populate_group_resource(transactions, &GroupResourceType::ExtraBoxRef)?;
        }
    }

    Ok(())
}

fn is_app_call_below_resource_limit(txn: &Transaction) -> bool {
    if let Transaction::ApplicationCall(app_call) = txn {
        let accounts_count = app_call
            .account_references
            .as_ref()
            .map(|a| a.len())
            .unwrap_or(0);
        let assets_count = app_call
            .asset_references
            .as_ref()
            .map(|a| a.len())
            .unwrap_or(0);
        let apps_count = app_call
            .app_references
            .as_ref()
            .map(|a| a.len())
            .unwrap_or(0);
        let boxes_count = app_call
            .box_references
            .as_ref()
            .map(|b| b.len())
            .unwrap_or(0);

        (accounts_count + assets_count + apps_count + boxes_count) < MAX_OVERALL_REFERENCES
    } else {
        false
    }
}

/// Place a single group-level resource into a transaction that has room.
fn populate_group_resource(
    transactions: &mut [Transaction],
    resource: &GroupResourceType,
) -> Result<(), ComposerError> {
    // For asset holdings and app locals, first try to find a transaction
    // that already has the account available
    match resource {
        GroupResourceType::AssetHolding(_) | GroupResourceType::AppLocal(_) => {
            let account = match resource {
                GroupResourceType::AssetHolding(asset_holding) => &asset_holding.account,
                GroupResourceType::AppLocal(app_local) => &app_local.account,
                _ => unreachable!(),
            };

            let group_index = transactions.iter().position(|txn| {
                if !is_app_call_below_resource_limit(txn) {
                    return false;
                }

                if let Transaction::ApplicationCall(app_call) = txn {
                    if let Some(ref accounts) = app_call.account_references {
                        let address = account.parse::<Address>().unwrap_or_default();
                        if accounts.contains(&address) {
                            return true;
                        }
                    }

                    // The account may be available as an app account
                    if let Some(ref apps) = app_call.app_references {
                        for app_id in apps {
                            if account == &Address::from_app_id(app_id).to_string() {
                                return true;
                            }
                        }
                    }

                    if app_call.header.sender.to_string() == *account {
                        return true;
                    }
                }

                false
            });

            if let Some(group_index) = group_index {
                if let Transaction::ApplicationCall(ref mut app_call) = transactions[group_index] {
                    match resource {
                        GroupResourceType::AssetHolding(asset_holding) => {
                            let assets = app_call.asset_references.get_or_insert_with(Vec::new);
                            if !assets.contains(&asset_holding.asset) {
                                assets.push(asset_holding.asset);
                            }
                        }
                        GroupResourceType::AppLocal(app_local) => {
                            let apps = app_call.app_references.get_or_insert_with(Vec::new);
                            if !apps.contains(&app_local.app) {
                                apps.push(app_local.app);
                            }
                        }
                        _ => {}
                    }
                }

                return Ok(());
            }

            // Next try a transaction that already has the asset/app
            // available and space for the account
            let group_index = transactions.iter().position(|txn| {
                if !is_app_call_below_resource_limit(txn) {
                    return false;
                }

                if let Transaction::ApplicationCall(app_call) = txn {
                    if app_call
                        .account_references
                        .as_ref()
                        .map(|a| a.len())
                        .unwrap_or(0)
                        >= MAX_ACCOUNT_REFERENCES
                    {
                        return false;
                    }

                    match resource {
                        GroupResourceType::AssetHolding(asset_holding) => {
                            if let Some(ref assets) = app_call.asset_references {
                                return assets.contains(&asset_holding.asset);
                            }
                        }
                        GroupResourceType::AppLocal(app_local) => {
                            if let Some(ref apps) = app_call.app_references {
                                return apps.contains(&app_local.app);
                            }
                            return app_call.app_id == app_local.app;
                        }
                        _ => {}
                    }
                }

                false
            });

            if let Some(group_index) = group_index {
                if let Transaction::ApplicationCall(ref mut app_call) = transactions[group_index] {
                    let accounts = app_call.account_references.get_or_insert_with(Vec::new);
                    let address =
                        account
                            .parse::<Address>()
                            .map_err(|e| ComposerError::TransactionError {
                                message: format!("Invalid account address: {}", e),
                            })?;
                    if !accounts.contains(&address) {
                        accounts.push(address);
                    }
                }
                return Ok(());
            }
        }
        GroupResourceType::Box(box_ref) => {
            // For boxes, first try to find a transaction that already has
            // the app available
            let group_index = transactions.iter().position(|txn| {
                if !is_app_call_below_resource_limit(txn) {
                    return false;
                }

                if let Transaction::ApplicationCall(app_call) = txn {
                    if let Some(ref apps) = app_call.app_references {
                        if apps.contains(&box_ref.app) {
                            return true;
                        }
                    }
                    return app_call.app_id == box_ref.app;
                }

                false
            });

            if let Some(group_index) = group_index {
                if let Transaction::ApplicationCall(ref mut app_call) = transactions[group_index] {
                    let boxes = app_call.box_references.get_or_insert_with(Vec::new);
                    if !boxes
                        .iter()
                        .any(|b| b.app_id == box_ref.app && b.name == box_ref.name)
                    {
                        boxes.push(BoxReference {
                            app_id: box_ref.app,
                            name: box_ref.name.clone(),
                        });
                    }
                }
                return Ok(());
            }
        }
        _ => {}
    }

    // Fall back to the first transaction with room for the reference(s)
    let group_index = transactions.iter().position(|txn| {
        if let Transaction::ApplicationCall(app_call) = txn {
            let accounts_count = app_call
                .account_references
                .as_ref()
                .map(|a| a.len())
                .unwrap_or(0);
            let assets_count = app_call
                .asset_references
                .as_ref()
                .map(|a| a.len())
                .unwrap_or(0);
            let apps_count = app_call
                .app_references
                .as_ref()
                .map(|a| a.len())
                .unwrap_or(0);
            let boxes_count = app_call
                .box_references
                .as_ref()
                .map(|b| b.len())
                .unwrap_or(0);
            let total = accounts_count + assets_count + apps_count + boxes_count;

            match resource {
                GroupResourceType::Account(_) => accounts_count < MAX_ACCOUNT_REFERENCES,

                GroupResourceType::AssetHolding(..) | GroupResourceType::AppLocal(..) => {
                    // Needs space for the account and the other reference
                    total < (MAX_OVERALL_REFERENCES - 1)
                        && accounts_count < MAX_ACCOUNT_REFERENCES
                }

                GroupResourceType::Box(box_ref) => {
                    // A named box needs space for both the box reference and
                    // the app reference
                    if box_ref.app != 0 {
                        total < MAX_OVERALL_REFERENCES - 1
                    } else {
                        total < MAX_OVERALL_REFERENCES
                    }
                }
                _ => total < MAX_OVERALL_REFERENCES,
            }
        } else {
            false
        }
    });

    let group_index = group_index.ok_or_else(|| ComposerError::TransactionError {
        message: "No more transactions below reference limit. Add another app call to the group."
            .to_string(),
    })?;

    if let Transaction::ApplicationCall(ref mut app_call) = transactions[group_index] {
        match resource {
            GroupResourceType::Account(account) => {
                let accounts = app_call.account_references.get_or_insert_with(Vec::new);
                let address =
                    account
                        .parse::<Address>()
                        .map_err(|e| ComposerError::TransactionError {
                            message: format!("Invalid account address: {}", e),
                        })?;
                if !accounts.contains(&address) {
                    accounts.push(address);
                }
            }
            GroupResourceType::App(app_id) => {
                let apps = app_call.app_references.get_or_insert_with(Vec::new);
                if !apps.contains(app_id) {
                    apps.push(*app_id);
                }
            }
            GroupResourceType::Box(box_ref) => {
                let boxes = app_call.box_references.get_or_insert_with(Vec::new);
                if !boxes
                    .iter()
                    .any(|b| b.app_id == box_ref.app && b.name == box_ref.name)
                {
                    boxes.push(BoxReference {
                        app_id: box_ref.app,
                        name: box_ref.name.clone(),
                    });
                }
                if box_ref.app != 0 {
                    let apps = app_call.app_references.get_or_insert_with(Vec::new);
                    if !apps.contains(&box_ref.app) {
                        apps.push(box_ref.app);
                    }
                }
            }
            GroupResourceType::ExtraBoxRef => {
                let boxes = app_call.box_references.get_or_insert_with(Vec::new);
                boxes.push(BoxReference {
                    app_id: 0,
                    name: Vec::new(),
                });
            }
            GroupResourceType::AssetHolding(asset_holding) => {
                let assets = app_call.asset_references.get_or_insert_with(Vec::new);
                if !assets.contains(&asset_holding.asset) {
                    assets.push(asset_holding.asset);
                }

                let accounts = app_call.account_references.get_or_insert_with(Vec::new);
                let address = asset_holding.account.parse::<Address>().map_err(|e| {
                    ComposerError::TransactionError {
                        message: format!("Invalid account address: {}", e),
                    }
                })?;
                if !accounts.contains(&address) {
                    accounts.push(address);
                }
            }
            GroupResourceType::AppLocal(app_local) => {
                let apps = app_call.app_references.get_or_insert_with(Vec::new);
                if !apps.contains(&app_local.app) {
                    apps.push(app_local.app);
                }

                let accounts = app_call.account_references.get_or_insert_with(Vec::new);
                let address = app_local.account.parse::<Address>().map_err(|e| {
                    ComposerError::TransactionError {
                        message: format!("Invalid account address: {}", e),
                    }
                })?;
                if !accounts.contains(&address) {
                    accounts.push(address);
                }
            }
            GroupResourceType::Asset(asset_id) => {
                let assets = app_call.asset_references.get_or_insert_with(Vec::new);
                if !assets.contains(asset_id) {
                    assets.push(*asset_id);
                }
            }
        }
    }

    Ok(())
}
