//! Application call transactions create, update, delete and call Algorand
//! Smart Contracts.

use crate::transact::Address;
use crate::transact::encode::{is_empty_vec_opt, is_zero, is_zero_opt};
use crate::transact::header::TransactionHeader;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use serde_with::{Bytes, serde_as, skip_serializing_none};

/// What happens to the application (or the sender's local state) once the
/// approval program accepts the call.
#[derive(Serialize_repr, Deserialize_repr, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[repr(u8)]
pub enum OnApplicationComplete {
    /// Run the approval program, nothing more.
    #[default]
    NoOp = 0,

    /// Allocate local state for the app in the sender's account.
    OptIn = 1,

    /// Deallocate the sender's local state for the app.
    CloseOut = 2,

    /// Like CloseOut but cannot fail, so users can always reclaim their
    /// minimum balance.
    ClearState = 3,

    /// Replace the app's approval and clear state programs.
    UpdateApplication = 4,

    /// Remove the app from the creator's balance record.
    DeleteApplication = 5,
}

/// How many values of each kind an app may keep in state storage.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct StateSchema {
    /// Maximum number of integer values.
    #[serde(rename = "nui")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub num_uints: u64,

    /// Maximum number of byte slice values.
    #[serde(rename = "nbs")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub num_byte_slices: u64,
}

/// A box made available to an app call.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct BoxReference {
    /// The app owning the box; 0 means the called app itself.
    #[serde(rename = "i")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub app_id: u64,

    /// Name of the box.
    #[serde(rename = "n")]
    #[serde_as(as = "Bytes")]
    pub name: Vec<u8>,
}

/// The fields of an application call transaction.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct ApplicationCallTransactionFields {
    /// Common transaction header fields.
    #[serde(flatten)]
    pub header: TransactionHeader,

    /// ID of the app being called; 0 creates a new app.
    #[serde(rename = "apid")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub app_id: u64,

    /// Defines what additional actions occur with the transaction.
    #[serde(rename = "apan")]
    #[serde(skip_serializing_if = "is_default_on_complete")]
    #[serde(default)]
    pub on_complete: OnApplicationComplete,

    /// Logic run for every call except clear state calls. Required for
    /// creation and update.
    #[serde(rename = "apap")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    pub approval_program: Option<Vec<u8>>,

    /// Logic run for clear state calls; cannot reject the transaction.
    /// Required for creation and update.
    #[serde(rename = "apsu")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    pub clear_state_program: Option<Vec<u8>>,

    /// Maximum number of global state values. Creation only.
    #[serde(rename = "apgs")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub global_state_schema: Option<StateSchema>,

    /// Maximum number of local state values. Creation only.
    #[serde(rename = "apls")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub local_state_schema: Option<StateSchema>,

    /// Number of additional 2048-byte program pages. Creation only.
    #[serde(rename = "apep")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub extra_program_pages: Option<u64>,

    /// Arguments passed to the app's programs.
    #[serde(rename = "apaa")]
    #[serde_as(as = "Option<Vec<Bytes>>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    pub args: Option<Vec<Vec<u8>>>,

    /// Accounts besides the sender the app's programs may access.
    #[serde(rename = "apat")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    pub account_references: Option<Vec<Address>>,

    /// Apps besides the called one whose state may be accessed.
    #[serde(rename = "apfa")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    pub app_references: Option<Vec<u64>>,

    /// Assets whose parameters may be read.
    #[serde(rename = "apas")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    pub asset_references: Option<Vec<u64>>,

    /// Boxes made available to the program runtime.
    #[serde(rename = "apbx")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    pub box_references: Option<Vec<BoxReference>>,
}

fn is_default_on_complete(on_complete: &OnApplicationComplete) -> bool {
    matches!(on_complete, OnApplicationComplete::NoOp)
}

/// Serializes an app call for the wire, where box references carry a
/// positional index into the foreign apps array instead of an app id.
/// Index 0 denotes the called app itself.
pub fn application_call_serializer<S>(
    fields: &ApplicationCallTransactionFields,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let has_boxes = fields
        .box_references
        .as_ref()
        .is_some_and(|boxes| !boxes.is_empty());
    if !has_boxes {
        return fields.serialize(serializer);
    }

    let boxes = fields.box_references.as_deref().unwrap_or(&[]);
    let foreign_apps = fields.app_references.as_deref().unwrap_or(&[]);

    let mut translated = Vec::with_capacity(boxes.len());
    for box_ref in boxes {
        let index = match box_ref.app_id {
            0 => 0,
            id if id == fields.app_id => 0,
            id => foreign_apps
                .iter()
                .position(|&candidate| candidate == id)
                .map(|position| (position + 1) as u64)
                .ok_or_else(|| {
                    serde::ser::Error::custom(format!(
                        "Box reference with app id {} not found in app references.",
                        id
                    ))
                })?,
        };
        translated.push(BoxReference {
            app_id: index,
            name: box_ref.name.clone(),
        });
    }

    let mut wire = fields.clone();
    wire.box_references = Some(translated);
    wire.serialize(serializer)
}

/// Deserializes an app call from the wire, translating positional box
/// reference indexes back to app ids.
pub fn application_call_deserializer<'de, D>(
    deserializer: D,
) -> Result<ApplicationCallTransactionFields, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut fields = ApplicationCallTransactionFields::deserialize(deserializer)?;

    let has_boxes = fields
        .box_references
        .as_ref()
        .is_some_and(|boxes| !boxes.is_empty());
    if !has_boxes {
        return Ok(fields);
    }

    let foreign_apps = fields.app_references.clone().unwrap_or_default();
    let boxes = fields.box_references.take().unwrap_or_default();

    let mut translated = Vec::with_capacity(boxes.len());
    for box_ref in boxes {
        let app_id = match box_ref.app_id {
            0 => 0,
            index => {
                let position = index as usize - 1;
                *foreign_apps.get(position).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "Cannot find app reference index {position}."
                    ))
                })?
            }
        };
        translated.push(BoxReference {
            app_id,
            name: box_ref.name,
        });
    }

    fields.box_references = Some(translated);
    Ok(fields)
}
