//! 8kit node
//!
//! Every operation of the 8kit API on one node. `checkSetValues` has two
//! outputs, "Existing Values" and "Non-Existing Values"; all other
//! operations emit on a single output.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use eightkit_client::ApiClient;
use eightkit_core::{Error, FieldSelector, Pagination, ResourceKind, Result, ValueCheck};

use super::{as_object, fields};
use crate::context::NodeContext;
use crate::handlers::{app, check, last_updated, lock, resources, values};
use crate::node::{InputItem, ItemOutcome, Node};
use crate::params::Parameters;
use crate::routing::{CheckMode, CheckRouting};

pub const EXISTING_OUTPUT: &str = "Existing Values";
pub const NON_EXISTING_OUTPUT: &str = "Non-Existing Values";

const DEFAULT_CHECK_DATA_FIELD: &str = "__checkData";

/// Operations of the 8kit node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EightKitOperation {
    GetAppInfo,
    GetAppHealth,
    CheckLock,
    AcquireLock,
    ReleaseLock,
    GetLastUpdated,
    CreateLastUpdated,
    CreateSet,
    ListSets,
    GetSetInfo,
    CheckSetValues,
    AddToSet,
    RemoveFromSet,
    GetSetValues,
    CreateLookup,
    ListLookups,
    AddToLookup,
    GetLookupValues,
    RemoveFromLookup,
}

impl EightKitOperation {
    pub const ALL: [EightKitOperation; 19] = [
        EightKitOperation::GetAppInfo,
        EightKitOperation::GetAppHealth,
        EightKitOperation::CheckLock,
        EightKitOperation::AcquireLock,
        EightKitOperation::ReleaseLock,
        EightKitOperation::GetLastUpdated,
        EightKitOperation::CreateLastUpdated,
        EightKitOperation::CreateSet,
        EightKitOperation::ListSets,
        EightKitOperation::GetSetInfo,
        EightKitOperation::CheckSetValues,
        EightKitOperation::AddToSet,
        EightKitOperation::RemoveFromSet,
        EightKitOperation::GetSetValues,
        EightKitOperation::CreateLookup,
        EightKitOperation::ListLookups,
        EightKitOperation::AddToLookup,
        EightKitOperation::GetLookupValues,
        EightKitOperation::RemoveFromLookup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EightKitOperation::GetAppInfo => "getAppInfo",
            EightKitOperation::GetAppHealth => "getAppHealth",
            EightKitOperation::CheckLock => "checkLock",
            EightKitOperation::AcquireLock => "acquireLock",
            EightKitOperation::ReleaseLock => "releaseLock",
            EightKitOperation::GetLastUpdated => "getLastUpdated",
            EightKitOperation::CreateLastUpdated => "createLastUpdated",
            EightKitOperation::CreateSet => "createSet",
            EightKitOperation::ListSets => "listSets",
            EightKitOperation::GetSetInfo => "getSetInfo",
            EightKitOperation::CheckSetValues => "checkSetValues",
            EightKitOperation::AddToSet => "addToSet",
            EightKitOperation::RemoveFromSet => "removeFromSet",
            EightKitOperation::GetSetValues => "getSetValues",
            EightKitOperation::CreateLookup => "createLookup",
            EightKitOperation::ListLookups => "listLookups",
            EightKitOperation::AddToLookup => "addToLookup",
            EightKitOperation::GetLookupValues => "getLookupValues",
            EightKitOperation::RemoveFromLookup => "removeFromLookup",
        }
    }
}

impl FromStr for EightKitOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for EightKitOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The 8kit node
#[derive(Debug, Default, Clone)]
pub struct EightKitNode;

impl EightKitNode {
    pub fn new() -> Self {
        Self
    }

    fn operation(parameters: &Parameters) -> Result<EightKitOperation> {
        parameters.string("operation")?.parse()
    }
}

#[async_trait]
impl Node for EightKitNode {
    fn name(&self) -> &str {
        "eightKit"
    }

    fn output_names(&self, parameters: &Parameters) -> Vec<String> {
        match Self::operation(parameters) {
            Ok(EightKitOperation::CheckSetValues) => {
                vec![EXISTING_OUTPUT.to_string(), NON_EXISTING_OUTPUT.to_string()]
            }
            _ => vec!["main".to_string()],
        }
    }

    async fn execute_item(&self, ctx: &NodeContext, index: usize, item: &InputItem) -> Result<ItemOutcome> {
        let params = &item.parameters;
        let operation = Self::operation(params)?;
        let client = ctx.client();
        debug!(operation = %operation, item_index = index, "Running 8kit operation");

        let data = match operation {
            EightKitOperation::CheckSetValues => return check_set_values(&client, item).await,
            EightKitOperation::GetAppInfo => app::info(&client).await?,
            EightKitOperation::GetAppHealth => app::health(&client).await?,
            EightKitOperation::CheckLock => lock::check(&client, &params.string("key")?).await?,
            EightKitOperation::AcquireLock => {
                let calling_fn = params.optional_string("callingFn")?;
                lock::acquire(
                    &client,
                    &params.string("key")?,
                    calling_fn.as_deref(),
                    params.optional_u64("timeout")?,
                )
                .await?
            }
            EightKitOperation::ReleaseLock => lock::release(&client, &params.string("key")?).await?,
            EightKitOperation::GetLastUpdated => last_updated::get(&client, &params.string("key")?).await?,
            EightKitOperation::CreateLastUpdated => {
                let description = params.optional_string("description")?;
                let date = params.optional_string("date")?;
                last_updated::create(
                    &client,
                    &params.string("key")?,
                    description.as_deref(),
                    date.as_deref(),
                )
                .await?
            }
            EightKitOperation::CreateSet => create(&client, ResourceKind::Set, params).await?,
            EightKitOperation::CreateLookup => create(&client, ResourceKind::Lookup, params).await?,
            EightKitOperation::ListSets => resources::list(&client, ResourceKind::Set, pagination(params)?).await?,
            EightKitOperation::ListLookups => {
                resources::list(&client, ResourceKind::Lookup, pagination(params)?).await?
            }
            EightKitOperation::GetSetInfo => {
                resources::info(&client, ResourceKind::Set, &params.string("name")?).await?
            }
            EightKitOperation::GetSetValues => {
                resources::values(&client, ResourceKind::Set, &params.string("name")?, pagination(params)?).await?
            }
            EightKitOperation::GetLookupValues => {
                resources::values(&client, ResourceKind::Lookup, &params.string("name")?, pagination(params)?)
                    .await?
            }
            EightKitOperation::AddToSet => {
                let metadata = metadata(params, item)?;
                let added = values::add_to_set(
                    &client,
                    &params.string("name")?,
                    &params.string("value")?,
                    metadata,
                    params.bool_or("createSetIfMissing", false)?,
                )
                .await?;
                json!({ "success": true, "data": added.record })
            }
            EightKitOperation::AddToLookup => {
                let metadata = metadata(params, item)?;
                let added = values::add_to_lookup(
                    &client,
                    &params.string("name")?,
                    &params.string("leftValue")?,
                    &params.string("rightValue")?,
                    metadata,
                    params.bool_or("createLookupIfMissing", false)?,
                )
                .await?;
                json!({ "success": true, "data": added.record })
            }
            EightKitOperation::RemoveFromSet => {
                let value = params.string("value")?;
                let result = values::remove_from_set(&client, &params.string("name")?, &value).await?;
                removed(item, value, result)
            }
            EightKitOperation::RemoveFromLookup => {
                let value = params.string("value")?;
                let result = values::remove_from_lookup(&client, &params.string("name")?, &value).await?;
                removed(item, value, result)
            }
        };

        Ok(ItemOutcome::main(as_object(data)))
    }
}

async fn create(client: &ApiClient, kind: ResourceKind, params: &Parameters) -> Result<Value> {
    let description = params.optional_string("description")?;
    resources::create(client, kind, &params.string("name")?, description.as_deref()).await
}

/// `advancedSettings.pagination.pagination.{page, limit, offset}`
fn pagination(params: &Parameters) -> Result<Pagination> {
    let settings = params
        .collection("advancedSettings")?
        .collection("pagination")?
        .collection("pagination")?;
    let defaults = Pagination::default();

    Ok(Pagination {
        page: settings.optional_u64("page")?.filter(|p| *p > 0).unwrap_or(defaults.page),
        limit: settings.optional_u64("limit")?.filter(|l| *l > 0).unwrap_or(defaults.limit),
        offset: settings.u64_or("offset", defaults.offset)?,
    })
}

fn metadata(params: &Parameters, item: &InputItem) -> Result<Option<Map<String, Value>>> {
    let selector = FieldSelector::parse(&params.string_or("metadataFields", "")?);
    if selector.is_empty() {
        return Ok(None);
    }
    Ok(selector.build_metadata(&item.json, false))
}

fn removed(item: &InputItem, value: String, result: Value) -> Value {
    item.merged(fields([
        ("removed", Value::Bool(true)),
        ("value", Value::String(value)),
        ("result", result),
    ]))
}

/// Membership check routed to "Existing Values" (0) or "Non-Existing
/// Values" (1).
async fn check_set_values(client: &ApiClient, item: &InputItem) -> Result<ItemOutcome> {
    let params = &item.parameters;
    let set_name = params.string("name")?;
    let mode = CheckMode::parse(&params.string_or("mode", "single")?)?;
    let auto_create = params.bool_or("createSetIfMissing", false)?;
    let include_data = params.bool_or("getSetValueData", false)?;
    let data_field = params
        .optional_string("setValueDataFieldName")?
        .unwrap_or_else(|| DEFAULT_CHECK_DATA_FIELD.to_string());
    let raw_value = match params.get("value") {
        Some(Value::String(s)) if s.trim().is_empty() => None,
        None => None,
        Some(value) => Some(value.clone()),
    }
    .ok_or_else(|| Error::validation("Value is required and cannot be empty"))?;
    let routing = CheckRouting::DualChannelByExistence;

    match mode {
        CheckMode::Single => {
            let value = check::single_value(&raw_value)?;
            let result = check::check_value(client, &set_name, &value, auto_create).await?;

            let mut extra = Map::new();
            if include_data {
                extra.insert(data_field, result.set_value.clone().unwrap_or(Value::Null));
            }
            if result.set_created {
                extra.insert("note".to_string(), json!("Set created automatically"));
            }

            Ok(match routing.route(result.exists) {
                Some(output) => ItemOutcome::Emit {
                    output,
                    json: item.merged(extra),
                },
                None => ItemOutcome::Skip,
            })
        }
        CheckMode::Bulk => {
            let set_values = check::bulk_values(&raw_value)?;
            let mut result = check::check_values(client, &set_name, &set_values, auto_create).await?;
            if !include_data {
                for entry in &mut result.checks {
                    entry.set_value = None;
                }
            }

            let routed = routing
                .split(&result.checks)
                .into_iter()
                .map(|(output, group)| (output, bulk_item(item, &group, result.set_created)))
                .collect();
            Ok(ItemOutcome::Routed(routed))
        }
    }
}

fn bulk_item(item: &InputItem, group: &[&ValueCheck], set_created: bool) -> Value {
    let checked: Vec<&str> = group.iter().map(|c| c.value.as_str()).collect();
    let mut extra = fields([
        ("mode", json!(CheckMode::Bulk.as_str())),
        ("checkedValues", json!(checked)),
        ("checks", json!(group)),
    ]);
    if set_created {
        extra.insert("note".to_string(), json!("Set created automatically"));
    }
    item.merged(extra)
}
