//! Stratagems tool node
//!
//! Reads its values from fields of the input item and merges the
//! operation result into the item: `{...item, ...result}`. Membership
//! checks use a single output and drop items rejected by the filter mode.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use eightkit_client::ApiClient;
use eightkit_core::{json_type_name, ClientConfig, Error, FieldSelector, Result};

use super::fields;
use crate::context::NodeContext;
use crate::handlers::lookup::{self, FullLookupRequest, SearchType, TrackedValue};
use crate::handlers::{app, check, values};
use crate::node::{ErrorPolicy, InputItem, ItemOutcome, Node};
use crate::params::Parameters;
use crate::routing::{CheckMode, CheckRouting, FilterMode};

const DEFAULT_SEARCH_LIMIT: u64 = 50;

/// Operations of the Stratagems node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StratagemsOperation {
    CheckSetValues,
    AddToSet,
    AddToLookup,
    SearchLookup,
    FullLookup,
    GetAppInfo,
    HealthCheck,
}

impl StratagemsOperation {
    pub const ALL: [StratagemsOperation; 7] = [
        StratagemsOperation::CheckSetValues,
        StratagemsOperation::AddToSet,
        StratagemsOperation::AddToLookup,
        StratagemsOperation::SearchLookup,
        StratagemsOperation::FullLookup,
        StratagemsOperation::GetAppInfo,
        StratagemsOperation::HealthCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StratagemsOperation::CheckSetValues => "checkSetValues",
            StratagemsOperation::AddToSet => "addToSet",
            StratagemsOperation::AddToLookup => "addToLookup",
            StratagemsOperation::SearchLookup => "searchLookup",
            StratagemsOperation::FullLookup => "fullLookup",
            StratagemsOperation::GetAppInfo => "getAppInfo",
            StratagemsOperation::HealthCheck => "healthCheck",
        }
    }
}

impl FromStr for StratagemsOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for StratagemsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `advancedSettings.advanced`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvancedSettings {
    pub retry_on_failure: u32,
    pub retry_delay_ms: u64,
    pub timeout_ms: u64,
    pub continue_on_error: bool,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        let config = ClientConfig::default();
        Self {
            retry_on_failure: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
            timeout_ms: config.timeout_ms,
            continue_on_error: false,
        }
    }
}

impl AdvancedSettings {
    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        let advanced = params.collection("advancedSettings")?.collection("advanced")?;
        let defaults = Self::default();
        let retries = advanced.u64_or("retryOnFailure", u64::from(defaults.retry_on_failure))?;

        Ok(Self {
            retry_on_failure: u32::try_from(retries)
                .map_err(|_| Error::invalid_parameter("retryOnFailure", "is too large"))?,
            retry_delay_ms: advanced.u64_or("retryDelay", defaults.retry_delay_ms)?,
            timeout_ms: advanced
                .optional_u64("timeout")?
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.timeout_ms),
            continue_on_error: advanced.bool_or("continueOnError", defaults.continue_on_error)?,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_max_retries(self.retry_on_failure)
            .with_retry_delay_ms(self.retry_delay_ms)
            .with_timeout_ms(self.timeout_ms)
    }
}

/// `autoCreateOptions.autoCreate`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AutoCreate {
    set: bool,
    lookup: bool,
}

impl AutoCreate {
    fn from_parameters(params: &Parameters) -> Result<Self> {
        let auto_create = params.collection("autoCreateOptions")?.collection("autoCreate")?;
        Ok(Self {
            set: auto_create.bool_or("createSetIfMissing", false)?,
            lookup: auto_create.bool_or("createLookupIfMissing", false)?,
        })
    }
}

/// The Stratagems tool node
#[derive(Debug, Default, Clone)]
pub struct StratagemsNode;

impl StratagemsNode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Node for StratagemsNode {
    fn name(&self) -> &str {
        "stratagemsTool"
    }

    fn output_names(&self, _parameters: &Parameters) -> Vec<String> {
        vec!["main".to_string()]
    }

    fn error_policy(&self, parameters: &Parameters) -> Result<ErrorPolicy> {
        Ok(if AdvancedSettings::from_parameters(parameters)?.continue_on_error {
            ErrorPolicy::ContinueWithErrorItem
        } else {
            ErrorPolicy::Abort
        })
    }

    async fn execute_item(&self, ctx: &NodeContext, index: usize, item: &InputItem) -> Result<ItemOutcome> {
        let params = &item.parameters;
        let operation: StratagemsOperation = params.string("operation")?.parse()?;
        let settings = AdvancedSettings::from_parameters(params)?;
        let client = ctx.client_with(settings.client_config());
        let auto_create = AutoCreate::from_parameters(params)?;
        debug!(
            operation = %operation,
            item_index = index,
            max_retries = settings.retry_on_failure,
            "Running Stratagems operation"
        );

        let mut result = match operation {
            StratagemsOperation::CheckSetValues => match check_set_values(&client, item, auto_create).await? {
                Some(result) => result,
                None => return Ok(ItemOutcome::Skip),
            },
            StratagemsOperation::AddToSet => add_to_set(&client, item, auto_create).await?,
            StratagemsOperation::AddToLookup => add_to_lookup(&client, item, auto_create).await?,
            StratagemsOperation::SearchLookup => search_lookup(&client, item, auto_create).await?,
            StratagemsOperation::FullLookup => full_lookup(&client, item, auto_create).await?,
            StratagemsOperation::GetAppInfo => fields([("appInfo", app::info(&client).await?)]),
            StratagemsOperation::HealthCheck => fields([("health", app::health(&client).await?)]),
        };

        result.insert("operation".to_string(), json!(operation.as_str()));
        Ok(ItemOutcome::main(item.merged(result)))
    }
}

/// Input field named by parameter `param`, as a string.
///
/// Numbers and booleans are taken in their JSON spelling.
fn field_value(item: &InputItem, param: &str) -> Result<String> {
    let field = item.parameters.string(param)?;
    let missing = || Error::validation(format!("Value field \"{}\" is required and cannot be empty", field));

    match item.field(&field) {
        Some(Value::String(s)) if s.is_empty() => Err(missing()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(Error::validation(format!(
            "Value field \"{}\" must be a string, got {}",
            field,
            json_type_name(other)
        ))),
        None => Err(missing()),
    }
}

/// Raw input field named by `valueField`; missing or empty is an error.
fn raw_field<'a>(item: &'a InputItem, param: &str) -> Result<&'a Value> {
    let field = item.parameters.string(param)?;
    let value = match item.field(&field) {
        Some(Value::String(s)) if s.is_empty() => None,
        other => other,
    };
    value.ok_or_else(|| Error::validation(format!("Value field \"{}\" is required and cannot be empty", field)))
}

/// `metadataFields.metadata.{includeTimestamp, additionalFields}`
fn metadata(item: &InputItem) -> Result<Option<Map<String, Value>>> {
    let settings = item.parameters.collection("metadataFields")?.collection("metadata")?;
    let include_timestamp = settings.bool_or("includeTimestamp", true)?;
    let selector = FieldSelector::parse(&settings.string_or("additionalFields", "")?);
    Ok(selector.build_metadata(&item.json, include_timestamp))
}

fn mode(params: &Parameters) -> Result<CheckMode> {
    CheckMode::parse(&params.string_or("mode", "single")?)
}

async fn check_set_values(
    client: &ApiClient,
    item: &InputItem,
    auto_create: AutoCreate,
) -> Result<Option<Map<String, Value>>> {
    let params = &item.parameters;
    let set_name = params.string("setName")?;
    let mode = mode(params)?;
    let output_field = params.string_or("outputField", "exists")?;
    let filter = FilterMode::parse(&params.string_or("filterMode", "all")?)?;
    let routing = CheckRouting::SingleChannelWithFilter(filter);
    let raw = raw_field(item, "valueField")?;

    let result = match mode {
        CheckMode::Single => {
            let value = check::single_value(raw)?;
            let outcome = check::check_value(client, &set_name, &value, auto_create.set).await?;
            if routing.route(outcome.exists).is_none() {
                debug!(set = %set_name, value = %value, filter = %filter, "Check filtered out");
                return Ok(None);
            }

            let mut result = Map::new();
            result.insert(output_field, json!(outcome.exists));
            result.extend(fields([
                ("checkedValue", json!(outcome.value)),
                ("mode", json!(mode.as_str())),
                ("filterMode", json!(filter.as_str())),
                ("setValue", outcome.set_value.unwrap_or(Value::Null)),
            ]));
            if outcome.set_created {
                result.insert("note".to_string(), json!("Set created automatically"));
            }
            result
        }
        CheckMode::Bulk => {
            let values = check::bulk_values(raw)?;
            let bulk = check::check_values(client, &set_name, &values, auto_create.set).await?;
            let kept = match routing.split(&bulk.checks).into_iter().next() {
                Some((_, kept)) => kept,
                None => {
                    debug!(set = %set_name, filter = %filter, "All checks filtered out");
                    return Ok(None);
                }
            };

            let mut result = Map::new();
            result.insert(output_field, json!(kept.iter().map(|c| c.exists).collect::<Vec<_>>()));
            result.extend(fields([
                ("checkedValues", json!(kept.iter().map(|c| c.value.as_str()).collect::<Vec<_>>())),
                ("mode", json!(mode.as_str())),
                ("filterMode", json!(filter.as_str())),
                ("totalChecked", json!(bulk.checks.len())),
                ("found", json!(bulk.found)),
                ("notFound", json!(bulk.not_found)),
                ("errors", json!(bulk.errors)),
                ("checks", json!(kept)),
                ("allChecks", json!(bulk.checks)),
            ]));
            if bulk.set_created {
                result.insert("note".to_string(), json!("Set created automatically"));
            }
            result
        }
    };

    Ok(Some(result))
}

async fn add_to_set(client: &ApiClient, item: &InputItem, auto_create: AutoCreate) -> Result<Map<String, Value>> {
    let params = &item.parameters;
    let set_name = params.string("setName")?;
    let metadata = metadata(item)?;

    match mode(params)? {
        CheckMode::Single => {
            let value = field_value(item, "valueField")?;
            let added = values::add_to_set(client, &set_name, &value, metadata, auto_create.set).await?;
            Ok(fields([
                ("addedToSet", json!(true)),
                ("setValue", json!(value)),
                ("record", added.record),
                ("setCreated", json!(added.created)),
            ]))
        }
        CheckMode::Bulk => {
            let set_values = check::bulk_values(raw_field(item, "valueField")?)?;
            let added = values::add_all_to_set(client, &set_name, &set_values, metadata, auto_create.set).await?;
            Ok(fields([
                ("addedToSet", json!(true)),
                ("setValues", json!(set_values)),
                ("records", json!(added.records)),
                ("setCreated", json!(added.created)),
            ]))
        }
    }
}

async fn add_to_lookup(client: &ApiClient, item: &InputItem, auto_create: AutoCreate) -> Result<Map<String, Value>> {
    let params = &item.parameters;
    if mode(params)? == CheckMode::Bulk {
        return Err(Error::invalid_parameter("mode", "addToLookup supports single mode only"));
    }

    let lookup_name = params.string("lookupName")?;
    let left = field_value(item, "leftField")?;
    let right = field_value(item, "rightField")?;
    let added = values::add_to_lookup(client, &lookup_name, &left, &right, metadata(item)?, auto_create.lookup).await?;

    Ok(fields([
        ("mappingAdded", json!(true)),
        ("leftValue", json!(left)),
        ("rightValue", json!(right)),
        ("mapping", added.record),
        ("lookupCreated", json!(added.created)),
    ]))
}

async fn full_lookup(client: &ApiClient, item: &InputItem, auto_create: AutoCreate) -> Result<Map<String, Value>> {
    let params = &item.parameters;
    let lookup_name = params.string("lookupName")?;
    let set_name = params.string("setName")?;
    let left = field_value(item, "leftField")?;
    let right = field_value(item, "rightField")?;

    let tracked = TrackedValue::parse(
        &params.string_or("setValueField", "left")?,
        &params.string_or("customSetValueField", "")?,
    )?;
    let tracked_value = match &tracked {
        TrackedValue::Left => left.clone(),
        TrackedValue::Right => right.clone(),
        TrackedValue::Custom(_) => field_value(item, "customSetValueField")?,
    };

    let outcome = lookup::full_lookup(
        client,
        FullLookupRequest {
            lookup_name: &lookup_name,
            set_name: &set_name,
            left: &left,
            right: &right,
            tracked_value: &tracked_value,
            metadata: metadata(item)?,
            create_lookup_if_missing: auto_create.lookup,
            create_set_if_missing: auto_create.set,
        },
    )
    .await?;

    Ok(fields([
        ("mappingAdded", json!(true)),
        ("setTrackingAdded", json!(true)),
        ("trackedValue", json!(tracked_value)),
        ("mapping", outcome.mapping),
        ("setValue", outcome.set_value),
        ("lookupCreated", json!(outcome.lookup_created)),
        ("setCreated", json!(outcome.set_created)),
    ]))
}

async fn search_lookup(client: &ApiClient, item: &InputItem, auto_create: AutoCreate) -> Result<Map<String, Value>> {
    let params = &item.parameters;
    let lookup_name = params.string("lookupName")?;
    let search_type = SearchType::parse(&params.string_or("searchType", "both")?)?;
    let term = field_value(item, "searchField")?;
    let limit = params.u64_or("limit", DEFAULT_SEARCH_LIMIT)?;

    let outcome = lookup::search_lookup(client, &lookup_name, search_type, &term, limit, auto_create.lookup).await?;

    let mut result = fields([
        ("results", json!(outcome.results)),
        ("totalFound", json!(outcome.total_found)),
    ]);
    if outcome.lookup_created {
        result.insert("lookupCreated".to_string(), json!(true));
    }
    Ok(result)
}
