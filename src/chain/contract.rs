/// TKN token contract: artifact loading and call-data codec
///
/// Raw transaction input is decoded against the contract ABI into a
/// [`DecodedCall`] (function name + named arguments), then narrowed into the
/// typed [`ContractCall`] the ledger classifies. Decoding never panics on
/// foreign or truncated input; failures come back as [`DecodeError`].

use alloy_dyn_abi::{DynSolValue, JsonAbiExt, FunctionExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes, Selector, U256};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::core::constants::functions;

/// Reasons call data could not be turned into a typed call
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Transaction carries no call data")]
    EmptyInput,

    #[error("Call data shorter than a function selector ({0} bytes)")]
    Truncated(usize),

    #[error("No function with selector {0} in contract ABI")]
    UnknownSelector(Selector),

    #[error("ABI decoding failed for {function}: {reason}")]
    Abi { function: String, reason: String },

    #[error("Argument '{argument}' missing from {function}")]
    MissingArgument { function: String, argument: String },

    #[error("Argument '{argument}' of {function} has unexpected type")]
    UnexpectedType { function: String, argument: String },
}

/// Failures loading the contract or encoding calls
#[derive(thiserror::Error, Debug)]
pub enum ContractError {
    #[error("Failed to read contract artifact {path}: {source}")]
    ArtifactIo { path: String, source: std::io::Error },

    #[error("Invalid contract artifact: {0}")]
    InvalidArtifact(String),

    #[error("No contract address configured and none deployed on network {0}")]
    MissingAddress(String),

    #[error("Contract has no function '{0}' taking {1} arguments")]
    UnknownFunction(String, usize),

    #[error("Failed to encode {function}: {reason}")]
    Encode { function: String, reason: String },

    #[error("Failed to decode {function} output: {reason}")]
    Output { function: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TruffleArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    abi: JsonAbi,
    #[serde(default)]
    networks: HashMap<String, ArtifactNetwork>,
}

#[derive(Debug, Deserialize)]
struct ArtifactNetwork {
    #[serde(default)]
    address: Option<Address>,
}

/// A function invocation decoded against the ABI
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    pub function: String,
    pub arguments: Vec<(String, DynSolValue)>,
}

impl DecodedCall {
    /// Named argument, `None` when the function has no parameter of that name
    pub fn argument(&self, name: &str) -> Option<&DynSolValue> {
        self.arguments
            .iter()
            .find(|(arg_name, _)| arg_name == name)
            .map(|(_, value)| value)
    }

    fn missing(&self, argument: &str) -> DecodeError {
        DecodeError::MissingArgument {
            function: self.function.clone(),
            argument: argument.to_string(),
        }
    }

    fn mistyped(&self, argument: &str) -> DecodeError {
        DecodeError::UnexpectedType {
            function: self.function.clone(),
            argument: argument.to_string(),
        }
    }

    fn optional_uint(&self, name: &str) -> Result<Option<U256>, DecodeError> {
        match self.argument(name) {
            None => Ok(None),
            Some(DynSolValue::Uint(value, _)) => Ok(Some(*value)),
            Some(_) => Err(self.mistyped(name)),
        }
    }

    fn optional_string(&self, name: &str) -> Result<Option<String>, DecodeError> {
        match self.argument(name) {
            None => Ok(None),
            Some(DynSolValue::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(self.mistyped(name)),
        }
    }

    fn uint(&self, name: &str) -> Result<U256, DecodeError> {
        self.optional_uint(name)?.ok_or_else(|| self.missing(name))
    }

    fn string(&self, name: &str) -> Result<String, DecodeError> {
        self.optional_string(name)?.ok_or_else(|| self.missing(name))
    }

    /// First address-typed argument, whatever it is named
    fn first_address(&self) -> Option<Address> {
        self.arguments.iter().find_map(|(_, value)| match value {
            DynSolValue::Address(address) => Some(*address),
            _ => None,
        })
    }

    /// Arguments rendered as a JSON object for detail views
    pub fn arguments_json(&self) -> Value {
        let map = self
            .arguments
            .iter()
            .map(|(name, value)| (name.clone(), value_to_json(value)))
            .collect::<serde_json::Map<String, Value>>();
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewardPurchaseArgs {
    pub customer: Option<Address>,
    /// Purchase total in US cents
    pub usd_spent_cents: U256,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BurnArgs {
    pub amount: U256,
    pub cause: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedeemArgs {
    pub customer: Option<Address>,
    pub amount: U256,
    pub partner_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonateArgs {
    pub amount: U256,
    pub cause: String,
}

/// Typed view of a contract call, one variant per known function
#[derive(Debug, Clone, PartialEq)]
pub enum ContractCall {
    RewardPurchase(RewardPurchaseArgs),
    Burn(BurnArgs),
    RedeemPartnerReward(RedeemArgs),
    Donate(DonateArgs),
    /// Any other function, or input that could not be decoded
    Unknown { function: Option<String> },
}

/// Accepted names for the purchase amount parameter
const USD_SPENT_ARGUMENTS: [&str; 2] = ["usdSpent", "usdSpentCents"];

impl TryFrom<&DecodedCall> for ContractCall {
    type Error = DecodeError;

    fn try_from(call: &DecodedCall) -> Result<Self, Self::Error> {
        let typed = match call.function.as_str() {
            functions::REWARD_PURCHASE => {
                let mut usd_spent_cents = None;
                for name in USD_SPENT_ARGUMENTS {
                    if let Some(value) = call.optional_uint(name)? {
                        usd_spent_cents = Some(value);
                        break;
                    }
                }
                ContractCall::RewardPurchase(RewardPurchaseArgs {
                    customer: call.first_address(),
                    usd_spent_cents: usd_spent_cents
                        .ok_or_else(|| call.missing(USD_SPENT_ARGUMENTS[0]))?,
                })
            }
            functions::BURN => ContractCall::Burn(BurnArgs {
                amount: call.uint("amount")?,
                cause: call.optional_string("cause")?,
                description: call.optional_string("description")?,
            }),
            functions::REDEEM_PARTNER_REWARD => ContractCall::RedeemPartnerReward(RedeemArgs {
                customer: call.first_address(),
                amount: call.uint("amount")?,
                partner_name: call.string("partnerName")?,
            }),
            functions::DONATE => ContractCall::Donate(DonateArgs {
                amount: call.uint("amount")?,
                cause: call.string("cause")?,
            }),
            other => ContractCall::Unknown {
                function: Some(other.to_string()),
            },
        };
        Ok(typed)
    }
}

/// Handle on the deployed TKN token contract
#[derive(Debug, Clone)]
pub struct TokenContract {
    name: String,
    address: Address,
    abi: JsonAbi,
    by_selector: HashMap<Selector, Function>,
}

impl TokenContract {
    pub fn new(name: impl Into<String>, address: Address, abi: JsonAbi) -> Self {
        let by_selector = abi
            .functions()
            .map(|function| (function.selector(), function.clone()))
            .collect();

        Self {
            name: name.into(),
            address,
            abi,
            by_selector,
        }
    }

    /// Load from a Truffle build artifact. An explicit address wins; otherwise
    /// the deployment recorded for `network_id` is used.
    pub fn load_artifact(
        path: &Path,
        address: Option<Address>,
        network_id: Option<&str>,
    ) -> Result<Self, ContractError> {
        let content = fs::read_to_string(path).map_err(|source| ContractError::ArtifactIo {
            path: path.display().to_string(),
            source,
        })?;
        let contract = Self::from_artifact_str(&content, address, network_id)?;
        info!(
            "📜 Loaded contract {} at {} from {}",
            contract.name,
            contract.address,
            path.display()
        );
        Ok(contract)
    }

    pub fn from_artifact_str(
        content: &str,
        address: Option<Address>,
        network_id: Option<&str>,
    ) -> Result<Self, ContractError> {
        let artifact: TruffleArtifact = serde_json::from_str(content)
            .map_err(|e| ContractError::InvalidArtifact(e.to_string()))?;

        let address = match address {
            Some(address) => address,
            None => {
                let network = network_id.unwrap_or_default();
                artifact
                    .networks
                    .get(network)
                    .and_then(|deployment| deployment.address)
                    .ok_or_else(|| ContractError::MissingAddress(network.to_string()))?
            }
        };

        let name = artifact.contract_name.unwrap_or_else(|| "Token".to_string());
        Ok(Self::new(name, address, artifact.abi))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Decode raw transaction input into a function name and named arguments
    pub fn decode_input(&self, input: &[u8]) -> Result<DecodedCall, DecodeError> {
        if input.is_empty() {
            return Err(DecodeError::EmptyInput);
        }
        if input.len() < 4 {
            return Err(DecodeError::Truncated(input.len()));
        }

        let selector = Selector::from_slice(&input[..4]);
        let function = self
            .by_selector
            .get(&selector)
            .ok_or(DecodeError::UnknownSelector(selector))?;

        let values = function
            .abi_decode_input(&input[4..], true)
            .map_err(|e| DecodeError::Abi {
                function: function.name.clone(),
                reason: e.to_string(),
            })?;

        let arguments = function
            .inputs
            .iter()
            .map(|param| param.name.clone())
            .zip(values)
            .collect();

        Ok(DecodedCall {
            function: function.name.clone(),
            arguments,
        })
    }

    /// Decode straight to a typed call, degrading any failure to `Unknown`
    pub fn decode_call(&self, input: &[u8]) -> ContractCall {
        let decoded = self
            .decode_input(input)
            .and_then(|call| ContractCall::try_from(&call));

        match decoded {
            Ok(call) => call,
            Err(e) => {
                debug!(error = %e, "Call data not decodable, classifying as unknown");
                ContractCall::Unknown { function: None }
            }
        }
    }

    fn function_for(&self, name: &str, arity: usize) -> Result<&Function, ContractError> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
            .ok_or_else(|| ContractError::UnknownFunction(name.to_string(), arity))
    }

    /// ABI-encode a call including its selector
    pub fn encode_call(&self, name: &str, arguments: &[DynSolValue]) -> Result<Bytes, ContractError> {
        let function = self.function_for(name, arguments.len())?;
        function
            .abi_encode_input(arguments)
            .map(Bytes::from)
            .map_err(|e| ContractError::Encode {
                function: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Decode the return data of a view call
    pub fn decode_output(&self, name: &str, arity: usize, data: &[u8]) -> Result<Vec<DynSolValue>, ContractError> {
        let function = self.function_for(name, arity)?;
        function
            .abi_decode_output(data, true)
            .map_err(|e| ContractError::Output {
                function: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Call data for `balanceOf(owner)`
    pub fn balance_of_call(&self, owner: Address) -> Result<Bytes, ContractError> {
        self.encode_call(functions::BALANCE_OF, &[DynSolValue::Address(owner)])
    }

    /// Raw fixed-point balance from `balanceOf` return data
    pub fn decode_balance(&self, data: &[u8]) -> Result<U256, ContractError> {
        let values = self.decode_output(functions::BALANCE_OF, 1, data)?;
        match values.first() {
            Some(DynSolValue::Uint(balance, _)) => Ok(*balance),
            _ => Err(ContractError::Output {
                function: functions::BALANCE_OF.to_string(),
                reason: "expected a uint256".to_string(),
            }),
        }
    }
}

fn value_to_json(value: &DynSolValue) -> Value {
    #[allow(unreachable_patterns)]
    match value {
        DynSolValue::Bool(b) => json!(b),
        DynSolValue::Int(i, _) => json!(i.to_string()),
        DynSolValue::Uint(u, _) => json!(u.to_string()),
        DynSolValue::FixedBytes(word, size) => {
            json!(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Address(address) => json!(address.to_string()),
        DynSolValue::Function(function) => json!(format!("0x{}", hex::encode(function))),
        DynSolValue::Bytes(bytes) => json!(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => json!(s),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) | DynSolValue::Tuple(values) => {
            Value::Array(values.iter().map(value_to_json).collect())
        }
        _ => Value::Null,
    }
}
