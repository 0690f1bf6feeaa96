//! Encoding of plan arguments into Solidity constructor calldata

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    primitives::Bytes,
};
use serde_json::Value;

use crate::{
    errors::DeployError,
    types::{ArgValue, Artifact},
};

/// Builds the creation code for the given artifact: its bytecode followed by
/// the ABI-encoded constructor arguments.
///
/// Each argument is coerced to the type the artifact's constructor declares
/// at its position.
pub fn encode_deploy_code(artifact: &Artifact, args: &[ArgValue]) -> Result<Bytes, DeployError> {
    let mut code = artifact.bytecode.to_vec();

    let Some(constructor) = artifact.abi.constructor() else {
        if !args.is_empty() {
            return Err(DeployError::ArgumentEncoding(format!(
                "{} has no constructor but was given {} argument(s)",
                artifact.name,
                args.len()
            )));
        }
        return Ok(code.into());
    };

    if constructor.inputs.len() != args.len() {
        return Err(DeployError::ArgumentEncoding(format!(
            "{} expects {} constructor argument(s), got {}",
            artifact.name,
            constructor.inputs.len(),
            args.len()
        )));
    }

    let values = constructor
        .inputs
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (param, arg))| {
            let ty = param
                .resolve()
                .map_err(|e| DeployError::ArtifactParsing(e.to_string()))?;
            coerce(&ty, arg).map_err(|e| {
                DeployError::ArgumentEncoding(format!(
                    "{} argument {} (`{}`): {}",
                    artifact.name, i, param.name, e
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let encoded = constructor
        .abi_encode_input(&values)
        .map_err(|e| DeployError::ArgumentEncoding(e.to_string()))?;
    code.extend_from_slice(&encoded);

    Ok(code.into())
}

/// Coerces a resolved argument into a value of the given Solidity type
fn coerce(ty: &DynSolType, arg: &ArgValue) -> Result<DynSolValue, String> {
    match (ty, arg) {
        (DynSolType::Address, ArgValue::Address(addr)) => Ok(DynSolValue::Address(*addr)),
        (_, ArgValue::Address(_)) => Err(format!("cannot pass a contract address as `{}`", ty)),
        (_, ArgValue::List(items)) => coerce_list(ty, items),
        (_, ArgValue::Literal(value)) => coerce_literal(ty, value),
    }
}

/// Coerces a list into an array, fixed array, or tuple
fn coerce_list(ty: &DynSolType, items: &[ArgValue]) -> Result<DynSolValue, String> {
    match ty {
        DynSolType::Array(inner) => items
            .iter()
            .map(|item| coerce(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        DynSolType::FixedArray(inner, len) => {
            if items.len() != *len {
                return Err(format!("expected {} element(s), got {}", len, items.len()));
            }
            items
                .iter()
                .map(|item| coerce(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        DynSolType::Tuple(types) => {
            if items.len() != types.len() {
                return Err(format!(
                    "expected {} tuple field(s), got {}",
                    types.len(),
                    items.len()
                ));
            }
            types
                .iter()
                .zip(items)
                .map(|(ty, item)| coerce(ty, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        _ => Err(format!("cannot pass a list as `{}`", ty)),
    }
}

/// Coerces a JSON literal into a value of the given Solidity type
fn coerce_literal(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match value {
        // Strings are taken verbatim, other types parse them
        Value::String(s) if *ty == DynSolType::String => Ok(DynSolValue::String(s.clone())),
        Value::String(s) => ty.coerce_str(s).map_err(|e| e.to_string()),
        Value::Number(n) if n.is_f64() => Err(format!(
            "numeric literal {} is not an integer; write large values as decimal strings",
            n
        )),
        Value::Number(n) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        Value::Bool(b) if *ty == DynSolType::Bool => Ok(DynSolValue::Bool(*b)),
        Value::Array(items) => {
            let items: Vec<_> = items.iter().cloned().map(ArgValue::Literal).collect();
            coerce_list(ty, &items)
        }
        _ => Err(format!("cannot pass `{}` as `{}`", value, ty)),
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        json_abi::JsonAbi,
        primitives::{address, Address, U256},
    };
    use serde_json::json;

    use super::*;

    /// Bytecode stub prepended to every encoding
    const BYTECODE: [u8; 4] = [0x60, 0x80, 0x60, 0x40];

    /// Builds an artifact whose constructor takes the given inputs
    fn artifact(inputs: Value) -> Artifact {
        let abi: JsonAbi = serde_json::from_value(json!([{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": inputs,
        }]))
        .unwrap();

        Artifact {
            name: "Test".to_string(),
            abi,
            bytecode: Bytes::from(BYTECODE.to_vec()),
        }
    }

    /// Strips the bytecode stub, returning the encoded arguments
    fn encoded_args(code: &Bytes) -> &[u8] {
        assert_eq!(&code[..BYTECODE.len()], &BYTECODE);
        &code[BYTECODE.len()..]
    }

    #[test]
    fn test_encode_staking_constructor() {
        let artifact = artifact(json!([
            { "name": "stakingToken", "type": "address" },
            { "name": "rewardToken", "type": "address" },
            { "name": "pools", "type": "address[]" },
        ]));
        let args = vec![
            ArgValue::Literal(json!("0x73A597834A0637BbB2bf033dd60B70b42f53De9B")),
            ArgValue::Literal(json!("0xFFc48E37296e2b6E2e7513729901D19AC9aD45cC")),
            ArgValue::List(vec![]),
        ];

        let code = encode_deploy_code(&artifact, &args).unwrap();

        let expected = DynSolValue::Tuple(vec![
            DynSolValue::Address(address!("73A597834A0637BbB2bf033dd60B70b42f53De9B")),
            DynSolValue::Address(address!("FFc48E37296e2b6E2e7513729901D19AC9aD45cC")),
            DynSolValue::Array(vec![]),
        ])
        .abi_encode_params();
        assert_eq!(encoded_args(&code), expected.as_slice());
    }

    #[test]
    fn test_encode_reference_and_numbers() {
        let artifact = artifact(json!([
            { "name": "properties", "type": "address" },
            { "name": "decimals", "type": "uint8" },
            { "name": "ratio", "type": "uint256" },
        ]));
        let properties = Address::with_last_byte(7);
        let args = vec![
            ArgValue::Address(properties),
            ArgValue::Literal(json!(18)),
            ArgValue::Literal(json!("1")),
        ];

        let code = encode_deploy_code(&artifact, &args).unwrap();

        let expected = DynSolValue::Tuple(vec![
            DynSolValue::Address(properties),
            DynSolValue::Uint(U256::from(18), 8),
            DynSolValue::Uint(U256::from(1), 256),
        ])
        .abi_encode_params();
        assert_eq!(encoded_args(&code), expected.as_slice());
    }

    #[test]
    fn test_encode_uint_beyond_u64() {
        let artifact = artifact(json!([{ "name": "supply", "type": "uint256" }]));
        let args = vec![ArgValue::Literal(json!("1000000000000000000001"))];

        let code = encode_deploy_code(&artifact, &args).unwrap();

        let supply: U256 = "1000000000000000000001".parse().unwrap();
        let expected = DynSolValue::Tuple(vec![DynSolValue::Uint(supply, 256)]).abi_encode_params();
        assert_eq!(encoded_args(&code), expected.as_slice());

        let err = encode_deploy_code(&artifact, &[ArgValue::Literal(json!(1e21))]).unwrap_err();
        assert!(matches!(err, DeployError::ArgumentEncoding(_)));
    }

    #[test]
    fn test_encode_strings_verbatim() {
        let artifact = artifact(json!([
            { "name": "name", "type": "string" },
            { "name": "symbol", "type": "string" },
            { "name": "owners", "type": "address[]" },
        ]));
        let args = vec![
            ArgValue::Literal(json!("Delnorte \"Properties\", Ltd")),
            ArgValue::Literal(json!("DTV")),
            ArgValue::List(vec![ArgValue::Address(Address::with_last_byte(1))]),
        ];

        let code = encode_deploy_code(&artifact, &args).unwrap();

        let expected = DynSolValue::Tuple(vec![
            DynSolValue::String("Delnorte \"Properties\", Ltd".to_string()),
            DynSolValue::String("DTV".to_string()),
            DynSolValue::Array(vec![DynSolValue::Address(Address::with_last_byte(1))]),
        ])
        .abi_encode_params();
        assert_eq!(encoded_args(&code), expected.as_slice());
    }

    #[test]
    fn test_no_constructor() {
        let artifact = Artifact {
            name: "dUSDT".to_string(),
            abi: JsonAbi::default(),
            bytecode: Bytes::from(BYTECODE.to_vec()),
        };

        let code = encode_deploy_code(&artifact, &[]).unwrap();
        assert_eq!(&code[..], &BYTECODE);

        let err = encode_deploy_code(&artifact, &[ArgValue::Literal(json!(1))]).unwrap_err();
        assert!(matches!(err, DeployError::ArgumentEncoding(_)));
    }

    #[test]
    fn test_arity_mismatch() {
        let artifact = artifact(json!([{ "name": "owner", "type": "address" }]));
        let err = encode_deploy_code(&artifact, &[]).unwrap_err();
        assert!(matches!(err, DeployError::ArgumentEncoding(_)));
    }

    #[test]
    fn test_type_mismatch() {
        let artifact = artifact(json!([{ "name": "decimals", "type": "uint8" }]));

        let err =
            encode_deploy_code(&artifact, &[ArgValue::Address(Address::ZERO)]).unwrap_err();
        assert!(matches!(err, DeployError::ArgumentEncoding(_)));

        let err = encode_deploy_code(&artifact, &[ArgValue::List(vec![])]).unwrap_err();
        assert!(matches!(err, DeployError::ArgumentEncoding(_)));

        let err = encode_deploy_code(&artifact, &[ArgValue::Literal(json!(null))]).unwrap_err();
        assert!(matches!(err, DeployError::ArgumentEncoding(_)));
    }

    #[test]
    fn test_fixed_array_length_checked() {
        let artifact = artifact(json!([{ "name": "pair", "type": "uint256[2]" }]));

        encode_deploy_code(&artifact, &[ArgValue::Literal(json!([1, 2]))]).unwrap();
        let err = encode_deploy_code(&artifact, &[ArgValue::Literal(json!([1]))]).unwrap_err();
        assert!(matches!(err, DeployError::ArgumentEncoding(_)));
    }
}
