//! Threshold ECDSA signing of EIP-1559 transactions

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope},
    eips::eip2718::Encodable2718,
};
use alloy_primitives::{Address, Signature, B256};
use candid::Principal;
use ic_exports::ic_cdk::api::{
    call::{call_with_payment, CallResult},
    management_canister::ecdsa::{
        ecdsa_public_key, EcdsaCurve, EcdsaKeyId, EcdsaPublicKeyArgument, SignWithEcdsaArgument,
        SignWithEcdsaResponse,
    },
};
use k256::ecdsa::VerifyingKey;

use crate::constants::SIGN_WITH_ECDSA_CYCLES;

use super::{
    common::extract_call_result,
    error::{ManagerError, ManagerResult},
};

/// The canister's EVM account, derived from its threshold ECDSA key.
#[derive(Clone, Debug, Default)]
pub struct EcdsaSigner {
    pub key_name: String,
    /// Cached once the public key has been fetched
    pub address: Option<Address>,
}

impl EcdsaSigner {
    pub fn new(key_name: String) -> Self {
        Self {
            key_name,
            address: None,
        }
    }

    fn key_id(&self) -> EcdsaKeyId {
        EcdsaKeyId {
            curve: EcdsaCurve::Secp256k1,
            name: self.key_name.clone(),
        }
    }

    /// Fetches the public key of the canister and derives its EVM address.
    pub async fn fetch_address(&self) -> ManagerResult<Address> {
        let argument = EcdsaPublicKeyArgument {
            canister_id: None,
            derivation_path: vec![],
            key_id: self.key_id(),
        };

        let response = extract_call_result(ecdsa_public_key(argument).await)?;
        public_key_to_address(&response.public_key)
    }

    /// Signs the transaction and returns the hex encoded EIP-2718 envelope.
    pub async fn sign_eip1559_transaction(&self, tx: TxEip1559) -> ManagerResult<String> {
        let address = self.address.ok_or_else(|| {
            ManagerError::Custom("The signer address has not been fetched yet.".to_string())
        })?;

        let hash = tx.signature_hash();
        let argument = SignWithEcdsaArgument {
            message_hash: hash.to_vec(),
            derivation_path: vec![],
            key_id: self.key_id(),
        };

        let call_result: CallResult<(SignWithEcdsaResponse,)> = call_with_payment(
            Principal::management_canister(),
            "sign_with_ecdsa",
            (argument,),
            SIGN_WITH_ECDSA_CYCLES,
        )
        .await;
        let response = extract_call_result(call_result)?;

        let signature = signature_with_parity(&response.signature, hash, address)?;
        Ok(encode_signed(tx, signature))
    }
}

/// Converts a SEC1 encoded secp256k1 public key into an EVM address
pub fn public_key_to_address(public_key: &[u8]) -> ManagerResult<Address> {
    let key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|err| ManagerError::DecodingError(format!("{:#?}", err)))?;
    Ok(Address::from_public_key(&key))
}

/// The management canister returns a bare 64 byte `r || s` signature.
/// The recovery id is the parity that recovers `signer`.
pub fn signature_with_parity(rs: &[u8], hash: B256, signer: Address) -> ManagerResult<Signature> {
    if rs.len() != 64 {
        return Err(ManagerError::DecodingError(format!(
            "Expected a 64 byte signature, got {} bytes.",
            rs.len()
        )));
    }

    for v in [27_u8, 28] {
        let mut bytes = [0_u8; 65];
        bytes[..64].copy_from_slice(rs);
        bytes[64] = v;

        let signature = Signature::try_from(&bytes[..])
            .map_err(|err| ManagerError::DecodingError(err.to_string()))?;
        if signature.recover_address_from_prehash(&hash).ok() == Some(signer) {
            return Ok(signature);
        }
    }

    Err(ManagerError::DecodingError(
        "The signature does not recover to the canister address.".to_string(),
    ))
}

fn encode_signed(tx: TxEip1559, signature: Signature) -> String {
    let signed: TxEnvelope = tx.into_signed(signature).into();
    format!("0x{}", hex::encode(signed.encoded_2718()))
}
