// offchain/crosschain_bet/src/ledger.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::Message,
    pubkey::Pubkey,
    transaction::Transaction,
};

use crate::error::{BetError, BetResult};
use crate::types::SourceChainSubmission;

/// Read-only view of the source chain.
#[async_trait]
pub trait SourceLedger: Send + Sync {
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> BetResult<u64>;
    async fn latest_blockhash(&self) -> BetResult<Hash>;
    async fn fee_for_message(&self, message: &Message) -> BetResult<u64>;
}

pub struct RpcLedger {
    rpc: RpcClient,
}

impl RpcLedger {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
        }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl SourceLedger for RpcLedger {
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> BetResult<u64> {
        Ok(self.rpc.get_minimum_balance_for_rent_exemption(data_len).await?)
    }

    async fn latest_blockhash(&self) -> BetResult<Hash> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    async fn fee_for_message(&self, message: &Message) -> BetResult<u64> {
        Ok(self.rpc.get_fee_for_message(message).await?)
    }
}

/// Instruction carrying the bridge's order data, addressed to `recipient`.
pub fn bridge_instruction(program_id: Pubkey, recipient: Pubkey, data: &[u8]) -> Instruction {
    Instruction {
        program_id,
        accounts: vec![AccountMeta::new(recipient, false)],
        data: data.to_vec(),
    }
}

pub fn unsigned_message(
    fee_payer: &Pubkey,
    instructions: &[Instruction],
    recent_blockhash: &Hash,
) -> Message {
    Message::new_with_blockhash(instructions, Some(fee_payer), recent_blockhash)
}

/// Unsigned transaction with empty signature slots for the wallet to fill.
pub fn unsigned_transaction(submission: &SourceChainSubmission) -> Transaction {
    Transaction::new_unsigned(unsigned_message(
        &submission.fee_payer,
        &submission.instructions,
        &submission.recent_blockhash,
    ))
}

/// base64 of the bincode wire format, as wallets expect it.
pub fn encode_transaction(tx: &Transaction) -> BetResult<String> {
    let bytes = bincode::serialize(tx)
        .map_err(|e| BetError::invalid(format!("transaction could not be serialized: {e}")))?;
    Ok(BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signature;

    #[test]
    fn unsigned_transaction_round_trips_through_wire_format() {
        let payer = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let blockhash = Hash::new_unique();

        let submission = SourceChainSubmission {
            fee_payer: payer,
            recent_blockhash: blockhash,
            instructions: vec![bridge_instruction(program, recipient, &[9, 8, 7])],
            estimated_fee_lamports: Some(5000),
        };
        let encoded = encode_transaction(&unsigned_transaction(&submission)).unwrap();

        let decoded: Transaction = bincode::deserialize(&BASE64.decode(encoded).unwrap()).unwrap();
        let msg = &decoded.message;
        assert_eq!(msg.account_keys[0], payer);
        assert_eq!(msg.recent_blockhash, blockhash);
        assert_eq!(decoded.signatures, vec![Signature::default()]);
        assert_eq!(msg.instructions.len(), 1);
        assert_eq!(msg.instructions[0].data, vec![9, 8, 7]);
        assert_eq!(msg.account_keys[msg.instructions[0].program_id_index as usize], program);
        assert!(msg.account_keys.contains(&recipient));
    }
}
